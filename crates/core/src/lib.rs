//! Core upload logic for ossup.
//!
//! This crate contains the storage adapter and the upload workflow with ZERO
//! web dependencies.
//!
//! # Modules
//!
//! - `storage` - Provider binding for S3-compatible multipart uploads
//! - `upload` - Key derivation, part normalization and URL shaping

pub mod storage;
pub mod upload;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;
