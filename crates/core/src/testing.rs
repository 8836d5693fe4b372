//! In-memory [`MultipartStore`] for tests.
//!
//! Records every call and answers with deterministic values. Failures can be
//! injected per operation.

#![allow(clippy::missing_panics_doc)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::storage::{
    CommittedObject, InitiatedMultipart, MultipartStore, StorageError, StoredPart,
};

/// Store operation, used to target injected failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// `initiate`
    Initiate,
    /// `presign_part`
    PresignPart,
    /// `complete`
    Complete,
    /// `presign_download`
    PresignDownload,
}

/// A recorded store call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    /// `initiate` was called.
    Initiate {
        /// Object key.
        key: String,
    },
    /// `presign_part` was called.
    PresignPart {
        /// Object key.
        key: String,
        /// Upload id.
        upload_id: String,
        /// Part number.
        part_number: u32,
        /// Requested lifetime.
        ttl: Duration,
    },
    /// `complete` was called.
    Complete {
        /// Object key.
        key: String,
        /// Upload id.
        upload_id: String,
        /// Parts exactly as received.
        parts: Vec<StoredPart>,
    },
    /// `presign_download` was called.
    PresignDownload {
        /// Object key.
        key: String,
        /// Requested lifetime.
        ttl: Duration,
        /// Requested `Content-Disposition`.
        content_disposition: String,
    },
}

/// Recording store for service and route tests.
pub struct RecordingStore {
    bucket: String,
    calls: Mutex<Vec<StoreCall>>,
    failures: Mutex<HashMap<Operation, (u16, String, String)>>,
    next_upload: AtomicU64,
}

impl RecordingStore {
    /// Create a store for `bucket`.
    #[must_use]
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            calls: Mutex::new(Vec::new()),
            failures: Mutex::new(HashMap::new()),
            next_upload: AtomicU64::new(1),
        }
    }

    /// Make every call to `op` fail with a provider error.
    pub fn fail_on(&self, op: Operation, status: u16, code: &str, message: &str) {
        self.failures
            .lock()
            .unwrap()
            .insert(op, (status, code.to_string(), message.to_string()));
    }

    /// Calls recorded so far.
    #[must_use]
    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, op: Operation, call: StoreCall) -> Result<(), StorageError> {
        self.calls.lock().unwrap().push(call);
        match self.failures.lock().unwrap().get(&op) {
            Some((status, code, message)) => {
                Err(StorageError::provider(*status, code.clone(), message.clone()))
            }
            None => Ok(()),
        }
    }
}

#[async_trait]
impl MultipartStore for RecordingStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    fn object_url(&self, key: &str) -> String {
        format!("https://{}.store.test/{key}", self.bucket)
    }

    async fn initiate(&self, key: &str) -> Result<InitiatedMultipart, StorageError> {
        self.record(
            Operation::Initiate,
            StoreCall::Initiate {
                key: key.to_string(),
            },
        )?;
        let n = self.next_upload.fetch_add(1, Ordering::Relaxed);
        Ok(InitiatedMultipart {
            bucket: self.bucket.clone(),
            key: key.to_string(),
            upload_id: format!("upload-{n}"),
        })
    }

    async fn presign_part(
        &self,
        key: &str,
        upload_id: &str,
        part_number: u32,
        ttl: Duration,
    ) -> Result<String, StorageError> {
        self.record(
            Operation::PresignPart,
            StoreCall::PresignPart {
                key: key.to_string(),
                upload_id: upload_id.to_string(),
                part_number,
                ttl,
            },
        )?;
        Ok(format!(
            "{}?partNumber={part_number}&uploadId={upload_id}&X-Amz-Expires={}&X-Amz-Signature=test",
            self.object_url(key),
            ttl.as_secs()
        ))
    }

    async fn complete(
        &self,
        key: &str,
        upload_id: &str,
        parts: Vec<StoredPart>,
    ) -> Result<CommittedObject, StorageError> {
        let etag = parts
            .iter()
            .map(|p| p.etag.as_str())
            .collect::<Vec<_>>()
            .join("-");
        self.record(
            Operation::Complete,
            StoreCall::Complete {
                key: key.to_string(),
                upload_id: upload_id.to_string(),
                parts,
            },
        )?;
        Ok(CommittedObject {
            location: self.object_url(key),
            bucket: self.bucket.clone(),
            key: key.to_string(),
            etag: format!("\"{etag}\""),
        })
    }

    async fn presign_download(
        &self,
        key: &str,
        ttl: Duration,
        content_disposition: &str,
    ) -> Result<String, StorageError> {
        self.record(
            Operation::PresignDownload,
            StoreCall::PresignDownload {
                key: key.to_string(),
                ttl,
                content_disposition: content_disposition.to_string(),
            },
        )?;
        Ok(format!(
            "{}?X-Amz-Expires={}&X-Amz-Signature=test",
            self.object_url(key),
            ttl.as_secs()
        ))
    }
}
