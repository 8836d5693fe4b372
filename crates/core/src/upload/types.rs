//! Upload types and data structures.

/// One uploaded chunk as reported back by the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartDescriptor {
    /// 1-based part number.
    pub part_number: u32,
    /// ETag returned by the provider for the part, possibly quoted.
    pub etag: String,
}

impl PartDescriptor {
    /// Create a part descriptor.
    #[must_use]
    pub fn new(part_number: u32, etag: impl Into<String>) -> Self {
        Self {
            part_number,
            etag: etag.into(),
        }
    }
}

/// Input for finalizing an upload.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// Provider upload id from initiation.
    pub upload_id: String,
    /// Object key from initiation.
    pub object_key: String,
    /// Uploaded parts in any order.
    pub parts: Vec<PartDescriptor>,
}

/// Result of starting an upload.
#[derive(Debug, Clone)]
pub struct InitiatedUpload {
    /// Provider upload id.
    pub upload_id: String,
    /// Bucket the object will land in.
    pub bucket_name: String,
    /// Derived object key the client must echo back.
    pub object_key: String,
}

/// A signed URL for one part.
#[derive(Debug, Clone)]
pub struct PartUploadUrl {
    /// Provider upload id.
    pub upload_id: String,
    /// Bucket name.
    pub bucket_name: String,
    /// Object key.
    pub object_key: String,
    /// Part number the URL is scoped to.
    pub part_number: u32,
    /// Presigned PUT URL.
    pub upload_url: String,
    /// Unix timestamp (seconds) after which the URL is rejected.
    pub expiration_time: i64,
}

/// Result of finalizing an upload.
#[derive(Debug, Clone)]
pub struct CompletedUpload {
    /// Location reported by the provider.
    pub location: String,
    /// Bucket name.
    pub bucket: String,
    /// Object key.
    pub key: String,
    /// Object ETag without quotes.
    pub etag: String,
    /// Direct object URL; only readable if the bucket allows it.
    pub private_url: String,
    /// Short-lived presigned download URL.
    pub public_url: String,
    /// Unix timestamp (seconds) at which `public_url` expires.
    pub expiration: i64,
}
