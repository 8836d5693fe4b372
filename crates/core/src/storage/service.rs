//! Multipart store implementation on `rust-s3`.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use s3::Region;
use s3::bucket::Bucket;
use s3::creds::Credentials;
use s3::serde_types::Part;
use serde::Deserialize;

use super::config::StorageConfig;
use super::error::StorageError;

/// Content type every multipart upload is initiated with.
const MULTIPART_CONTENT_TYPE: &str = "application/octet-stream";

/// Response overrides baked into part URLs so the browser's direct PUT gets
/// permissive CORS headers and can read the part ETag back.
const PART_RESPONSE_OVERRIDES: [(&str, &str); 5] = [
    ("response-content-type", "application/json"),
    ("response-expires", "0"),
    ("response-cache-control", "no-cache"),
    ("response-access-control-allow-headers", "*"),
    (
        "response-access-control-expose-headers",
        "ETag,x-oss-request-id",
    ),
];

/// A multipart upload the provider has started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitiatedMultipart {
    /// Bucket the upload lives in.
    pub bucket: String,
    /// Object key the upload will produce.
    pub key: String,
    /// Provider-issued upload id.
    pub upload_id: String,
}

/// A part as handed to the provider's commit call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredPart {
    /// 1-based part number.
    pub part_number: u32,
    /// Part ETag without surrounding quotes.
    pub etag: String,
}

/// The object produced by a successful commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommittedObject {
    /// Location reported by the provider.
    pub location: String,
    /// Bucket name reported by the provider.
    pub bucket: String,
    /// Object key reported by the provider.
    pub key: String,
    /// ETag of the assembled object, as reported.
    pub etag: String,
}

/// Provider operations the upload workflow depends on.
///
/// `presign_*` methods sign locally and never touch the network; `initiate`
/// and `complete` each cost exactly one provider round trip.
#[async_trait]
pub trait MultipartStore: Send + Sync {
    /// Name of the bucket uploads land in.
    fn bucket(&self) -> &str;

    /// Direct, unsigned URL of an object.
    fn object_url(&self, key: &str) -> String;

    /// Start a multipart upload for `key`.
    async fn initiate(&self, key: &str) -> Result<InitiatedMultipart, StorageError>;

    /// Sign a PUT URL for one part of an in-progress upload.
    async fn presign_part(
        &self,
        key: &str,
        upload_id: &str,
        part_number: u32,
        ttl: Duration,
    ) -> Result<String, StorageError>;

    /// Commit an upload from its parts. `parts` must already be ordered.
    async fn complete(
        &self,
        key: &str,
        upload_id: &str,
        parts: Vec<StoredPart>,
    ) -> Result<CommittedObject, StorageError>;

    /// Sign a GET URL that answers with the given `Content-Disposition`.
    async fn presign_download(
        &self,
        key: &str,
        ttl: Duration,
        content_disposition: &str,
    ) -> Result<String, StorageError>;
}

/// [`MultipartStore`] backed by an S3-compatible bucket.
pub struct S3MultipartStore {
    bucket: Box<Bucket>,
    config: StorageConfig,
}

impl S3MultipartStore {
    /// Create a store from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if a required setting is empty or the SDK rejects it.
    pub fn from_config(config: StorageConfig) -> Result<Self, StorageError> {
        let bucket = Self::create_bucket(&config)?;
        Ok(Self { bucket, config })
    }

    /// Create the SDK bucket handle.
    fn create_bucket(config: &StorageConfig) -> Result<Box<Bucket>, StorageError> {
        let required = [
            ("endpoint", config.endpoint_host()),
            ("bucket", config.bucket.as_str()),
            ("access_key_id", config.access_key_id.as_str()),
            ("secret_access_key", config.secret_access_key.as_str()),
        ];
        if let Some((name, _)) = required.iter().find(|(_, value)| value.is_empty()) {
            return Err(StorageError::configuration(format!("{name} is required")));
        }

        let credentials = Credentials::new(
            Some(&config.access_key_id),
            Some(&config.secret_access_key),
            None,
            None,
            None,
        )
        .map_err(|e| StorageError::configuration(e.to_string()))?;

        let region = Region::Custom {
            region: config.region.clone(),
            endpoint: config.endpoint.clone(),
        };

        let bucket = Bucket::new(&config.bucket, region, credentials)
            .map_err(|e| StorageError::configuration(e.to_string()))?;

        Ok(if config.force_path_style {
            bucket.with_path_style()
        } else {
            bucket
        })
    }
}

#[async_trait]
impl MultipartStore for S3MultipartStore {
    fn bucket(&self) -> &str {
        &self.config.bucket
    }

    fn object_url(&self, key: &str) -> String {
        if self.config.force_path_style {
            format!(
                "{}/{}/{}",
                self.config.endpoint.trim_end_matches('/'),
                self.config.bucket,
                key
            )
        } else {
            format!(
                "https://{}.{}/{}",
                self.config.bucket,
                self.config.endpoint_host(),
                key
            )
        }
    }

    async fn initiate(&self, key: &str) -> Result<InitiatedMultipart, StorageError> {
        let response = self
            .bucket
            .initiate_multipart_upload(key, MULTIPART_CONTENT_TYPE)
            .await?;

        Ok(InitiatedMultipart {
            bucket: self.config.bucket.clone(),
            key: response.key,
            upload_id: response.upload_id,
        })
    }

    async fn presign_part(
        &self,
        key: &str,
        upload_id: &str,
        part_number: u32,
        ttl: Duration,
    ) -> Result<String, StorageError> {
        let url = self
            .bucket
            .presign_put(
                key,
                expiry_secs(ttl)?,
                None,
                Some(part_upload_queries(upload_id, part_number)),
            )
            .await?;
        Ok(url)
    }

    async fn complete(
        &self,
        key: &str,
        upload_id: &str,
        parts: Vec<StoredPart>,
    ) -> Result<CommittedObject, StorageError> {
        let parts = parts
            .into_iter()
            .map(|p| Part {
                part_number: p.part_number,
                etag: p.etag,
            })
            .collect();

        let response = self
            .bucket
            .complete_multipart_upload(key, upload_id, parts)
            .await?;

        let body = String::from_utf8_lossy(response.bytes());
        parse_complete_response(response.status_code(), &body)
    }

    async fn presign_download(
        &self,
        key: &str,
        ttl: Duration,
        content_disposition: &str,
    ) -> Result<String, StorageError> {
        let queries = HashMap::from([(
            "response-content-disposition".to_string(),
            content_disposition.to_string(),
        )]);

        let url = self
            .bucket
            .presign_get(key, expiry_secs(ttl)?, Some(queries))
            .await?;
        Ok(url)
    }
}

/// Query parameters signed into a part upload URL.
fn part_upload_queries(upload_id: &str, part_number: u32) -> HashMap<String, String> {
    let mut queries: HashMap<String, String> = PART_RESPONSE_OVERRIDES
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
    queries.insert("uploadId".to_string(), upload_id.to_string());
    queries.insert("partNumber".to_string(), part_number.to_string());
    queries
}

fn expiry_secs(ttl: Duration) -> Result<u32, StorageError> {
    u32::try_from(ttl.as_secs())
        .map_err(|_| StorageError::sdk(format!("expiry of {}s is out of range", ttl.as_secs())))
}

#[derive(Debug, Deserialize)]
struct CompleteMultipartUploadResult {
    #[serde(rename = "Location", default)]
    location: String,
    #[serde(rename = "Bucket", default)]
    bucket: String,
    #[serde(rename = "Key", default)]
    key: String,
    #[serde(rename = "ETag", default)]
    etag: String,
}

#[derive(Debug, Deserialize)]
struct ErrorDocument {
    #[serde(rename = "Code", default)]
    code: String,
    #[serde(rename = "Message", default)]
    message: String,
}

/// Read an S3 `<Error>` document, if `body` is one.
pub(crate) fn parse_error_document(body: &str) -> Option<(String, String)> {
    if !body.contains("<Error>") {
        return None;
    }
    quick_xml::de::from_str::<ErrorDocument>(body)
        .ok()
        .map(|doc| (doc.code, doc.message))
}

/// Interpret the provider's answer to CompleteMultipartUpload.
///
/// S3-compatible providers may report a failed commit with status 200 and an
/// `<Error>` body, so the body is inspected regardless of status.
///
/// # Errors
///
/// Returns [`StorageError::Provider`] for failure statuses or error documents
/// and [`StorageError::MalformedResponse`] for anything unparseable.
pub fn parse_complete_response(status: u16, body: &str) -> Result<CommittedObject, StorageError> {
    if let Some((code, message)) = parse_error_document(body) {
        return Err(StorageError::provider(status, code, message));
    }
    if !(200..300).contains(&status) {
        return Err(StorageError::provider(status, "HttpError", body.trim()));
    }

    let result: CompleteMultipartUploadResult = quick_xml::de::from_str(body)?;
    Ok(CommittedObject {
        location: result.location,
        bucket: result.bucket,
        key: result.key,
        etag: result.etag,
    })
}
