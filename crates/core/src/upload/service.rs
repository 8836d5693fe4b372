//! Upload service implementation.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use ossup_shared::StorageSettings;
use tracing::debug;

use super::error::UploadError;
use super::key::generate_object_key;
use super::parts::{normalize_parts, strip_etag_quotes};
use super::types::{CompletedUpload, CompletionRequest, InitiatedUpload, PartUploadUrl};
use crate::storage::{MultipartStore, StoredPart};

/// Default lifetime of a part upload URL: 1 hour.
pub const DEFAULT_PART_URL_TTL: Duration = Duration::from_secs(3600);
/// Default lifetime of the download URL minted after completion.
pub const DEFAULT_PUBLIC_URL_TTL: Duration = Duration::from_secs(10);

/// URL lifetimes used by the upload service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadOptions {
    /// Lifetime of part upload URLs.
    pub part_url_ttl: Duration,
    /// Lifetime of the download URL returned on completion.
    pub public_url_ttl: Duration,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            part_url_ttl: DEFAULT_PART_URL_TTL,
            public_url_ttl: DEFAULT_PUBLIC_URL_TTL,
        }
    }
}

impl From<&StorageSettings> for UploadOptions {
    fn from(settings: &StorageSettings) -> Self {
        Self {
            part_url_ttl: Duration::from_secs(u64::from(settings.part_url_ttl_secs)),
            public_url_ttl: Duration::from_secs(u64::from(settings.public_url_ttl_secs)),
        }
    }
}

/// Brokers multipart uploads between clients and a [`MultipartStore`].
///
/// The service keeps no per-upload state: every call carries the upload id
/// and object key the client got back from [`UploadService::initiate_upload`].
pub struct UploadService {
    store: Arc<dyn MultipartStore>,
    options: UploadOptions,
}

impl UploadService {
    /// Create a new upload service with default URL lifetimes.
    #[must_use]
    pub fn new(store: Arc<dyn MultipartStore>) -> Self {
        Self {
            store,
            options: UploadOptions::default(),
        }
    }

    /// Override URL lifetimes.
    #[must_use]
    pub fn with_options(mut self, options: UploadOptions) -> Self {
        self.options = options;
        self
    }

    /// Get the bucket name.
    #[must_use]
    pub fn bucket(&self) -> &str {
        self.store.bucket()
    }

    /// Start a multipart upload for `filename`.
    ///
    /// The object key is derived from the current date, a nanosecond
    /// timestamp and the filename.
    ///
    /// # Errors
    ///
    /// Returns an error if the filename is empty or the provider rejects the
    /// request.
    pub async fn initiate_upload(&self, filename: &str) -> Result<InitiatedUpload, UploadError> {
        if filename.is_empty() {
            return Err(UploadError::validation("filename is required"));
        }

        let key = generate_object_key(filename, Utc::now());
        let started = self.store.initiate(&key).await?;

        Ok(InitiatedUpload {
            upload_id: started.upload_id,
            bucket_name: started.bucket,
            object_key: started.key,
        })
    }

    /// Sign a PUT URL for one part of an upload.
    ///
    /// Signing happens locally; the provider is not contacted.
    ///
    /// # Errors
    ///
    /// Returns an error if the upload id or object key is empty, or the SDK
    /// refuses to sign.
    pub async fn sign_part_upload_url(
        &self,
        upload_id: &str,
        object_key: &str,
        part_number: u32,
        ttl: Duration,
    ) -> Result<PartUploadUrl, UploadError> {
        require("uploadId", upload_id)?;
        require("objectKey", object_key)?;

        let upload_url = self
            .store
            .presign_part(object_key, upload_id, part_number, ttl)
            .await?;

        Ok(PartUploadUrl {
            upload_id: upload_id.to_string(),
            bucket_name: self.store.bucket().to_string(),
            object_key: object_key.to_string(),
            part_number,
            upload_url,
            expiration_time: expires_at(ttl),
        })
    }

    /// Sign a part URL with the configured lifetime.
    ///
    /// # Errors
    ///
    /// See [`UploadService::sign_part_upload_url`].
    pub async fn sign_part(
        &self,
        upload_id: &str,
        object_key: &str,
        part_number: u32,
    ) -> Result<PartUploadUrl, UploadError> {
        self.sign_part_upload_url(upload_id, object_key, part_number, self.options.part_url_ttl)
            .await
    }

    /// Finalize an upload.
    ///
    /// Parts are sorted and their ETags unquoted before the commit. On
    /// success a direct object URL and a short-lived download URL are
    /// attached. Completing is not repeatable: the provider invalidates the
    /// upload id once it succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the request is incomplete, the provider rejects
    /// the commit, or the download URL cannot be signed.
    pub async fn complete_upload(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletedUpload, UploadError> {
        require("uploadId", &request.upload_id)?;
        require("objectKey", &request.object_key)?;
        if request.parts.is_empty() {
            return Err(UploadError::validation("parts must not be empty"));
        }

        let parts: Vec<StoredPart> = normalize_parts(request.parts)
            .into_iter()
            .map(|p| StoredPart {
                part_number: p.part_number,
                etag: p.etag,
            })
            .collect();
        debug!(
            object_key = %request.object_key,
            parts = parts.len(),
            "Committing multipart upload"
        );

        let committed = self
            .store
            .complete(&request.object_key, &request.upload_id, parts)
            .await
            .map_err(|e| UploadError::upstream_context("complete multipart upload failed", &e))?;

        let private_url = self.store.object_url(&request.object_key);
        let ttl = self.options.public_url_ttl;
        let public_url = self
            .sign_public_url(&request.object_key, ttl)
            .await
            .map_err(|e| UploadError::upstream(format!("generate public URL failed: {e}")))?;

        Ok(CompletedUpload {
            location: committed.location,
            bucket: non_empty_or(committed.bucket, self.store.bucket()),
            key: non_empty_or(committed.key, &request.object_key),
            etag: strip_etag_quotes(&committed.etag).to_string(),
            private_url,
            public_url,
            expiration: expires_at(ttl),
        })
    }

    /// Sign a GET URL that downloads the object as an attachment.
    ///
    /// # Errors
    ///
    /// Returns an error if the object key is empty or the SDK refuses to sign.
    pub async fn sign_public_url(&self, object_key: &str, ttl: Duration) -> Result<String, UploadError> {
        require("objectKey", object_key)?;
        let url = self
            .store
            .presign_download(object_key, ttl, &attachment_disposition(object_key))
            .await?;
        Ok(url)
    }
}

fn require(name: &str, value: &str) -> Result<(), UploadError> {
    if value.is_empty() {
        return Err(UploadError::validation(format!("{name} is required")));
    }
    Ok(())
}

/// Unix timestamp `ttl` from now.
fn expires_at(ttl: Duration) -> i64 {
    let ttl = chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX);
    Utc::now()
        .checked_add_signed(ttl)
        .unwrap_or(chrono::DateTime::<Utc>::MAX_UTC)
        .timestamp()
}

/// `Content-Disposition` naming the object's last path segment, with an
/// RFC 5987 `filename*` for non-ASCII names.
fn attachment_disposition(object_key: &str) -> String {
    let filename = object_key.rsplit('/').next().unwrap_or(object_key);
    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        filename.replace('"', ""),
        urlencoding::encode(filename)
    )
}

fn non_empty_or(value: String, fallback: &str) -> String {
    if value.is_empty() {
        fallback.to_string()
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StorageError;
    use crate::testing::{Operation, RecordingStore, StoreCall};
    use crate::upload::PartDescriptor;

    fn service() -> (Arc<RecordingStore>, UploadService) {
        let store = Arc::new(RecordingStore::new("media"));
        let service = UploadService::new(store.clone());
        (store, service)
    }

    #[test]
    fn test_attachment_disposition() {
        assert_eq!(
            attachment_disposition("uploads/2026_01_01/42_report.pdf"),
            "attachment; filename=\"42_report.pdf\"; filename*=UTF-8''42_report.pdf"
        );
        assert_eq!(
            attachment_disposition("a\"b.txt"),
            "attachment; filename=\"ab.txt\"; filename*=UTF-8''a%22b.txt"
        );
    }

    #[test]
    fn test_attachment_disposition_non_ascii() {
        assert_eq!(
            attachment_disposition("uploads/2026_01_01/42_报告.pdf"),
            "attachment; filename=\"42_报告.pdf\"; filename*=UTF-8''42_%E6%8A%A5%E5%91%8A.pdf"
        );
    }

    #[test]
    fn test_options_from_settings() {
        let settings = StorageSettings {
            endpoint: "e".to_string(),
            access_key_id: "i".to_string(),
            access_key_secret: "s".to_string(),
            bucket_name: "b".to_string(),
            region: None,
            force_path_style: false,
            part_url_ttl_secs: 120,
            public_url_ttl_secs: 5,
        };
        let options = UploadOptions::from(&settings);
        assert_eq!(options.part_url_ttl, Duration::from_secs(120));
        assert_eq!(options.public_url_ttl, Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_initiate_upload_derives_key() {
        let (store, service) = service();

        let started = service.initiate_upload("a.txt").await.expect("should start");

        assert_eq!(started.bucket_name, "media");
        assert!(started.object_key.starts_with("uploads/"));
        assert!(started.object_key.ends_with("_a.txt"));
        assert!(!started.upload_id.is_empty());
        assert_eq!(
            store.calls(),
            vec![StoreCall::Initiate {
                key: started.object_key.clone()
            }]
        );
    }

    #[tokio::test]
    async fn test_initiate_upload_empty_filename() {
        let (store, service) = service();

        let result = service.initiate_upload("").await;

        assert!(matches!(result, Err(UploadError::Validation(_))));
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_initiate_upload_provider_failure() {
        let (store, service) = service();
        store.fail_on(Operation::Initiate, 403, "AccessDenied", "bad signature");

        let err = service.initiate_upload("a.txt").await.unwrap_err();

        assert!(matches!(&err, UploadError::Upstream(msg) if msg.contains("AccessDenied")));
    }

    #[tokio::test]
    async fn test_sign_part_upload_url() {
        let (store, service) = service();
        let before = Utc::now().timestamp();

        let part = service
            .sign_part_upload_url("upload-1", "uploads/x/1_a.txt", 3, Duration::from_secs(3600))
            .await
            .expect("should sign");

        assert_eq!(part.part_number, 3);
        assert_eq!(part.bucket_name, "media");
        assert!(part.upload_url.contains("partNumber=3"));
        assert!(part.expiration_time >= before + 3600);
        assert!(part.expiration_time <= Utc::now().timestamp() + 3600);
        assert_eq!(
            store.calls(),
            vec![StoreCall::PresignPart {
                key: "uploads/x/1_a.txt".to_string(),
                upload_id: "upload-1".to_string(),
                part_number: 3,
                ttl: Duration::from_secs(3600),
            }]
        );
    }

    #[tokio::test]
    async fn test_sign_part_uses_configured_ttl() {
        let (store, service) = service();
        let service = service.with_options(UploadOptions {
            part_url_ttl: Duration::from_secs(60),
            ..UploadOptions::default()
        });

        service.sign_part("u", "k", 1).await.expect("should sign");

        assert!(matches!(
            store.calls().as_slice(),
            [StoreCall::PresignPart { ttl, .. }] if *ttl == Duration::from_secs(60)
        ));
    }

    #[tokio::test]
    async fn test_sign_part_upload_url_requires_ids() {
        let (store, service) = service();

        let err = service
            .sign_part_upload_url("", "k", 1, DEFAULT_PART_URL_TTL)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "uploadId is required");
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_complete_upload_normalizes_parts() {
        let (store, service) = service();

        let completed = service
            .complete_upload(CompletionRequest {
                upload_id: "upload-1".to_string(),
                object_key: "uploads/x/1_a.txt".to_string(),
                parts: vec![
                    PartDescriptor::new(2, "\"b\""),
                    PartDescriptor::new(1, "\"a\""),
                ],
            })
            .await
            .expect("should complete");

        let calls = store.calls();
        assert_eq!(
            calls[0],
            StoreCall::Complete {
                key: "uploads/x/1_a.txt".to_string(),
                upload_id: "upload-1".to_string(),
                parts: vec![
                    StoredPart {
                        part_number: 1,
                        etag: "a".to_string()
                    },
                    StoredPart {
                        part_number: 2,
                        etag: "b".to_string()
                    },
                ],
            }
        );
        assert!(matches!(
            &calls[1],
            StoreCall::PresignDownload { key, ttl, content_disposition }
                if key == "uploads/x/1_a.txt"
                    && *ttl == DEFAULT_PUBLIC_URL_TTL
                    && content_disposition
                        == "attachment; filename=\"1_a.txt\"; filename*=UTF-8''1_a.txt"
        ));

        assert_eq!(completed.bucket, "media");
        assert_eq!(completed.key, "uploads/x/1_a.txt");
        assert!(!completed.etag.contains('"'));
        assert_eq!(
            completed.private_url,
            "https://media.store.test/uploads/x/1_a.txt"
        );
        assert!(!completed.public_url.is_empty());
        assert!(completed.expiration >= Utc::now().timestamp());
    }

    #[tokio::test]
    async fn test_complete_upload_rejects_empty_parts() {
        let (store, service) = service();

        let err = service
            .complete_upload(CompletionRequest {
                upload_id: "u".to_string(),
                object_key: "k".to_string(),
                parts: Vec::new(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, UploadError::Validation(_)));
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_complete_upload_provider_failure_has_context() {
        let (store, service) = service();
        store.fail_on(
            Operation::Complete,
            404,
            "NoSuchUpload",
            "The specified upload does not exist.",
        );

        let err = service
            .complete_upload(CompletionRequest {
                upload_id: "gone".to_string(),
                object_key: "k".to_string(),
                parts: vec![PartDescriptor::new(1, "x")],
            })
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "complete multipart upload failed: NoSuchUpload: The specified upload does not exist. (status 404)"
        );
        // No download URL is signed for a failed commit.
        assert_eq!(store.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_complete_upload_public_url_failure() {
        let (store, service) = service();
        store.fail_on(Operation::PresignDownload, 0, "Sdk", "clock skew");

        let err = service
            .complete_upload(CompletionRequest {
                upload_id: "u".to_string(),
                object_key: "k".to_string(),
                parts: vec![PartDescriptor::new(1, "x")],
            })
            .await
            .unwrap_err();

        assert!(err.to_string().starts_with("generate public URL failed: "));
    }

    #[tokio::test]
    async fn test_sign_public_url() {
        let (_store, service) = service();

        let url = service
            .sign_public_url("uploads/x/1_a.txt", Duration::from_secs(10))
            .await
            .expect("should sign");

        assert!(url.contains("uploads/x/1_a.txt"));
    }

    #[test]
    fn test_storage_error_converts_to_upstream() {
        let err: UploadError = StorageError::sdk("boom").into();
        assert!(matches!(err, UploadError::Upstream(msg) if msg == "storage operation failed: boom"));
    }
}
