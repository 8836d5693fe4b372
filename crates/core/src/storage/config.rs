//! Storage configuration types.

use ossup_shared::StorageSettings;

/// Connection settings for an S3-compatible provider.
#[derive(Clone)]
pub struct StorageConfig {
    /// Endpoint URL including scheme, e.g. `https://oss-cn-hangzhou.aliyuncs.com`.
    pub endpoint: String,
    /// Bucket name.
    pub bucket: String,
    /// Access key ID.
    pub access_key_id: String,
    /// Secret access key.
    pub secret_access_key: String,
    /// Signing region.
    pub region: String,
    /// Use `endpoint/bucket/key` addressing instead of `bucket.endpoint/key`.
    pub force_path_style: bool,
}

impl StorageConfig {
    /// Create a config for a virtual-hosted bucket.
    #[must_use]
    pub fn new(
        endpoint: impl Into<String>,
        bucket: impl Into<String>,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            bucket: bucket.into(),
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            region: region.into(),
            force_path_style: false,
        }
    }

    /// Switch to path-style addressing.
    #[must_use]
    pub fn with_path_style(mut self, enabled: bool) -> Self {
        self.force_path_style = enabled;
        self
    }

    /// Endpoint host without scheme.
    #[must_use]
    pub fn endpoint_host(&self) -> &str {
        self.endpoint
            .strip_prefix("https://")
            .or_else(|| self.endpoint.strip_prefix("http://"))
            .unwrap_or(&self.endpoint)
            .trim_end_matches('/')
    }
}

impl From<&StorageSettings> for StorageConfig {
    fn from(settings: &StorageSettings) -> Self {
        Self::new(
            settings.endpoint_url(),
            settings.bucket_name.trim(),
            settings.access_key_id.trim(),
            settings.access_key_secret.trim(),
            settings.region(),
        )
        .with_path_style(settings.force_path_style)
    }
}

impl std::fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageConfig")
            .field("endpoint", &self.endpoint)
            .field("bucket", &self.bucket)
            .field("access_key_id", &self.access_key_id)
            .field("region", &self.region)
            .field("force_path_style", &self.force_path_style)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_settings() {
        let settings = StorageSettings {
            endpoint: "oss-cn-hangzhou.aliyuncs.com".to_string(),
            access_key_id: " id ".to_string(),
            access_key_secret: "secret".to_string(),
            bucket_name: "uploads".to_string(),
            region: None,
            force_path_style: true,
            part_url_ttl_secs: 3600,
            public_url_ttl_secs: 10,
        };

        let config = StorageConfig::from(&settings);
        assert_eq!(config.endpoint, "https://oss-cn-hangzhou.aliyuncs.com");
        assert_eq!(config.endpoint_host(), "oss-cn-hangzhou.aliyuncs.com");
        assert_eq!(config.access_key_id, "id");
        assert_eq!(config.region, "oss-cn-hangzhou");
        assert!(config.force_path_style);
    }

    #[test]
    fn test_debug_hides_secret() {
        let config = StorageConfig::new("https://e", "b", "id", "top-secret", "r");
        assert!(!format!("{config:?}").contains("top-secret"));
    }
}
