//! Application configuration management.

use serde::Deserialize;

/// Legacy environment variables understood as fallbacks for the storage section.
const LEGACY_STORAGE_VARS: [(&str, &str); 5] = [
    ("ALIYUN_OSS_ENDPOINT", "storage.endpoint"),
    ("ALIYUN_OSS_ACCESS_KEY_ID", "storage.access_key_id"),
    ("ALIYUN_OSS_ACCESS_KEY_SECRET", "storage.access_key_secret"),
    ("ALIYUN_OSS_BUCKET_NAME", "storage.bucket_name"),
    ("ALIYUN_OSS_REGION", "storage.region"),
];

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Object storage configuration.
    pub storage: StorageSettings,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Prefix every upload route is mounted under.
    #[serde(default = "default_route_prefix")]
    pub route_prefix: String,
    /// Whether provider error text is returned to callers verbatim.
    #[serde(default = "default_expose_upstream_errors")]
    pub expose_upstream_errors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            route_prefix: default_route_prefix(),
            expose_upstream_errors: default_expose_upstream_errors(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_route_prefix() -> String {
    "/aliyun".to_string()
}

fn default_expose_upstream_errors() -> bool {
    true
}

/// Object storage configuration.
#[derive(Clone, Deserialize)]
pub struct StorageSettings {
    /// Provider endpoint, e.g. `oss-cn-hangzhou.aliyuncs.com`. A scheme is optional.
    pub endpoint: String,
    /// Access key id.
    pub access_key_id: String,
    /// Access key secret.
    pub access_key_secret: String,
    /// Bucket every upload lands in.
    pub bucket_name: String,
    /// Signing region. Derived from the endpoint when absent.
    #[serde(default)]
    pub region: Option<String>,
    /// Address the bucket as a path segment instead of a subdomain.
    #[serde(default)]
    pub force_path_style: bool,
    /// Lifetime of part upload URLs in seconds.
    #[serde(default = "default_part_url_ttl")]
    pub part_url_ttl_secs: u32,
    /// Lifetime of the download URL returned after completion, in seconds.
    #[serde(default = "default_public_url_ttl")]
    pub public_url_ttl_secs: u32,
}

fn default_part_url_ttl() -> u32 {
    3600 // 1 hour
}

fn default_public_url_ttl() -> u32 {
    10
}

impl std::fmt::Debug for StorageSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageSettings")
            .field("endpoint", &self.endpoint)
            .field("access_key_id", &self.access_key_id)
            .field("access_key_secret", &"<redacted>")
            .field("bucket_name", &self.bucket_name)
            .field("region", &self.region)
            .field("force_path_style", &self.force_path_style)
            .field("part_url_ttl_secs", &self.part_url_ttl_secs)
            .field("public_url_ttl_secs", &self.public_url_ttl_secs)
            .finish()
    }
}

impl StorageSettings {
    /// Endpoint without scheme or trailing slash.
    #[must_use]
    pub fn endpoint_host(&self) -> &str {
        let endpoint = self.endpoint.trim();
        endpoint
            .strip_prefix("https://")
            .or_else(|| endpoint.strip_prefix("http://"))
            .unwrap_or(endpoint)
            .trim_end_matches('/')
    }

    /// Endpoint as a URL, defaulting to https.
    #[must_use]
    pub fn endpoint_url(&self) -> String {
        let endpoint = self.endpoint.trim().trim_end_matches('/');
        if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            endpoint.to_string()
        } else {
            format!("https://{endpoint}")
        }
    }

    /// Signing region: the configured one, else the first label of the endpoint host.
    #[must_use]
    pub fn region(&self) -> String {
        match self.region.as_deref().map(str::trim) {
            Some(region) if !region.is_empty() => region.to_string(),
            _ => self
                .endpoint_host()
                .split('.')
                .next()
                .unwrap_or_default()
                .to_string(),
        }
    }

    /// Names of required fields that are empty.
    #[must_use]
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("endpoint", self.endpoint_host()),
            ("access_key_id", self.access_key_id.trim()),
            ("access_key_secret", self.access_key_secret.trim()),
            ("bucket_name", self.bucket_name.trim()),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(name, _)| name)
        .collect()
    }

    /// Check that required fields are set and URL lifetimes are non-zero.
    ///
    /// # Errors
    ///
    /// Returns a message listing every problem found.
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        let mut problems = Vec::new();

        let missing = self.missing_fields();
        if !missing.is_empty() {
            problems.push(format!("missing storage.{}", missing.join(", storage.")));
        }
        for (name, secs) in [
            ("part_url_ttl_secs", self.part_url_ttl_secs),
            ("public_url_ttl_secs", self.public_url_ttl_secs),
        ] {
            if secs == 0 {
                problems.push(format!("storage.{name} must be greater than 0"));
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(config::ConfigError::Message(problems.join("; ")))
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// Precedence, lowest first: legacy `ALIYUN_OSS_*` variables, `config/default`,
    /// `config/{RUN_MODE}`, then `OSSUP__SECTION__KEY` variables.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let mut builder = config::Config::builder();
        for (var, key) in LEGACY_STORAGE_VARS {
            if let Ok(value) = std::env::var(var) {
                builder = builder.set_default(key, value)?;
            }
        }

        let config = builder
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("OSSUP").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
