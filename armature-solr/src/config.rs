//! Solr client configuration.

use crate::error::{Result, SolrError};
use crate::transport::Credentials;
use crate::version::ProtocolVersion;
use std::env;
use std::time::Duration;

/// Default base URL used when none is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/solr/";

/// Solr client configuration.
#[derive(Debug, Clone)]
pub struct SolrConfig {
    /// Base URL of the Solr core or collection.
    pub base_url: String,
    /// Send searches as GET instead of POST (useful behind HTTP caches).
    pub use_get: bool,
    /// Solr major version. Detected from `admin/system` when unset.
    pub version: Option<u32>,
    /// Timeout passed unmodified to every request.
    pub timeout: Option<Duration>,
    /// Connection timeout for the default transport.
    pub connect_timeout: Duration,
    /// Credentials passed through to the transport.
    pub credentials: Option<Credentials>,
    /// User agent string for the default transport.
    pub user_agent: String,
    /// Maximum idle connections per host for the default transport.
    pub pool_max_idle_per_host: usize,
}

impl Default for SolrConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl SolrConfig {
    /// Create a new configuration for the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            use_get: false,
            version: None,
            timeout: None,
            connect_timeout: Duration::from_secs(10),
            credentials: None,
            user_agent: format!("armature-solr/{}", env!("CARGO_PKG_VERSION")),
            pool_max_idle_per_host: 32,
        }
    }

    /// Create configuration from environment variables.
    ///
    /// - `SOLR_URL` - base URL
    /// - `SOLR_VERSION` - major version (skips detection)
    /// - `SOLR_TIMEOUT_SECS` - request timeout
    /// - `SOLR_USE_GET=1|true` - search with GET
    /// - `SOLR_USERNAME` / `SOLR_PASSWORD` - basic auth
    pub fn from_env() -> Result<Self> {
        let mut config = Self::new(env::var("SOLR_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.into()));

        if let Ok(version) = env::var("SOLR_VERSION") {
            let major = version.parse::<u32>().map_err(|_| {
                SolrError::Configuration(format!("invalid SOLR_VERSION: {:?}", version))
            })?;
            config.version = Some(major);
        }

        if let Ok(secs) = env::var("SOLR_TIMEOUT_SECS") {
            let secs = secs.parse::<u64>().map_err(|_| {
                SolrError::Configuration(format!("invalid SOLR_TIMEOUT_SECS: {:?}", secs))
            })?;
            config.timeout = Some(Duration::from_secs(secs));
        }

        config.use_get = env::var("SOLR_USE_GET")
            .map(|v| v == "1" || v.to_lowercase() == "true")
            .unwrap_or(false);

        if let Ok(username) = env::var("SOLR_USERNAME") {
            config.credentials = Some(Credentials {
                username,
                password: env::var("SOLR_PASSWORD").ok(),
            });
        }

        Ok(config)
    }

    /// Set basic authentication credentials.
    pub fn with_basic_auth(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.credentials = Some(Credentials {
            username: username.into(),
            password: Some(password.into()),
        });
        self
    }

    /// Use GET for searches.
    pub fn with_use_get(mut self, use_get: bool) -> Self {
        self.use_get = use_get;
        self
    }

    /// Pin the Solr major version instead of detecting it.
    pub fn with_version(mut self, major: u32) -> Self {
        self.version = Some(major);
        self
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the connection timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the user agent string.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the maximum idle connections per host.
    pub fn with_pool_max_idle_per_host(mut self, max: usize) -> Self {
        self.pool_max_idle_per_host = max;
        self
    }

    /// Resolve the configured major version, if any.
    pub fn protocol_version(&self) -> Result<Option<ProtocolVersion>> {
        self.version.map(ProtocolVersion::from_major).transpose()
    }

    /// Base URL normalized to end with `/` so resources join beneath it.
    pub(crate) fn normalized_base_url(&self) -> Result<url::Url> {
        let base = if self.base_url.ends_with('/') {
            self.base_url.clone()
        } else {
            format!("{}/", self.base_url)
        };
        url::Url::parse(&base)
            .map_err(|e| SolrError::Configuration(format!("invalid base URL {:?}: {}", base, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SolrConfig::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert!(!config.use_get);
        assert!(config.timeout.is_none());
        assert!(config.protocol_version().unwrap().is_none());
    }

    #[test]
    fn test_builder() {
        let config = SolrConfig::new("http://solr:8983/solr/core1")
            .with_use_get(true)
            .with_version(4)
            .with_timeout(Duration::from_secs(5))
            .with_basic_auth("admin", "secret");

        assert!(config.use_get);
        assert_eq!(
            config.protocol_version().unwrap(),
            Some(ProtocolVersion::Solr4)
        );
        assert_eq!(config.timeout, Some(Duration::from_secs(5)));
        let credentials = config.credentials.unwrap();
        assert_eq!(credentials.username, "admin");
        assert_eq!(credentials.password.as_deref(), Some("secret"));
    }

    #[test]
    fn test_unsupported_version() {
        let config = SolrConfig::default().with_version(2);
        assert!(matches!(
            config.protocol_version(),
            Err(SolrError::Configuration(_))
        ));
    }

    #[test]
    fn test_base_url_normalization() {
        let config = SolrConfig::new("http://localhost:8983/solr");
        let url = config.normalized_base_url().unwrap();
        assert_eq!(url.as_str(), "http://localhost:8983/solr/");
        assert_eq!(
            url.join("select").unwrap().as_str(),
            "http://localhost:8983/solr/select"
        );

        let invalid = SolrConfig::new("not a url");
        assert!(matches!(
            invalid.normalized_base_url(),
            Err(SolrError::Configuration(_))
        ));
    }
}
