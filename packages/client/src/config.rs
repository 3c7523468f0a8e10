//! Client configuration, resolved once at construction.

use serde::{Deserialize, Serialize};
use url::Url;

use recordfs_core::{Credentials, Error, PathParser, Result, SplitPolicy};

/// Default store port.
pub const DEFAULT_PORT: u16 = 6020;

/// Default endpoint path on the store host.
pub const DEFAULT_PATH: &str = "/api/stream";

/// Configuration for a [`Client`](crate::Client).
///
/// Deserializes from a partial object; missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Store host name.
    pub host: String,

    /// Store port.
    pub port: u16,

    /// Endpoint path on the host.
    pub path: String,

    /// Connect over `wss` instead of `ws`.
    pub secure: bool,

    /// How delimited record paths are split.
    pub split: SplitPolicy,

    /// Whether subscriptions replay the current value by default.
    pub immediate: bool,

    /// Login parameters.
    pub credentials: Credentials,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: DEFAULT_PORT,
            path: DEFAULT_PATH.to_string(),
            secure: false,
            split: SplitPolicy::default(),
            immediate: true,
            credentials: Credentials::default(),
        }
    }
}

impl ClientConfig {
    /// Default configuration for `host`.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Self::default()
        }
    }

    /// Derive a configuration from the location the application was served
    /// from: same host, and `wss` whenever that location was secure.
    pub fn for_location(location: &Url) -> Self {
        Self {
            host: location.host_str().unwrap_or("localhost").to_string(),
            secure: matches!(location.scheme(), "https" | "wss"),
            ..Self::default()
        }
    }

    /// Set the store port.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the endpoint path.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Use `wss` instead of `ws`.
    #[must_use]
    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Set how delimited record paths are split.
    #[must_use]
    pub fn with_split(mut self, split: SplitPolicy) -> Self {
        self.split = split;
        self
    }

    /// Set whether subscriptions replay the current value by default.
    #[must_use]
    pub fn with_immediate(mut self, immediate: bool) -> Self {
        self.immediate = immediate;
        self
    }

    /// Set the login parameters.
    #[must_use]
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    /// `wss` when secure, otherwise `ws`.
    pub fn scheme(&self) -> &'static str {
        if self.secure {
            "wss"
        } else {
            "ws"
        }
    }

    /// The endpoint address handed to the connector.
    pub fn endpoint(&self) -> Result<Url> {
        let mut url = Url::parse(&format!("{}://{}:{}", self.scheme(), self.host, self.port))
            .map_err(|e| Error::transport(format!("invalid endpoint '{}': {}", self.host, e)))?;
        url.set_path(&self.path);
        Ok(url)
    }

    /// A path parser using the configured split policy.
    pub fn parser(&self) -> PathParser {
        PathParser::new(self.split)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn default_endpoint() {
        let endpoint = ClientConfig::default().endpoint().unwrap();
        assert_eq!(endpoint.as_str(), "ws://localhost:6020/api/stream");
    }

    #[test]
    fn secure_upgrades_scheme() {
        let config = ClientConfig::new("example.com").with_secure(true);
        assert_eq!(
            config.endpoint().unwrap().as_str(),
            "wss://example.com:6020/api/stream"
        );
    }

    #[test]
    fn location_drives_host_and_scheme() {
        let page = Url::parse("https://app.example.com/dashboard").unwrap();
        let config = ClientConfig::for_location(&page);
        assert_eq!(config.host, "app.example.com");
        assert!(config.secure);

        let page = Url::parse("http://intranet:8080/").unwrap();
        assert!(!ClientConfig::for_location(&page).secure);
    }

    #[test]
    fn builder_methods() {
        let config = ClientConfig::new("h")
            .with_port(7000)
            .with_path("/stream")
            .with_split(SplitPolicy::SlashOrDot)
            .with_immediate(false);
        assert_eq!(config.endpoint().unwrap().as_str(), "ws://h:7000/stream");
        assert_eq!(config.parser().policy(), SplitPolicy::SlashOrDot);
        assert!(!config.immediate);
    }

    #[test]
    fn invalid_host_is_rejected() {
        let config = ClientConfig::new("bad host");
        assert!(matches!(config.endpoint(), Err(Error::Transport { .. })));
    }

    #[test]
    fn deserialize_partial() {
        let config: ClientConfig = serde_json::from_value(json!({
            "host": "store.internal",
            "secure": true,
            "split": "slash_or_dot",
            "credentials": {"token": "t"}
        }))
        .unwrap();
        assert_eq!(config.host, "store.internal");
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.split, SplitPolicy::SlashOrDot);
        assert!(config.immediate);
        assert_eq!(config.credentials.get("token"), Some(&json!("t")));
    }
}
