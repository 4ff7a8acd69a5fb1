use std::env;
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use std::time::Duration;

/// URL prefix under which stored uploads are served.
pub const PUBLIC_UPLOAD_PREFIX: &str = "/uploads";

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Listen address (default: 0.0.0.0)
    pub host: IpAddr,

    /// Listen port (default: 5000)
    pub port: u16,

    /// Directory uploads are written to and served from (default: "uploads")
    pub upload_dir: PathBuf,

    /// Maximum request body size in bytes (default: 10 MB)
    pub max_body_size: usize,

    /// Allowed CORS origins. Empty allows any origin.
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 5000,
            upload_dir: PathBuf::from("uploads"),
            max_body_size: 10 * 1024 * 1024, // 10 MB
            allowed_origins: Vec::new(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from any key/value source, falling back to defaults for
    /// missing or unparsable values.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let default = Self::default();

        Self {
            host: lookup("HOST")
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.host),

            port: lookup("PORT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.port),

            upload_dir: lookup("UPLOAD_DIR")
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(default.upload_dir),

            max_body_size: lookup("MAX_BODY_SIZE")
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_body_size),

            allowed_origins: lookup("ALLOWED_ORIGINS")
                .map(|v| {
                    v.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or(default.allowed_origins),
        }
    }

    /// Config for tests: everything default except the upload directory.
    pub fn with_upload_dir(upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            upload_dir: upload_dir.into(),
            ..Self::default()
        }
    }
}

/// Client-side settings for an upload session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Base URL of the backend, e.g. `http://localhost:5000`.
    pub endpoint: String,

    /// How long a success or failure message stays up before the session returns to idle.
    pub display_window: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:5000".to_string(),
            display_window: Duration::from_secs(3),
        }
    }
}

impl SessionConfig {
    pub fn upload_url(&self) -> String {
        format!("{}/upload-media", self.endpoint.trim_end_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 5000);
        assert_eq!(config.upload_dir, PathBuf::from("uploads"));
        assert_eq!(config.max_body_size, 10 * 1024 * 1024);
        assert!(config.allowed_origins.is_empty());
    }

    #[test]
    fn test_overrides_from_lookup() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("PORT", "8080"),
            ("HOST", "127.0.0.1"),
            ("UPLOAD_DIR", "/var/media"),
            ("MAX_BODY_SIZE", "1024"),
            ("ALLOWED_ORIGINS", "http://a.test, http://b.test,"),
        ]);
        let config = ServerConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(config.port, 8080);
        assert_eq!(config.host, IpAddr::V4(Ipv4Addr::LOCALHOST));
        assert_eq!(config.upload_dir, PathBuf::from("/var/media"));
        assert_eq!(config.max_body_size, 1024);
        assert_eq!(config.allowed_origins, vec!["http://a.test", "http://b.test"]);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = ServerConfig::from_lookup(|k| match k {
            "PORT" => Some("not-a-port".to_string()),
            "UPLOAD_DIR" => Some("  ".to_string()),
            _ => None,
        });
        assert_eq!(config.port, 5000);
        assert_eq!(config.upload_dir, PathBuf::from("uploads"));
    }

    #[test]
    fn test_upload_url() {
        let config = SessionConfig {
            endpoint: "http://10.0.2.2:5000/".to_string(),
            ..SessionConfig::default()
        };
        assert_eq!(config.upload_url(), "http://10.0.2.2:5000/upload-media");
    }
}
