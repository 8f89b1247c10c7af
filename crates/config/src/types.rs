use crate::ConfigError;
use serde::Deserialize;
use std::{collections::HashMap, env};

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    pub auth: AuthConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            server: ServerConfig::from_env(),
            logging: LoggingConfig::from_env(),
            auth: AuthConfig::from_env()?,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

impl ServerConfig {
    /// Load from environment variables
    pub fn from_env() -> Self {
        Self {
            host: env::var("SERVER_HOST").unwrap_or_else(|_| default_host()),
            port: env::var("SERVER_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or_else(default_port),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Logging Configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default)]
    pub modules: HashMap<String, String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl LoggingConfig {
    /// Load from environment variables
    pub fn from_env() -> Self {
        let mut modules = HashMap::new();

        // Load module-specific log levels
        if let Ok(level) = env::var("LOG_MODULE_API") {
            modules.insert("api".to_string(), level);
        }
        if let Ok(level) = env::var("LOG_MODULE_SERVICES") {
            modules.insert("services".to_string(), level);
        }

        Self {
            level: env::var("LOG_LEVEL").unwrap_or_else(|_| default_log_level()),
            format: env::var("LOG_FORMAT").unwrap_or_else(|_| default_log_format()),
            modules,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            modules: HashMap::new(),
        }
    }
}

/// Authentication configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    pub provider: ProviderConfig,
    /// How long an established session stays valid
    #[serde(default = "default_session_ttl_hours")]
    pub session_ttl_hours: i64,
    /// How long an initiated login may wait for its callback
    #[serde(default = "default_pending_ttl_minutes")]
    pub pending_ttl_minutes: i64,
    /// Timeout applied to the token-exchange and profile-fetch calls
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
}

fn default_session_ttl_hours() -> i64 {
    24
}

fn default_pending_ttl_minutes() -> i64 {
    10
}

fn default_http_timeout_secs() -> u64 {
    10
}

impl AuthConfig {
    /// Load from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            provider: ProviderConfig::from_env()?,
            session_ttl_hours: env::var("SESSION_TTL_HOURS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(default_session_ttl_hours),
            pending_ttl_minutes: env::var("PENDING_LOGIN_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(default_pending_ttl_minutes),
            http_timeout_secs: env::var("PROVIDER_HTTP_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(default_http_timeout_secs),
        })
    }
}

/// OAuth provider configuration
///
/// Endpoint URLs default to Google's; any provider implementing the
/// authorization-code flow with a bearer-authenticated userinfo endpoint
/// works with the same shape.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_url: String,
    #[serde(default = "default_auth_url")]
    pub auth_url: String,
    #[serde(default = "default_token_url")]
    pub token_url: String,
    #[serde(default = "default_userinfo_url")]
    pub userinfo_url: String,
    #[serde(default = "default_scopes")]
    pub scopes: Vec<String>,
}

fn default_auth_url() -> String {
    "https://accounts.google.com/o/oauth2/v2/auth".to_string()
}

fn default_token_url() -> String {
    "https://www.googleapis.com/oauth2/v3/token".to_string()
}

fn default_userinfo_url() -> String {
    "https://www.googleapis.com/oauth2/v2/userinfo".to_string()
}

fn default_scopes() -> Vec<String> {
    vec!["profile".to_string(), "email".to_string()]
}

impl ProviderConfig {
    /// Load from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            client_id: env::var("GOOGLE_CLIENT_ID")
                .map_err(|_| ConfigError::MissingVar("GOOGLE_CLIENT_ID"))?,
            client_secret: env::var("GOOGLE_CLIENT_SECRET")
                .map_err(|_| ConfigError::MissingVar("GOOGLE_CLIENT_SECRET"))?,
            redirect_url: env::var("GOOGLE_REDIRECT_URL")
                .map_err(|_| ConfigError::MissingVar("GOOGLE_REDIRECT_URL"))?,
            auth_url: env::var("GOOGLE_AUTH_URL").unwrap_or_else(|_| default_auth_url()),
            token_url: env::var("GOOGLE_TOKEN_URL").unwrap_or_else(|_| default_token_url()),
            userinfo_url: env::var("GOOGLE_USERINFO_URL")
                .unwrap_or_else(|_| default_userinfo_url()),
            scopes: env::var("GOOGLE_SCOPES")
                .ok()
                .map(|scopes| {
                    scopes
                        .split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_else(default_scopes),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AppConfig;
    use std::io::Write;

    #[test]
    fn test_parse_minimal_config() {
        let yaml = r#"
auth:
  provider:
    client_id: "id-123"
    client_secret: "secret-456"
    redirect_url: "http://localhost:3000/callback"
"#;
        let config: AppConfig = serde_yaml::from_str(yaml).unwrap();

        // Unspecified sections fall back to defaults
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, "pretty");

        assert_eq!(config.auth.provider.client_id, "id-123");
        assert_eq!(config.auth.session_ttl_hours, 24);
        assert_eq!(config.auth.pending_ttl_minutes, 10);
        assert_eq!(config.auth.http_timeout_secs, 10);
        assert_eq!(config.auth.provider.scopes, vec!["profile", "email"]);
        assert!(config
            .auth
            .provider
            .auth_url
            .starts_with("https://accounts.google.com"));
    }

    #[test]
    fn test_parse_full_config() {
        let yaml = r#"
server:
  host: "127.0.0.1"
  port: 8080
logging:
  level: "debug"
  format: "json"
  modules:
    services: "trace"
auth:
  provider:
    client_id: "id"
    client_secret: "secret"
    redirect_url: "https://portal.example.com/callback"
    auth_url: "https://sso.example.com/authorize"
    token_url: "https://sso.example.com/token"
    userinfo_url: "https://sso.example.com/userinfo"
    scopes: ["openid", "email"]
  session_ttl_hours: 8
  pending_ttl_minutes: 5
  http_timeout_secs: 3
"#;
        let config: AppConfig = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.logging.modules.get("services").unwrap(), "trace");
        assert_eq!(config.auth.session_ttl_hours, 8);
        assert_eq!(config.auth.pending_ttl_minutes, 5);
        assert_eq!(
            config.auth.provider.token_url,
            "https://sso.example.com/token"
        );
        assert_eq!(config.auth.provider.scopes, vec!["openid", "email"]);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
auth:
  provider:
    client_id: "file-id"
    client_secret: "file-secret"
    redirect_url: "http://localhost:3000/callback"
"#
        )
        .unwrap();

        let config = AppConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.auth.provider.client_id, "file-id");
    }

    #[test]
    fn test_load_without_file_or_env_reports_tried_paths() {
        env::remove_var("GOOGLE_CLIENT_ID");
        env::remove_var("GOOGLE_CLIENT_SECRET");
        env::remove_var("GOOGLE_REDIRECT_URL");

        // No config file in the test cwd and no credentials in the
        // environment: the error names the locations that were searched
        let err = AppConfig::load().unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound { .. }));
        assert!(err.to_string().contains("config/config.yaml"));
    }

    #[test]
    fn test_missing_provider_section_is_an_error() {
        let yaml = r#"
server:
  host: "127.0.0.1"
"#;
        assert!(serde_yaml::from_str::<AppConfig>(yaml).is_err());
    }
}
