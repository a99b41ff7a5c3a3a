//! Configuration types and loading
//!
//! Config precedence: CLI args > env vars > config file > defaults. The
//! config file is optional — a deployment can run on environment variables
//! alone. The client secret is loaded from the DISCORD_CLIENT_SECRET env var
//! or client_secret_file, never stored in the TOML directly to avoid
//! leaking secrets.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::info;

use crate::error::ConfigError;
use crate::secret::ClientSecret;

/// Root configuration
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub oauth: OAuthConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

/// HTTP listener settings
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,
    /// Browser origins allowed to call `/login` cross-origin and read the
    /// JSON body. Credentials are allowed, so wildcards are not.
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
}

/// Discord OAuth application settings
#[derive(Debug, Deserialize)]
pub struct OAuthConfig {
    /// Discord application client id (DISCORD_CLIENT_ID env overrides)
    #[serde(default)]
    pub client_id: String,
    /// Resolved from DISCORD_CLIENT_SECRET or client_secret_file
    #[serde(skip)]
    pub client_secret: Option<ClientSecret>,
    /// Path to a file containing the client secret (alternative to the env var)
    #[serde(default)]
    pub client_secret_file: Option<PathBuf>,
    /// Application base URL; the callback redirects here on success and the
    /// error page lives under it (APP_URL env overrides)
    #[serde(default)]
    pub app_url: String,
    /// Public base URL of this relay, used to build the OAuth redirect URI
    /// (API_URL env overrides)
    #[serde(default)]
    pub api_url: String,
    /// Discord API base, overridable so tests can point at a mock server
    #[serde(default = "default_discord_api_base")]
    pub discord_api_base: String,
    /// Timeout applied to token exchange and user fetch calls
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

/// Session store settings
#[derive(Debug, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

impl Default for OAuthConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: None,
            client_secret_file: None,
            app_url: String::new(),
            api_url: String::new(),
            discord_api_base: default_discord_api_base(),
            timeout_secs: default_timeout(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            allowed_origins: default_allowed_origins(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

fn default_listen_addr() -> SocketAddr {
    "0.0.0.0:8080".parse().expect("valid default listen addr")
}

fn default_allowed_origins() -> Vec<String> {
    vec![
        "http://localhost".to_string(),
        "http://localhost:3000".to_string(),
    ]
}

fn default_discord_api_base() -> String {
    discord_auth::DISCORD_API_BASE.to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_store_path() -> PathBuf {
    PathBuf::from("data.json")
}

impl Config {
    /// Load configuration from a TOML file (if present), then overlay
    /// environment variables.
    ///
    /// Env overrides: DISCORD_CLIENT_ID, APP_URL, API_URL. Client secret
    /// resolution order:
    /// 1. DISCORD_CLIENT_SECRET env var
    /// 2. client_secret_file path from config
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config: Config = if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            toml::from_str(&contents)?
        } else {
            info!(path = %path.display(), "config file not found, using defaults and environment");
            Config::default()
        };

        if let Ok(id) = std::env::var("DISCORD_CLIENT_ID") {
            config.oauth.client_id = id;
        }
        if let Ok(url) = std::env::var("APP_URL") {
            config.oauth.app_url = url;
        }
        if let Ok(url) = std::env::var("API_URL") {
            config.oauth.api_url = url;
        }

        // Resolve client secret: env var takes precedence over file
        config.oauth.client_secret =
            ClientSecret::resolve(config.oauth.client_secret_file.as_deref())?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.oauth.client_id.is_empty() {
            return Err(ConfigError::Invalid(
                "client_id must be set (oauth.client_id or DISCORD_CLIENT_ID)".into(),
            ));
        }
        if self.oauth.client_secret.is_none() {
            return Err(ConfigError::Invalid(
                "client secret must be set (DISCORD_CLIENT_SECRET or oauth.client_secret_file)"
                    .into(),
            ));
        }
        for (name, url) in [
            ("app_url", &self.oauth.app_url),
            ("api_url", &self.oauth.api_url),
            ("discord_api_base", &self.oauth.discord_api_base),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ConfigError::Invalid(format!(
                    "{name} must start with http:// or https://, got: {url}"
                )));
            }
        }
        if self.oauth.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "timeout_secs must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    /// Resolve config file path from CLI arg or CONFIG_PATH env var.
    pub fn resolve_path(cli_path: Option<&str>) -> PathBuf {
        if let Some(p) = cli_path {
            return PathBuf::from(p);
        }
        if let Ok(p) = std::env::var("CONFIG_PATH") {
            return PathBuf::from(p);
        }
        PathBuf::from("login-relay.toml")
    }

    /// The OAuth redirect URI registered with Discord.
    pub fn redirect_uri(&self) -> String {
        format!("{}/callback", self.oauth.api_url)
    }

    /// Base URL of the application's error page.
    pub fn error_uri(&self) -> String {
        format!("{}/auth/error", self.oauth.app_url)
    }
}
