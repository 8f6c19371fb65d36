use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use cs_backend::{ClientOptions, CommandToken, EnvToken, FileToken, TokenChain, DEFAULT_BASE_URL};

/// Environment variable that overrides `server.base_url`.
pub const API_URL_ENV: &str = "CHATSTREAM_API_URL";

#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub log: LogConfig,
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// API root; the stream endpoint is `{base_url}/chat/stream`.
    pub base_url: String,
    /// Limit for the whole request including the streamed body.
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: 120,
            connect_timeout_secs: 10,
        }
    }
}

impl ServerConfig {
    /// Resolve the base URL, letting a non-empty override win.
    pub fn resolve_base_url(&self, env_override: Option<String>) -> String {
        env_override
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| self.base_url.clone())
    }

    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
        }
    }
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct AuthConfig {
    /// Command whose stdout is the token. Run via `sh -c`.
    pub token_cmd: Option<String>,
    /// File holding the token.
    pub token_file: Option<String>,
    /// Environment variable consulted last.
    pub token_env: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_cmd: None,
            token_file: None,
            token_env: "CHATSTREAM_TOKEN".to_string(),
        }
    }
}

impl AuthConfig {
    /// Token sources in priority order: command, file, environment.
    pub fn token_provider(&self) -> TokenChain {
        let mut chain = TokenChain::new();
        if let Some(cmd) = &self.token_cmd {
            chain = chain.with(CommandToken::new(cmd.clone()));
        }
        if let Some(file) = &self.token_file {
            chain = chain.with(FileToken::new(file.clone()));
        }
        chain.with(EnvToken::new(self.token_env.clone()))
    }
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct LogConfig {
    /// `tracing` filter directive used when `CHATSTREAM_LOG` is unset.
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "warn".to_string(),
        }
    }
}

impl Config {
    /// Load from the user config path, falling back to defaults.
    pub fn load_or_default() -> Self {
        Self::load_from(&config_path())
    }

    /// Load from `path`.
    ///
    /// A missing or unreadable file yields the defaults. A file that fails to
    /// parse prints a warning to stderr and also yields the defaults.
    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => toml::from_str(&contents).unwrap_or_else(|e| {
                // Logging is not initialized yet; it depends on this config.
                eprintln!("warning: failed to parse {}: {e}", path.display());
                Config::default()
            }),
            Err(_) => Config::default(),
        }
    }

    pub fn base_url(&self) -> String {
        self.server
            .resolve_base_url(std::env::var(API_URL_ENV).ok())
    }
}

pub fn config_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("chatstream").join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use cs_backend::TokenProvider;
    use std::io::Write;

    #[test]
    fn default_config() {
        let cfg = Config::default();
        assert_eq!(cfg.server.base_url, "http://localhost:5000/api");
        assert_eq!(cfg.server.request_timeout_secs, 120);
        assert_eq!(cfg.auth.token_env, "CHATSTREAM_TOKEN");
        assert_eq!(cfg.log.filter, "warn");
    }

    #[test]
    fn parse_empty_toml() {
        let cfg: Config = toml::from_str("").unwrap();
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn parse_server_config() {
        let toml_str = r#"
[server]
base_url = "http://192.168.1.20:5000/api"
request_timeout_secs = 60
"#;
        let cfg: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.server.base_url, "http://192.168.1.20:5000/api");
        assert_eq!(cfg.server.request_timeout_secs, 60);
        assert_eq!(cfg.server.connect_timeout_secs, 10);
    }

    #[test]
    fn parse_auth_and_log_config() {
        let toml_str = r#"
[auth]
token_file = "/tmp/chatstream-token"
token_env = "PLANT_TOKEN"

[log]
filter = "cs_backend=debug"
"#;
        let cfg: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.auth.token_file.as_deref(), Some("/tmp/chatstream-token"));
        assert_eq!(cfg.auth.token_cmd, None);
        assert_eq!(cfg.auth.token_env, "PLANT_TOKEN");
        assert_eq!(cfg.log.filter, "cs_backend=debug");
    }

    #[test]
    fn base_url_override() {
        let server = ServerConfig::default();
        assert_eq!(
            server.resolve_base_url(Some("https://plants.example/api".to_string())),
            "https://plants.example/api"
        );
        assert_eq!(server.resolve_base_url(Some("  ".to_string())), DEFAULT_BASE_URL);
        assert_eq!(server.resolve_base_url(None), DEFAULT_BASE_URL);
    }

    #[test]
    fn client_options_from_seconds() {
        let server = ServerConfig {
            request_timeout_secs: 30,
            connect_timeout_secs: 2,
            ..Default::default()
        };
        let options = server.client_options();
        assert_eq!(options.request_timeout, Duration::from_secs(30));
        assert_eq!(options.connect_timeout, Duration::from_secs(2));
    }

    #[test]
    fn token_command_takes_priority() {
        let auth = AuthConfig {
            token_cmd: Some("echo from_cmd".to_string()),
            token_file: Some("/nonexistent/token".to_string()),
            token_env: "CHATSTREAM_TEST_UNSET_TOKEN_VAR".to_string(),
        };
        assert_eq!(auth.token_provider().token().as_deref(), Some("from_cmd"));
    }

    #[test]
    fn token_file_used_when_no_command() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "file-token").unwrap();

        let auth = AuthConfig {
            token_cmd: None,
            token_file: Some(file.path().to_string_lossy().into_owned()),
            token_env: "CHATSTREAM_TEST_UNSET_TOKEN_VAR".to_string(),
        };
        assert_eq!(auth.token_provider().token().as_deref(), Some("file-token"));
    }

    #[test]
    fn load_from_invalid_file_falls_back() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server\nbase_url = ").unwrap();
        assert_eq!(Config::load_from(file.path()), Config::default());
    }

    #[test]
    fn load_from_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(Config::load_from(&dir.path().join("config.toml")), Config::default());
    }

    #[test]
    fn config_path_ends_with_app_dir() {
        let path = config_path();
        assert!(path.to_string_lossy().ends_with("chatstream/config.toml"));
    }
}
