use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use url::Url;

pub const API_BASE_URL_ENV: &str = "API_BASE_URL";
pub const SESSION_FILE_ENV: &str = "PHISHCHECK_SESSION";

/// Base URL baked in at build time, if `API_BASE_URL` was set when compiling.
pub fn build_time_base_url() -> &'static str {
    option_env!("API_BASE_URL").unwrap_or("http://localhost:8080")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_session_file")]
    pub session_file: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_api_base_url() -> String {
    build_time_base_url().to_string()
}

fn default_session_file() -> String {
    ".phishcheck/session.yaml".to_string()
}

fn default_user_agent() -> String {
    format!("phishcheck/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_base_url: default_api_base_url(),
            session_file: default_session_file(),
            user_agent: default_user_agent(),
        }
    }
}

impl Config {
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {path}"))?;
        Ok(config)
    }

    pub fn to_file(&self, path: &str) -> anyhow::Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Apply runtime overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_overrides(
            std::env::var(API_BASE_URL_ENV).ok(),
            std::env::var(SESSION_FILE_ENV).ok(),
        );
    }

    pub fn apply_overrides(&mut self, api_base_url: Option<String>, session_file: Option<String>) {
        if let Some(url) = api_base_url.filter(|u| !u.trim().is_empty()) {
            log::debug!("Using API base URL override: {url}");
            self.api_base_url = url.trim().to_string();
        }
        if let Some(path) = session_file.filter(|p| !p.trim().is_empty()) {
            self.session_file = path;
        }
    }

    pub fn base_url(&self) -> anyhow::Result<Url> {
        let url = Url::parse(&self.api_base_url)
            .with_context(|| format!("Invalid API base URL: {}", self.api_base_url))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            bail!(
                "API base URL must use http or https, got {}",
                self.api_base_url
            );
        }
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.api_base_url, build_time_base_url());
        assert_eq!(config.session_file, ".phishcheck/session.yaml");
        assert!(config.user_agent.starts_with("phishcheck/"));
        assert!(config.base_url().is_ok());
    }

    #[test]
    fn test_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("phishcheck.yaml");
        let path = path.to_str().unwrap();

        let mut config = Config::default();
        config.api_base_url = "https://scan.example.org".to_string();
        config.to_file(path).unwrap();

        assert_eq!(Config::from_file(path).unwrap(), config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("phishcheck.yaml");
        std::fs::write(&path, "api_base_url: http://10.0.0.5:9000\n").unwrap();

        let config = Config::from_file(path.to_str().unwrap()).unwrap();
        assert_eq!(config.api_base_url, "http://10.0.0.5:9000");
        assert_eq!(config.session_file, ".phishcheck/session.yaml");
    }

    #[test]
    fn test_overrides() {
        let mut config = Config::default();
        config.apply_overrides(Some("  ".to_string()), None);
        assert_eq!(config.api_base_url, build_time_base_url());

        config.apply_overrides(
            Some("https://api.example.net".to_string()),
            Some("/tmp/session.yaml".to_string()),
        );
        assert_eq!(config.api_base_url, "https://api.example.net");
        assert_eq!(config.session_file, "/tmp/session.yaml");
    }

    #[test]
    fn test_rejects_bad_base_url() {
        let mut config = Config::default();
        config.api_base_url = "not a url".to_string();
        assert!(config.base_url().is_err());

        config.api_base_url = "ftp://example.com".to_string();
        assert!(config.base_url().is_err());
    }
}
