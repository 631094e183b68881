use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server_url: String,
    pub email: Option<String>,
    pub password: Option<String>,
    /// How long a cached list stays fresh.
    pub stale_secs: u64,
    /// Retry failed GETs once.
    pub retry: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:8080".to_string(),
            email: None,
            password: None,
            stale_secs: 30,
            retry: true,
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read client config '{}'", path))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("failed to parse client config '{}'", path))?;
        Ok(config)
    }

    /// Reads `path` when it exists, otherwise falls back to defaults.
    pub fn load_or_default(path: &str) -> Result<Self> {
        if fs::metadata(path).is_ok() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn stale_time(&self) -> Duration {
        Duration::from_secs(self.stale_secs)
    }

    pub fn default_template() -> &'static str {
        r#"server_url = "http://127.0.0.1:8080"
# email = "admin@university.edu"
# password = "change-me"
stale_secs = 30
retry = true
"#
    }
}
