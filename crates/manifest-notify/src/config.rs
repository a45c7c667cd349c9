use std::fmt;
use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

const DEFAULT_CONFIG_NAME: &str = "manifest-notify.toml";

pub const DEFAULT_SERVER_URL: &str = "https://intellinium.jetbrains.space";
pub const DEFAULT_CHANNEL_ID: &str = "3RHRvU3bsWEy";
pub const DEFAULT_FOLDER: &str = "ncs-itl/nrf";
pub const DEFAULT_BRANCH: &str = "master";

pub const CLIENT_ID_ENV: &str = "SPACE_CLIENT_ID";
pub const CLIENT_SECRET_ENV: &str = "SPACE_CLIENT_SECRET";

/// Deployment parameters. Every field has a built-in default, so an absent
/// config file is equivalent to an empty one.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub server_url: String,
    pub channel_id: String,
    /// Local checkout folder named in the instructions
    pub folder: String,
    /// Branch named in the dev channel instructions
    pub branch: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            channel_id: DEFAULT_CHANNEL_ID.to_string(),
            folder: DEFAULT_FOLDER.to_string(),
            branch: DEFAULT_BRANCH.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from an explicit path, or search upward from current dir.
    /// Falls back to the built-in defaults when no file is found.
    pub fn load(path_override: Option<PathBuf>) -> Result<Self> {
        let path = match path_override {
            Some(p) => p,
            None => match find_upwards(DEFAULT_CONFIG_NAME) {
                Some(p) => p,
                None => return Ok(Self::default()),
            },
        };

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Reading config file {}", path.display()))?;
        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Parsing TOML config {}", path.display()))?;
        Ok(cfg)
    }
}

/// Service-account credentials for the chat backend.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
    pub server_url: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("server_url", &self.server_url)
            .finish()
    }
}

impl Credentials {
    pub fn from_env(config: &Config) -> Result<Self> {
        Self::from_lookup(config, |key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(config: &Config, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| -> Result<String> {
            match lookup(key) {
                Some(v) if !v.trim().is_empty() => Ok(v),
                _ => bail!("{key} env var not set; service-account credentials are required"),
            }
        };
        Ok(Self {
            client_id: required(CLIENT_ID_ENV)?,
            client_secret: required(CLIENT_SECRET_ENV)?,
            server_url: config.server_url.clone(),
        })
    }
}

fn find_upwards(file_name: &str) -> Option<PathBuf> {
    let mut dir = std::env::current_dir().ok()?;
    loop {
        let candidate = dir.join(file_name);
        if candidate.exists() {
            return Some(candidate);
        }
        if !dir.pop() {
            break;
        }
    }
    None
}
