//! Configuration management for the Good Points CLI.

use anyhow::{Context, Result};
use goodpoints::{FileSessionStore, GoodPointsClient};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// CLI configuration.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// API base URL; the library default when unset.
    pub base_url: Option<String>,
    /// Authentication credentials.
    pub auth: Option<AuthConfig>,
}

/// Authentication configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Bearer token.
    pub token: String,
}

fn exe_dir() -> Result<PathBuf> {
    let exe_path = env::current_exe().context("Could not determine executable path")?;
    let exe_dir = exe_path
        .parent()
        .context("Could not determine executable directory")?;

    Ok(exe_dir.to_path_buf())
}

/// Get the configuration file path.
pub fn config_path() -> Result<PathBuf> {
    Ok(exe_dir()?.join("goodpoints.toml"))
}

/// Get the path of the file standing in for browser session storage.
pub fn session_path() -> Result<PathBuf> {
    Ok(exe_dir()?.join("goodpoints-session.json"))
}

/// Load configuration from file.
pub fn load_config() -> Result<Config> {
    load_config_from(&config_path()?)
}

fn load_config_from(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }

    let content = fs::read_to_string(path).context("Failed to read config file")?;

    toml::from_str(&content).context("Failed to parse config file")
}

/// Save configuration to file.
pub fn save_config(config: &Config) -> Result<()> {
    let path = config_path()?;
    let content = toml::to_string_pretty(config).context("Failed to serialize config")?;

    fs::write(&path, content).context("Failed to write config file")?;

    Ok(())
}

/// Build a client that requires authentication.
pub fn build_authed_client() -> Result<GoodPointsClient> {
    let config = load_config()?;

    let auth = config
        .auth
        .context("Authentication required. Run 'goodpoints auth login' first.")?;

    let mut builder = GoodPointsClient::builder().auth(auth.token);
    if let Some(url) = config.base_url {
        builder = builder.base_url(url);
    }

    builder.build().context("Failed to build Good Points client")
}

/// Session store shared by every invocation, so a group draft outlives the process.
pub fn session_store() -> Result<FileSessionStore> {
    Ok(FileSessionStore::new(session_path()?))
}
