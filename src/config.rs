//! Configuration file handling.
//!
//! The configuration file is stored at `$EXPENSES_HOME/config.json` and holds the address of the
//! hosted database, its public API key, and the location of the session file.

use crate::{utils, Result};
use anyhow::{bail, ensure, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

const APP_NAME: &str = "expenses";
const CONFIG_VERSION: u8 = 1;
const SECRETS: &str = ".secrets";
const SESSION_JSON: &str = "session.json";
const CONFIG_JSON: &str = "config.json";

/// The `Config` object represents the configuration of the app. You instantiate it by providing
/// the path to `$EXPENSES_HOME` and from there it loads `$EXPENSES_HOME/config.json`. It provides
/// paths to other items that are either configurable or are expected in a certain location within
/// the home directory.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    secrets: PathBuf,
    config_file: ConfigFile,
    api_url: Url,
}

impl Config {
    /// Creates the home directory, its `.secrets` subdirectory, and an initial `config.json`.
    ///
    /// # Arguments
    /// - `dir` - The directory that will be the root of the home directory, e.g. `$HOME/expenses`
    /// - `api_url` - The base URL of the hosted database project, e.g. `https://abc.supabase.co`
    /// - `api_key` - The project's public (anon) API key
    ///
    /// # Errors
    /// - Returns an error if `api_url` is not an http(s) URL or if any file operations fail.
    pub async fn create(dir: impl Into<PathBuf>, api_url: &str, api_key: &str) -> Result<Self> {
        let api_url = parse_api_url(api_url)?;
        let api_key = api_key.trim();
        ensure!(!api_key.is_empty(), "The API key must not be empty");

        let maybe_relative = dir.into();
        utils::make_dir(&maybe_relative)
            .await
            .context("Unable to create the expenses home directory")?;
        let root = utils::canonicalize(&maybe_relative).await?;

        let secrets_dir = root.join(SECRETS);
        utils::make_dir(&secrets_dir).await?;
        let config_path = root.join(CONFIG_JSON);

        let config_file = ConfigFile {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            api_url: api_url.to_string(),
            api_key: api_key.to_string(),
            session_path: None,
        };
        config_file.save(&config_path).await?;

        Ok(Self {
            root,
            secrets: secrets_dir,
            config_file,
            api_url,
        })
    }

    /// This will
    /// - validate that the home directory and the config file exist
    /// - load the config file
    /// - validate that the secrets directory exists
    /// - return the loaded configuration object
    pub async fn load(home: impl Into<PathBuf>) -> Result<Self> {
        let maybe_relative = home.into();
        let root = utils::canonicalize(&maybe_relative)
            .await
            .context("The expenses home directory is missing. Run 'expenses init' first.")?;

        let config_path = root.join(CONFIG_JSON);
        if !config_path.is_file() {
            bail!("The config file is missing '{}'", config_path.display())
        }
        let config_file = ConfigFile::load(&config_path).await?;
        let api_url = parse_api_url(&config_file.api_url)
            .with_context(|| format!("Bad api_url in '{}'", config_path.display()))?;

        let config = Self {
            root: root.clone(),
            secrets: root.join(SECRETS),
            config_file,
            api_url,
        };
        if !config.secrets.is_dir() {
            bail!(
                "The secrets directory is missing '{}'",
                config.secrets.display()
            )
        }
        Ok(config)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    #[cfg(test)]
    pub(crate) fn config_path(&self) -> PathBuf {
        self.root.join(CONFIG_JSON)
    }

    #[cfg(test)]
    pub(crate) fn secrets(&self) -> &Path {
        &self.secrets
    }

    /// The base URL of the hosted database, always ending in `/`.
    pub fn api_url(&self) -> &Url {
        &self.api_url
    }

    pub fn api_key(&self) -> &str {
        &self.config_file.api_key
    }

    /// Returns the stored `session_path` if it is absolute, otherwise resolves it against the
    /// home directory.
    pub fn session_path(&self) -> PathBuf {
        let p = self.config_file.session_path();
        if p.is_absolute() {
            return p;
        }
        self.root.join(p)
    }
}

/// Represents the serialization and deserialization format of the configuration file.
///
/// Example configuration:
/// ```json
/// {
///   "app_name": "expenses",
///   "config_version": 1,
///   "api_url": "https://abcdefgh.supabase.co/",
///   "api_key": "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...",
///   "session_path": ".secrets/session.json"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
struct ConfigFile {
    /// Application name, should always be "expenses"
    app_name: String,

    /// Configuration file version
    config_version: u8,

    /// Base URL of the hosted database project
    api_url: String,

    /// The project's public API key, sent as the `apikey` header
    api_key: String,

    /// Path to the session file (optional, relative to the home directory or absolute)
    /// Defaults to $EXPENSES_HOME/.secrets/session.json if not specified
    #[serde(default, skip_serializing_if = "Option::is_none")]
    session_path: Option<PathBuf>,
}

impl ConfigFile {
    /// Loads a ConfigFile from `path` and checks its `app_name`.
    async fn load(path: &Path) -> Result<Self> {
        let config: ConfigFile = utils::deserialize(path).await?;
        ensure!(
            config.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{}', got '{}'",
            APP_NAME,
            config.app_name
        );
        Ok(config)
    }

    async fn save(&self, path: &Path) -> Result<()> {
        let data = serde_json::to_string_pretty(self).context("Unable to serialize config")?;
        utils::write(path, data)
            .await
            .context("Unable to write config file")
    }

    fn session_path(&self) -> PathBuf {
        self.session_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(SECRETS).join(SESSION_JSON))
    }
}

/// Parses the base URL of the hosted database. Only `http` and `https` are accepted, and a
/// trailing `/` is added so that relative paths join beneath it.
fn parse_api_url(s: &str) -> Result<Url> {
    let trimmed = s.trim();
    let mut url =
        Url::parse(trimmed).with_context(|| format!("'{trimmed}' is not a valid URL"))?;
    ensure!(
        matches!(url.scheme(), "http" | "https"),
        "The API URL must use http or https, got '{}'",
        url.scheme()
    );
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}
