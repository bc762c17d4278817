use crate::commands::Out;
use crate::{Config, Result};
use anyhow::Context;
use std::path::Path;

/// Creates the data directory, its `.secrets` subdirectory and an initial `config.json`.
///
/// # Arguments
/// - `home` - The directory that will be the root of the data directory, e.g. `$HOME/expenses`
/// - `api_url` - The base URL of the hosted database project
/// - `api_key` - The project's public API key
///
/// # Errors
/// - Returns an error if the URL is not http(s) or if any file operations fail.
pub async fn init(home: &Path, api_url: &str, api_key: &str) -> Result<Out<()>> {
    let config = Config::create(home, api_url, api_key)
        .await
        .context("Unable to create the data directory and configs")?;
    Ok(format!(
        "Successfully created the expenses directory at {}. Run 'expenses auth' next.",
        config.root().display()
    )
    .into())
}
