//! Command handlers for the expenses CLI.
//!
//! This module contains implementations for all CLI subcommands.

mod add;
mod auth;
mod init;
mod month;
mod show;

use crate::api::{self, Mode, Store};
use crate::session::{self, Access, Identity, Session};
use crate::{Config, Result};
use anyhow::bail;
use serde::Serialize;
use std::fmt::Debug;
use tracing::{debug, info};

pub use add::add;
pub use auth::{auth, auth_verify};
pub use init::init;
pub use show::{show, Dashboard};

/// The output type for a command. This allows the command to return a consistent message and,
/// optionally, structured data.
#[derive(Debug, Clone, Serialize)]
pub struct Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// A message that can be printed to the user regarding the outcome of the command execution.
    message: String,

    /// Any structured data that needs to be output from the call.
    structure: Option<T>,
}

impl<T, S> From<S> for Out<T>
where
    T: Debug + Clone + Serialize,
    S: Into<String>,
{
    fn from(value: S) -> Self {
        Out::new_message(value)
    }
}

impl<T> Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// Create a new `Out` object that has `Some(structure)`.
    pub fn new<S>(message: S, structure: T) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: Some(structure),
        }
    }

    /// Create a new `Out` object that has `None` for `structure`.
    pub fn new_message<S>(message: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: None,
        }
    }

    /// Get the `message`.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the structured data stored in `structure`.
    pub fn structure(&self) -> Option<&T> {
        self.structure.as_ref()
    }

    /// Print the message to `info!` and the structured data (if it exists) as JSON to `debug!`.
    pub fn print(&self) {
        info!("{}", self.message);
        if let Some(structure) = self.structure() {
            if let Ok(json) = serde_json::to_string_pretty(structure) {
                debug!("Command output:\n\n{json}\n\n");
            }
        }
    }
}

/// Loads the saved session and creates the store for `mode`.
async fn connect(config: &Config, mode: Mode) -> Result<(Session, Box<dyn Store>)> {
    let session = Session::load(&config.session_path()).await?;
    let store = api::store(config, &session, mode)?;
    Ok((session, store))
}

/// Returns the identity for `session`, or an error explaining why the user may not continue.
async fn require_identity(store: &dyn Store, session: &Session) -> Result<Identity> {
    match session::authorize(store, session).await? {
        Access::Authorized(identity) => Ok(identity),
        Access::Pending(uid) => {
            bail!("Your account ({uid}) has not been approved yet")
        }
        Access::Provisioned(uid) => {
            bail!("Your account ({uid}) has been registered and is waiting for approval")
        }
    }
}
