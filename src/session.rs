//! The signed-in user, as far as this program is concerned: an access token issued by the
//! identity provider and the user's id. Obtaining the token is the identity provider's business;
//! this module only stores it and checks that the user has been provisioned.

use crate::api::Store;
use crate::model::User;
use crate::{utils, Result};
use anyhow::{ensure, Context};
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Formatter};
use std::path::Path;
use tracing::{debug, info};
use uuid::Uuid;

/// The contents of `session.json`.
#[derive(Clone, Eq, PartialEq, Serialize, Deserialize)]
pub(crate) struct Session {
    access_token: String,
    user_id: Uuid,
}

impl Debug for Session {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &"<redacted>")
            .field("user_id", &self.user_id)
            .finish()
    }
}

impl Session {
    pub(crate) fn new(access_token: impl Into<String>, user_id: Uuid) -> Result<Self> {
        let access_token = access_token.into().trim().to_string();
        ensure!(!access_token.is_empty(), "The access token must not be empty");
        Ok(Self {
            access_token,
            user_id,
        })
    }

    /// Loads the session file at `path`.
    pub(crate) async fn load(path: &Path) -> Result<Self> {
        ensure!(
            path.is_file(),
            "No session found at '{}'. Run 'expenses auth' first.",
            path.display()
        );
        let session: Session = utils::deserialize(path).await?;
        ensure!(
            !session.access_token.is_empty(),
            "The session file at '{}' has an empty access token",
            path.display()
        );
        Ok(session)
    }

    /// Saves the session to `path`, readable only by the owner.
    pub(crate) async fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("Failed to serialize the session")?;
        utils::write(path, json).await?;
        utils::restrict_permissions(path)?;
        debug!("Session saved to {}", path.display());
        Ok(())
    }

    pub(crate) fn access_token(&self) -> &str {
        &self.access_token
    }

    pub(crate) fn user_id(&self) -> Uuid {
        self.user_id
    }
}

/// A user who is allowed to see the dashboard.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub(crate) struct Identity {
    uid: Uuid,
}

impl Identity {
    pub(crate) fn uid(&self) -> Uuid {
        self.uid
    }
}

/// The outcome of checking a session against the store's user rows.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub(crate) enum Access {
    Authorized(Identity),
    /// The user exists but has not been marked valid.
    Pending(Uuid),
    /// No user row existed; one has now been created, not yet valid.
    Provisioned(Uuid),
}

/// Looks up the user row for `session`. A user without a row gets one, marked not valid, so that
/// the account can be approved later.
pub(crate) async fn authorize(store: &dyn Store, session: &Session) -> Result<Access> {
    let uid = session.user_id();
    match store.user(uid).await.context("Unable to look up the user")? {
        Some(User { valid: true, .. }) => Ok(Access::Authorized(Identity { uid })),
        Some(User { valid: false, .. }) => Ok(Access::Pending(uid)),
        None => {
            info!("No user row found for {uid}, creating one");
            store
                .insert_user(&User { uid, valid: false })
                .await
                .context("Unable to create the user row")?;
            Ok(Access::Provisioned(uid))
        }
    }
}

/// Checks the store's user row for `session` without creating anything.
pub(crate) async fn verify(store: &dyn Store, session: &Session) -> Result<Access> {
    let uid = session.user_id();
    match store.user(uid).await.context("Unable to look up the user")? {
        Some(User { valid: true, .. }) => Ok(Access::Authorized(Identity { uid })),
        Some(User { valid: false, .. }) => Ok(Access::Pending(uid)),
        None => anyhow::bail!("No user row exists for {uid}. Run 'expenses auth' first."),
    }
}
