//! Session command handlers.
//!
//! This module implements the CLI commands for:
//! - `expenses auth` - Save an access token and register the user
//! - `expenses auth --verify` - Check the saved session against the user's row

use crate::api::{self, Mode, Store};
use crate::commands::Out;
use crate::session::{self, Access, Session};
use crate::{Config, Result};
use anyhow::Context;
use tracing::debug;
use uuid::Uuid;

/// Handles the `expenses auth` command.
///
/// Saves the session to the configured session path, then looks up the user's row. A user who has
/// never been seen is registered, pending approval.
///
/// # Errors
/// Returns an error if the session cannot be saved or the store cannot be reached.
pub async fn auth(
    config: &Config,
    mode: Mode,
    access_token: &str,
    user_id: Uuid,
) -> Result<Out<Uuid>> {
    let session = Session::new(access_token, user_id)?;
    let path = config.session_path();
    if let Some(parent) = path.parent() {
        crate::utils::make_dir(parent).await?;
    }
    session
        .save(&path)
        .await
        .context("Unable to save the session")?;
    debug!("Saved the session to {}", path.display());

    let store = api::store(config, &session, mode)?;
    register(store.as_ref(), &session).await
}

/// Handles the `expenses auth --verify` command.
///
/// Never changes anything: a user without a row is told to run `expenses auth`.
pub async fn auth_verify(config: &Config, mode: Mode) -> Result<Out<Uuid>> {
    let session = Session::load(&config.session_path()).await?;
    let store = api::store(config, &session, mode)?;
    let access = session::verify(store.as_ref(), &session).await?;
    Ok(describe(access))
}

async fn register(store: &dyn Store, session: &Session) -> Result<Out<Uuid>> {
    let access = session::authorize(store, session).await?;
    Ok(describe(access))
}

fn describe(access: Access) -> Out<Uuid> {
    match access {
        Access::Authorized(identity) => Out::new(
            format!("You are signed in and approved ({})", identity.uid()),
            identity.uid(),
        ),
        Access::Pending(uid) => Out::new(
            format!("You are signed in, but your account ({uid}) has not been approved yet"),
            uid,
        ),
        Access::Provisioned(uid) => Out::new(
            format!(
                "You are signed in. Your account ({uid}) has been registered and is waiting for \
                approval"
            ),
            uid,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::TestStore;
    use crate::model::User;
    use crate::test::TestEnv;

    #[tokio::test]
    async fn test_register_new_user() {
        let env = TestEnv::new().await;
        let store = TestStore::new(vec![], vec![]);
        let out = register(&store, &env.session()).await.unwrap();
        assert!(out.message().contains("registered"));
        assert_eq!(out.structure(), Some(&env.uid()));
        assert_eq!(
            store.users(),
            vec![User {
                uid: env.uid(),
                valid: false
            }]
        );
    }

    #[tokio::test]
    async fn test_register_approved_user() {
        let env = TestEnv::new().await;
        let store = env.store_with(vec![], true);
        let out = register(&store, &env.session()).await.unwrap();
        assert!(out.message().contains("approved"));
        assert_eq!(store.users().len(), 1);
    }

    #[tokio::test]
    async fn test_auth_saves_session() {
        let env = TestEnv::new().await;
        let uid = Uuid::new_v4();
        let out = auth(&env.config(), Mode::Test, "fresh-token", uid)
            .await
            .unwrap();
        assert_eq!(out.structure(), Some(&uid));

        let saved = Session::load(&env.config().session_path()).await.unwrap();
        assert_eq!(saved.access_token(), "fresh-token");
        assert_eq!(saved.user_id(), uid);
    }

    #[tokio::test]
    async fn test_auth_verify() {
        let env = TestEnv::new().await;
        let out = auth_verify(&env.config(), Mode::Test).await.unwrap();
        assert_eq!(out.structure(), Some(&env.uid()));
    }
}
