//! The boundary with the remote store that owns the expense data.
//!
//! Everything the dashboard reads or writes goes through the `Store` trait. `RestStore` talks to
//! the hosted database over HTTP and `TestStore` keeps everything in memory so that the program
//! can run top-to-bottom without a network.

mod rest;
mod test_store;

use crate::model::{Amount, CategoryTotal, Expense, User};
use crate::session::Session;
use crate::window::DateWindow;
use crate::{Config, Result};
use chrono::NaiveDate;
use uuid::Uuid;

pub(crate) use rest::RestStore;
pub(crate) use test_store::TestStore;
#[cfg(test)]
pub(crate) use test_store::Operation;

/// The environment variable that switches the program onto `TestStore`.
const TEST_MODE_ENV: &str = "EXPENSES_IN_TEST_MODE";

/// Reads and writes the expense data held by the remote store.
///
/// Methods take `&self` so that the month's three queries can be in flight at the same time.
#[async_trait::async_trait]
pub(crate) trait Store: Send + Sync {
    /// Expenses dated on or after `since`, newest first.
    async fn expenses_since(&self, since: NaiveDate) -> Result<Vec<Expense>>;

    /// The sum of expenses per category, for expenses dated on or after `since`.
    async fn totals_by_type(&self, since: NaiveDate) -> Result<Vec<CategoryTotal>>;

    /// The sum of all expenses dated on or after `since`. `None` when there is nothing to sum.
    async fn sum_since(&self, since: NaiveDate) -> Result<Option<Amount>>;

    /// Stores a single expense. The expense must carry its owner's uid.
    async fn insert_expense(&self, expense: &Expense) -> Result<()>;

    /// The provisioning row for `uid`, if one exists.
    async fn user(&self, uid: Uuid) -> Result<Option<User>>;

    /// Creates the provisioning row for a user.
    async fn insert_user(&self, user: &User) -> Result<()>;
}

/// Selects which `Store` implementation the program uses.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq)]
pub enum Mode {
    /// Use the hosted database.
    #[default]
    Remote,
    /// Use in-memory seed data.
    Test,
}

impl Mode {
    /// `Mode::Test` when `EXPENSES_IN_TEST_MODE` is set and non-empty, otherwise `Mode::Remote`.
    pub fn from_env() -> Self {
        match std::env::var(TEST_MODE_ENV) {
            Ok(value) if !value.is_empty() => Mode::Test,
            _ => Mode::Remote,
        }
    }
}

/// Creates the `Store` for `mode`.
pub(crate) fn store(config: &Config, session: &Session, mode: Mode) -> Result<Box<dyn Store>> {
    match mode {
        Mode::Remote => Ok(Box::new(RestStore::new(config, session)?)),
        Mode::Test => Ok(Box::new(TestStore::seeded(
            session.user_id(),
            DateWindow::now().today(),
        )?)),
    }
}
