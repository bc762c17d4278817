//! These structs provide the CLI interface for the expenses CLI.

use clap::{Parser, Subcommand};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing_subscriber::filter::LevelFilter;

/// expenses: A month-to-date dashboard for your personal spending.
///
/// Your expenses live in a hosted database. This program fetches the current month's expenses,
/// their per-category totals and their grand total, and shows them together with a few derived
/// figures: your average daily spend and a projection for the whole month. New expenses can be
/// added from the command line.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the data directory and the configuration file.
    ///
    /// This is the first command you should run. You need the base URL of your hosted database
    /// project and its public API key. The data directory defaults to $HOME/expenses; pass
    /// --expenses-home if you want it somewhere else.
    Init(InitArgs),
    /// Save your session and check that your account has been approved.
    ///
    /// Sign in with your identity provider, then pass the access token and user id it gives you.
    /// The first time an account is seen it is registered, but it stays pending until approved.
    Auth(AuthArgs),
    /// Show this month's totals by category, statistics, and expenses.
    Show,
    /// Add an expense and show the updated dashboard.
    Add(AddArgs),
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where configuration and the session are held. Defaults to ~/expenses
    #[arg(long, env = "EXPENSES_HOME", default_value_t = default_expenses_home())]
    expenses_home: DisplayPath,
}

impl Common {
    pub fn new(log_level: LevelFilter, expenses_home: PathBuf) -> Self {
        Self {
            log_level,
            expenses_home: expenses_home.into(),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn expenses_home(&self) -> &DisplayPath {
        &self.expenses_home
    }
}

/// Arguments for `expenses init`.
#[derive(Debug, Parser, Clone)]
pub struct InitArgs {
    /// The base URL of your hosted database project, e.g. https://abcdefgh.supabase.co
    #[arg(long)]
    api_url: String,

    /// The project's public API key.
    #[arg(long)]
    api_key: String,
}

impl InitArgs {
    pub fn new(api_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            api_key: api_key.into(),
        }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }
}

/// Arguments for `expenses auth`.
#[derive(Debug, Parser, Clone)]
pub struct AuthArgs {
    /// Check the saved session without changing anything.
    #[arg(long, conflicts_with_all = ["access_token", "user_id"])]
    verify: bool,

    /// The access token issued by the identity provider.
    #[arg(long, required_unless_present = "verify")]
    access_token: Option<String>,

    /// Your user id, as issued by the identity provider.
    #[arg(long, required_unless_present = "verify")]
    user_id: Option<uuid::Uuid>,
}

impl AuthArgs {
    pub fn new(verify: bool, access_token: Option<String>, user_id: Option<uuid::Uuid>) -> Self {
        Self {
            verify,
            access_token,
            user_id,
        }
    }

    pub fn verify(&self) -> bool {
        self.verify
    }

    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    pub fn user_id(&self) -> Option<uuid::Uuid> {
        self.user_id
    }
}

/// Arguments for `expenses add`.
///
/// Everything is taken as text and checked together, so that every problem is reported at once.
#[derive(Debug, Parser, Clone, Default)]
pub struct AddArgs {
    /// What the expense was for.
    #[arg(long)]
    name: Option<String>,

    /// One of: Rent, Groceries, Travel, Restaurants, Leisure, Errand (any case).
    #[arg(long = "type")]
    r#type: Option<String>,

    /// The amount spent, e.g. 12.50 or $1,200.00
    #[arg(long, allow_hyphen_values = true)]
    amount: Option<String>,

    /// The date of the expense, YYYY-MM-DD. Defaults to today.
    #[arg(long)]
    date: Option<String>,

    /// Optional notes.
    #[arg(long)]
    notes: Option<String>,
}

impl AddArgs {
    pub fn new(
        name: impl Into<String>,
        r#type: impl Into<String>,
        amount: impl Into<String>,
        date: Option<String>,
        notes: Option<String>,
    ) -> Self {
        Self {
            name: Some(name.into()),
            r#type: Some(r#type.into()),
            amount: Some(amount.into()),
            date,
            notes,
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn r#type(&self) -> Option<&str> {
        self.r#type.as_deref()
    }

    pub fn amount(&self) -> Option<&str> {
        self.amount.as_deref()
    }

    pub fn date(&self) -> Option<&str> {
        self.date.as_deref()
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }
}

fn default_expenses_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("expenses"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --expenses-home or EXPENSES_HOME instead of relying on the \
                default home directory. If you continue using the program right now, you may have \
                problems!",
            );
            PathBuf::from("expenses")
        }
    })
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn path(&self) -> &Path {
        &self.0
    }
}
