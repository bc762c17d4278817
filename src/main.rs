use clap::Parser;
use expense_dash::args::{Args, Command};
use expense_dash::{commands, Config, Mode, Result};
use std::process::ExitCode;
use tracing::{debug, error, trace};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let log_level = args.common().log_level();
    init_logger(log_level);
    debug!("Log level set to {}", log_level.to_string().to_lowercase());

    match main_inner(args).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Exiting with error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

pub async fn main_inner(args: Args) -> Result<()> {
    trace!("{args:?}");
    let home = args.common().expenses_home().path();

    // This allows for running the program without a network connection. When
    // EXPENSES_IN_TEST_MODE is set and non-zero in length, then the mode will be Mode::Test,
    // otherwise it will be Mode::Remote.
    let mode = Mode::from_env();

    // Route to appropriate command handler
    let _: () = match args.command() {
        Command::Init(init_args) => commands::init(home, init_args.api_url(), init_args.api_key())
            .await?
            .print(),

        Command::Auth(auth_args) => {
            let config = Config::load(home).await?;
            match (auth_args.verify(), auth_args.access_token(), auth_args.user_id()) {
                (false, Some(token), Some(user_id)) => {
                    commands::auth(&config, mode, token, user_id).await?.print()
                }
                _ => commands::auth_verify(&config, mode).await?.print(),
            }
        }

        Command::Show => {
            let out = commands::show(Config::load(home).await?, mode).await?;
            out.print();
            if let Some(dashboard) = out.structure() {
                dashboard.ensure_complete()?;
            }
        }

        Command::Add(add_args) => {
            let config = Config::load(home).await?;
            let out = commands::add(config, mode, add_args.clone()).await?;
            out.print();
            if let Some(dashboard) = out.structure() {
                dashboard.ensure_complete()?;
            }
        }
    };
    Ok(())
}

/// Initializes the tracing subscriber.
pub fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => {
            // RUST_LOG exists; use it.
            EnvFilter::from_default_env()
        }
        None => {
            // RUST_LOG does not exist; use default log level for this crate only.
            EnvFilter::new(format!(
                "{}={},{}={}",
                env!("CARGO_CRATE_NAME"),
                level,
                "expense_dash",
                level
            ))
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
