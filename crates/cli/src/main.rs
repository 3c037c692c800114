//! Tutaviendo CLI - Drive the admin session from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # Sign in (the password can also come from TUTAVIENDO_PASSWORD)
//! tv-cli login -e ana@tienda.com -p secreto1
//!
//! # Create an account
//! tv-cli register -e ana@tienda.com -n "Ana Lucía" -p secreto1
//!
//! # Show the signed-in user, plan and current store
//! tv-cli whoami
//!
//! # List stores and switch the current one
//! tv-cli stores list
//! tv-cli stores select 6f1c1c5e-8a47-4d8e-9b8a-2f9b4a7c3d10
//!
//! # Payment and shipping settings of the current store
//! tv-cli payments show
//! tv-cli payments set --cash true --delivery true --delivery-cost 5
//!
//! # Sign out
//! tv-cli logout
//! ```
//!
//! # Environment Variables
//!
//! - `BACKEND_URL`, `BACKEND_ANON_KEY` - Hosted backend (required)
//! - `TUTAVIENDO_HOME` - Directory of the session file (default `~/.tutaviendo`)
//! - `LOG_FORMAT=json` - Structured log output
//! - `SENTRY_DSN` - Error reporting (optional)

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tutaviendo_admin::AdminConfig;
use tutaviendo_core::StoreId;

mod commands;

use commands::CommandError;
use commands::payments::PaymentArgs;
use commands::session::Session;

#[derive(Parser)]
#[command(name = "tv-cli")]
#[command(author, version, about = "Tutaviendo admin CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in with email and password
    Login {
        /// Account email address
        #[arg(short, long)]
        email: String,

        /// Account password
        #[arg(short, long, env = "TUTAVIENDO_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account and sign in
    Register {
        /// Account email address
        #[arg(short, long)]
        email: String,

        /// Display name
        #[arg(short, long)]
        name: String,

        /// Account password (at least 6 characters)
        #[arg(short, long, env = "TUTAVIENDO_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Sign out and forget the saved session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Manage the user's stores
    Stores {
        #[command(subcommand)]
        action: StoresAction,
    },
    /// Payment and shipping settings of the current store
    Payments {
        #[command(subcommand)]
        action: PaymentsAction,
    },
}

#[derive(Subcommand)]
enum StoresAction {
    /// List the stores owned by the signed-in user
    List,
    /// Make a store the current one
    Select {
        /// Store ID
        store_id: StoreId,
    },
}

#[derive(Subcommand)]
enum PaymentsAction {
    /// Show the active payment and shipping methods
    Show,
    /// Change payment and shipping settings
    Set(PaymentArgs),
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &AdminConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            sample_rate: config.sentry_sample_rate,
            traces_sample_rate: config.sentry_traces_sample_rate,
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "tutaviendo_admin=info,tutaviendo_cli=info".into());

    let is_json = std::env::var("LOG_FORMAT").is_ok_and(|format| format == "json");
    let json_layer = is_json.then(|| tracing_subscriber::fmt::layer().json().flatten_event(true));
    let text_layer = (!is_json).then(|| tracing_subscriber::fmt::layer().without_time());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Sentry must be initialized before the tracing subscriber
    let config = AdminConfig::from_env();
    let _sentry_guard = config.as_ref().ok().and_then(init_sentry);
    init_tracing();

    let config = match config {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Configuration error: {e}");
            return ExitCode::FAILURE;
        }
    };

    match run(cli, &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Command failed: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, config: &AdminConfig) -> Result<(), CommandError> {
    let session = Session::open(config).await?;

    // The restore may have rotated the refresh token, so save even on failure
    let result = execute(cli.command, &session).await;
    let saved = session.save().await;
    result.and(saved)
}

async fn execute(command: Commands, session: &Session) -> Result<(), CommandError> {
    match command {
        Commands::Login { email, password } => {
            commands::auth::login(session, &email, &password).await?;
        }
        Commands::Register {
            email,
            name,
            password,
        } => commands::auth::register(session, &email, &password, &name).await?,
        Commands::Logout => commands::auth::logout(session).await,
        Commands::Whoami => commands::auth::whoami(session)?,
        Commands::Stores { action } => match action {
            StoresAction::List => commands::stores::list(session)?,
            StoresAction::Select { store_id } => commands::stores::select(session, store_id)?,
        },
        Commands::Payments { action } => match action {
            PaymentsAction::Show => commands::payments::show(session)?,
            PaymentsAction::Set(args) => commands::payments::set(session, args).await?,
        },
    }
    Ok(())
}
