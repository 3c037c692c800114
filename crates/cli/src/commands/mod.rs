//! Command handlers.
//!
//! Every command runs against a [`session::Session`] opened from the saved
//! session file and the backend configuration.

use thiserror::Error;

use tutaviendo_admin::config::ConfigError;
use tutaviendo_admin::supabase::SupabaseError;
use tutaviendo_admin::SessionError;

pub mod auth;
pub mod payments;
pub mod session;
pub mod stores;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Backend configuration is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The backend client could not be built.
    #[error("Backend error: {0}")]
    Backend(#[from] SupabaseError),

    /// A session operation failed.
    #[error("{0}")]
    Session(#[from] SessionError),

    /// The session file could not be read or written.
    #[error("Session file error: {0}")]
    Io(#[from] std::io::Error),

    /// The session file is not valid JSON.
    #[error("Invalid session file: {0}")]
    SessionFile(#[from] serde_json::Error),

    /// The command needs a signed-in user.
    #[error("Not signed in. Run `tv-cli login` first.")]
    NotSignedIn,

    /// The command needs a current store.
    #[error("No store selected")]
    NoStore,

    /// Local input validation failed.
    #[error("Invalid input: {0}")]
    Invalid(String),

    /// The backend refused the request.
    #[error("{0}")]
    Rejected(String),
}
