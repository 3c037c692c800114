//! Saved CLI session.
//!
//! The refresh token and the selected store survive between runs in
//! `$TUTAVIENDO_HOME/session.json` (default `~/.tutaviendo`).

use std::path::{Path, PathBuf};
use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use tutaviendo_admin::{AdminConfig, StoreContext, SupabaseClient};
use tutaviendo_core::StoreId;

use super::CommandError;

const SESSION_FILE: &str = "session.json";

/// On-disk session state.
#[derive(Debug, Default, Serialize, Deserialize)]
struct SessionFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    store_id: Option<StoreId>,
}

/// Directory holding the session file.
fn home_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("TUTAVIENDO_HOME") {
        return PathBuf::from(dir);
    }
    std::env::var_os("HOME").map_or_else(
        || PathBuf::from(".tutaviendo"),
        |home| Path::new(&home).join(".tutaviendo"),
    )
}

async fn read_session_file(path: &Path) -> Result<SessionFile, CommandError> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => Ok(serde_json::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(SessionFile::default()),
        Err(e) => Err(e.into()),
    }
}

async fn write_session_file(path: &Path, file: &SessionFile) -> Result<(), CommandError> {
    if file.refresh_token.is_none() {
        return match tokio::fs::remove_file(path).await {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        };
    }

    if let Some(dir) = path.parent() {
        tokio::fs::create_dir_all(dir).await?;
    }

    let mut options = tokio::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(0o600);
    let mut handle = options.open(path).await?;

    // The mode only applies on creation; tighten a file left by older runs
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        handle
            .set_permissions(std::fs::Permissions::from_mode(0o600))
            .await?;
    }

    handle.write_all(&serde_json::to_vec_pretty(file)?).await?;
    handle.flush().await?;
    Ok(())
}

/// An initialized session context plus the file it was restored from.
pub struct Session {
    pub context: StoreContext,
    client: SupabaseClient,
    path: PathBuf,
}

impl Session {
    /// Restore the saved session, if any, and initialize the context.
    ///
    /// # Errors
    ///
    /// Returns an error if the session file is unreadable or the backend
    /// client cannot be built. An expired or revoked session is not an
    /// error; the context simply starts signed out.
    pub async fn open(config: &AdminConfig) -> Result<Self, CommandError> {
        let client = SupabaseClient::new(&config.backend)?;
        Self::open_at(client, home_dir().join(SESSION_FILE)).await
    }

    async fn open_at(client: SupabaseClient, path: PathBuf) -> Result<Self, CommandError> {
        let file = read_session_file(&path).await?;
        if let Some(token) = file.refresh_token {
            client.set_refresh_token(SecretString::from(token)).await;
        }

        let context = StoreContext::with_backend(Arc::new(client.clone()));
        let state = context.initialize().await;
        debug!(authenticated = state.is_authenticated(), "Session restored");

        if let Some(store_id) = file.store_id.filter(|_| state.is_authenticated()) {
            if let Err(e) = context.select_store(store_id) {
                warn!(error = %e, "Saved store is no longer available");
            }
        }

        Ok(Self {
            context,
            client,
            path,
        })
    }

    /// Persist the current refresh token and store, or delete the file when
    /// signed out.
    ///
    /// # Errors
    ///
    /// Returns an error if the session file cannot be written.
    pub async fn save(&self) -> Result<(), CommandError> {
        let state = self.context.snapshot();
        let refresh_token = if state.is_authenticated() {
            self.client
                .refresh_token()
                .await
                .map(|token| token.expose_secret().to_owned())
        } else {
            None
        };

        let file = SessionFile {
            refresh_token,
            store_id: state.current_store().map(|store| store.id),
        };
        write_session_file(&self.path, &file).await
    }
}
