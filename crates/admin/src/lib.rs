//! Tutaviendo admin library.
//!
//! Client-side session and store context for the Tutaviendo store-builder
//! admin panel, plus the view-models of the screens that consume it.
//!
//! The [`StoreContext`] owns the signed-in user, their stores and the
//! current store. Screens read immutable [`SessionState`] snapshots and call
//! context operations; the context talks to the hosted backend through the
//! [`AuthBackend`](services::AuthBackend) and
//! [`StoreBackend`](services::StoreBackend) traits.
//!
//! # Backends
//!
//! - [`SupabaseClient`] - Hosted auth + REST backend over HTTP
//! - [`MemoryBackend`] - In-process backend for tests and demos

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod memory;
pub mod messages;
pub mod models;
pub mod screens;
pub mod services;
pub mod state;
pub mod supabase;

pub use config::{AdminConfig, BackendConfig};
pub use error::{AppError, SessionError};
pub use memory::MemoryBackend;
pub use models::{SessionState, Store, StoreUpdate, User};
pub use state::StoreContext;
pub use supabase::SupabaseClient;
