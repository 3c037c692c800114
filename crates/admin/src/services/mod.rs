//! Collaborator contracts consumed by the session context and the screens.
//!
//! # Services
//!
//! - `auth` - Hosted authentication backend (sign in/up/out, session restore)
//! - `stores` - Hosted database access for the user's stores
//! - `notify` - Fire-and-forget toast notifications
//! - `navigation` - Client-side routing

pub mod auth;
pub mod navigation;
pub mod notify;
pub mod stores;

pub use auth::{AuthBackend, AuthError, AuthErrorKind};
pub use navigation::{Location, MemoryNavigator, NavigateOptions, Navigator, Route};
pub use notify::{MemoryNotifier, Notifier, Toast, ToastKind, TracingNotifier};
pub use stores::{PersistenceError, StoreBackend};
