//! Domain models for the admin panel.
//!
//! Users and stores are owned by the hosted backend; these types are the
//! read-only cache the session context holds.

pub mod session;
pub mod store;
pub mod user;

pub use session::{AuthStatus, SessionState};
pub use store::{Product, Store, StoreUpdate};
pub use user::User;
