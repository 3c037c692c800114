//! Screen view-models.
//!
//! Each screen keeps its own form state and drives the shared
//! [`StoreContext`](crate::state::StoreContext); rendering is left to the
//! embedding UI.
//!
//! # Screens
//!
//! - `gate` - Route guarding and redirects on auth changes
//! - `login` - Sign in / sign up form
//! - `payments_shipping` - Payment and shipping settings of the current store
//! - `user_menu` - Header dropdown with plan badge, store switcher and logout

pub mod gate;
pub mod login;
pub mod payments_shipping;
pub mod user_menu;

pub use gate::{GateDecision, RedirectOnChange, gate};
pub use login::{AuthMode, Field, LoginForm, SubmitOutcome, SubmitRequest};
pub use payments_shipping::{
    PaymentSettings, PaymentsShippingForm, SaveOutcome, SettingsChange, SettingsSummary,
};
pub use user_menu::{BadgeTone, LogoutOutcome, StoreCard, UserHeader, UserMenu};
