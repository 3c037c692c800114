//! Core types for Tutaviendo.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod credential;
pub mod email;
pub mod id;
pub mod plan;
pub mod price;

pub use credential::{Password, PasswordError};
pub use email::{Email, EmailError};
pub use id::*;
pub use plan::{Plan, PlanTier};
pub use price::{CurrencyCode, Price};
