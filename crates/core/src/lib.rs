//! Tutaviendo Core - Shared types library.
//!
//! This crate provides the domain types shared by every Tutaviendo component:
//! - `admin` - Session/store context and the admin screen view-models
//! - `cli` - Terminal client for the admin panel
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no async runtime. This keeps it lightweight and allows it to be
//! used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, emails,
//!   passwords and subscription plans

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
