//! Integration tests for the Tutaviendo admin session context.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p tutaviendo-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `session_flow` - Screens driving the context over the in-memory backend
//! - `supabase_client` - The context over the HTTP client against a mock server
//!
//! The helpers below seed both backends with the same owner and store.

use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;
use serde_json::{Value, json};
use wiremock::MockServer;

use tutaviendo_admin::models::Store;
use tutaviendo_admin::services::{MemoryNavigator, MemoryNotifier};
use tutaviendo_admin::{BackendConfig, MemoryBackend, StoreContext, SupabaseClient};
use tutaviendo_core::{CurrencyCode, Email, Password, StoreId};

pub const OWNER_EMAIL: &str = "ana@tienda.com";
pub const OWNER_PASSWORD: &str = "secreto1";
pub const OWNER_NAME: &str = "Ana Lucía";
pub const USER_ID: &str = "6f1c1c5e-8a47-4d8e-9b8a-2f9b4a7c3d10";
pub const STORE_ID: &str = "0b6c2f0e-7a1d-4a53-8f65-2a4c8e9d1b20";

/// Owner email as a parsed value.
///
/// # Panics
///
/// Never; the constant is a valid address.
#[must_use]
#[allow(clippy::unwrap_used)]
pub fn owner_email() -> Email {
    Email::parse(OWNER_EMAIL).unwrap()
}

/// Owner password as a parsed value.
///
/// # Panics
///
/// Never; the constant is long enough.
#[must_use]
#[allow(clippy::unwrap_used)]
pub fn owner_password() -> Password {
    Password::parse(OWNER_PASSWORD).unwrap()
}

/// A store with cash off, bank transfer on, pickup on and no delivery.
#[must_use]
pub fn store(name: &str) -> Store {
    Store {
        id: StoreId::random(),
        name: name.to_string(),
        products: Vec::new(),
        accept_cash: false,
        accept_bank_transfer: true,
        bank_details: Some("Banco Uno 0001".to_string()),
        allow_pickup: true,
        allow_delivery: false,
        delivery_cost: rust_decimal::Decimal::ZERO,
        delivery_zone: None,
        currency: CurrencyCode::USD,
    }
}

/// Everything a screen needs, over the in-memory backend.
pub struct MemoryHarness {
    pub backend: Arc<MemoryBackend>,
    pub context: StoreContext,
    pub navigator: MemoryNavigator,
    pub notifier: MemoryNotifier,
}

impl MemoryHarness {
    /// A backend with the owner account and one store, an uninitialized
    /// context, and a browser sitting on `path`.
    #[must_use]
    pub fn new(path: &str) -> Self {
        let backend = Arc::new(MemoryBackend::new());
        let owner = backend.add_account(&owner_email(), OWNER_PASSWORD, OWNER_NAME);
        backend.add_store(owner.id, store("Dulces Ana"));

        Self {
            context: StoreContext::with_backend(backend.clone()),
            backend,
            navigator: MemoryNavigator::new(path),
            notifier: MemoryNotifier::new(),
        }
    }
}

/// A client pointed at `server`.
///
/// # Panics
///
/// Panics if the mock server URI is not a valid URL.
#[must_use]
#[allow(clippy::unwrap_used)]
pub fn supabase_client(server: &MockServer) -> SupabaseClient {
    let config = BackendConfig::new(
        &server.uri(),
        SecretString::from("test-anon-key".to_string()),
        Duration::from_secs(5),
    )
    .unwrap();
    SupabaseClient::new(&config).unwrap()
}

/// Token endpoint response for the owner.
#[must_use]
pub fn session_body(access_token: &str, refresh_token: &str) -> Value {
    json!({
        "access_token": access_token,
        "token_type": "bearer",
        "expires_in": 3600,
        "refresh_token": refresh_token,
        "user": {
            "id": USER_ID,
            "email": OWNER_EMAIL,
            "user_metadata": { "name": OWNER_NAME }
        }
    })
}

/// A `stores` row as returned by the REST endpoint.
#[must_use]
pub fn store_row(accept_cash: bool, allow_delivery: bool, delivery_cost: u32) -> Value {
    json!({
        "id": STORE_ID,
        "owner_id": USER_ID,
        "name": "Dulces Ana",
        "accept_cash": accept_cash,
        "accept_bank_transfer": true,
        "bank_details": "Banco Uno 0001",
        "allow_pickup": true,
        "allow_delivery": allow_delivery,
        "delivery_cost": delivery_cost,
        "delivery_zone": null,
        "currency": "USD",
        "products": [
            { "id": "9d2b7c1e-3f4a-4b5c-8d6e-7f8091a2b3c4", "name": "Alfajor", "price": "2.50" }
        ]
    })
}
