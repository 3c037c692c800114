//! Store domain types.
//!
//! A store is a tenant's catalog and checkout configuration. One user may own
//! several stores; the session context keeps exactly one of them current.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use tutaviendo_core::{CurrencyCode, Price, ProductId, StoreId};

/// A catalog product. The admin screens covered here only count them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Backend product ID.
    pub id: ProductId,
    /// Product title.
    pub name: String,
    /// Unit price in the store currency.
    #[serde(default)]
    pub price: Option<Decimal>,
}

/// A store and its payment/shipping configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Store {
    /// Backend store ID.
    pub id: StoreId,
    /// Public store name.
    pub name: String,
    /// Catalog products (embedded by the backend query).
    #[serde(default)]
    pub products: Vec<Product>,
    /// Cash on delivery/pickup accepted.
    pub accept_cash: bool,
    /// Bank transfer accepted.
    pub accept_bank_transfer: bool,
    /// Free-form bank account details shown to buyers.
    #[serde(default)]
    pub bank_details: Option<String>,
    /// Buyers may pick orders up at the store.
    pub allow_pickup: bool,
    /// Local delivery offered.
    pub allow_delivery: bool,
    /// Flat delivery fee.
    #[serde(default)]
    pub delivery_cost: Decimal,
    /// Free-form description of the delivery coverage area.
    #[serde(default)]
    pub delivery_zone: Option<String>,
    /// Store currency.
    #[serde(default)]
    pub currency: CurrencyCode,
}

impl Store {
    /// The delivery fee as a price in the store currency.
    #[must_use]
    pub const fn delivery_price(&self) -> Price {
        Price::new(self.delivery_cost, self.currency)
    }

    /// Return a copy of this store with `update` merged in.
    #[must_use]
    pub fn merged(&self, update: &StoreUpdate) -> Self {
        let mut store = self.clone();
        update.apply_to(&mut store);
        store
    }
}

/// A partial store update.
///
/// Absent fields are left untouched. For the optional text fields the outer
/// `Option` selects the field and the inner one is the new value, so
/// `Some(None)` clears it (serialized as `null`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accept_cash: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accept_bank_transfer: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bank_details: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_pickup: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_delivery: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_cost: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_zone: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<CurrencyCode>,
}

impl StoreUpdate {
    /// Whether the update selects no field at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Merge the selected fields into `store`.
    pub fn apply_to(&self, store: &mut Store) {
        if let Some(name) = &self.name {
            store.name.clone_from(name);
        }
        if let Some(accept_cash) = self.accept_cash {
            store.accept_cash = accept_cash;
        }
        if let Some(accept_bank_transfer) = self.accept_bank_transfer {
            store.accept_bank_transfer = accept_bank_transfer;
        }
        if let Some(bank_details) = &self.bank_details {
            store.bank_details.clone_from(bank_details);
        }
        if let Some(allow_pickup) = self.allow_pickup {
            store.allow_pickup = allow_pickup;
        }
        if let Some(allow_delivery) = self.allow_delivery {
            store.allow_delivery = allow_delivery;
        }
        if let Some(delivery_cost) = self.delivery_cost {
            store.delivery_cost = delivery_cost;
        }
        if let Some(delivery_zone) = &self.delivery_zone {
            store.delivery_zone.clone_from(delivery_zone);
        }
        if let Some(currency) = self.currency {
            store.currency = currency;
        }
    }
}
