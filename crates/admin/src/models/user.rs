//! User domain types.

use serde::{Deserialize, Serialize};

use tutaviendo_core::{Email, Plan, UserId};

/// An authenticated store owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Backend user ID.
    pub id: UserId,
    /// Sign-in email address.
    pub email: Email,
    /// Display name chosen at registration.
    pub name: String,
    /// Avatar image URL.
    #[serde(default)]
    pub avatar: Option<String>,
    /// Subscription plan identifier (see [`Plan`]).
    #[serde(default)]
    pub plan_id: Option<String>,
}

impl User {
    /// The subscription plan derived from `plan_id`.
    #[must_use]
    pub fn plan(&self) -> Plan {
        Plan::for_plan_id(self.plan_id.as_deref())
    }
}
