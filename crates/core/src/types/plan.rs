//! Subscription plans.
//!
//! A user record only carries a plan identifier; the plan itself is derived
//! from a fixed catalog. Lookup never fails: a missing or unknown identifier
//! resolves to the free plan.

use serde::{Deserialize, Serialize};

/// Subscription tier gating feature access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PlanTier {
    /// Entry tier, no payment.
    #[default]
    Free,
    /// First paid tier.
    Basic,
    /// Professional tier.
    Pro,
    /// Multi-store businesses.
    Business,
}

impl PlanTier {
    /// Resolve a plan identifier as stored on the user profile.
    ///
    /// Unknown or missing identifiers fall back to [`PlanTier::Free`].
    #[must_use]
    pub fn from_plan_id(plan_id: Option<&str>) -> Self {
        plan_id
            .and_then(|id| id.trim().parse().ok())
            .unwrap_or_default()
    }

    /// The plan metadata for this tier.
    #[must_use]
    pub const fn plan(self) -> Plan {
        match self {
            Self::Free => Plan {
                tier: self,
                name: "Gratuito",
                level: 1,
                is_free: true,
            },
            Self::Basic => Plan {
                tier: self,
                name: "Básico",
                level: 2,
                is_free: false,
            },
            Self::Pro => Plan {
                tier: self,
                name: "Pro",
                level: 3,
                is_free: false,
            },
            Self::Business => Plan {
                tier: self,
                name: "Empresarial",
                level: 4,
                is_free: false,
            },
        }
    }
}

impl std::fmt::Display for PlanTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Free => write!(f, "free"),
            Self::Basic => write!(f, "basic"),
            Self::Pro => write!(f, "pro"),
            Self::Business => write!(f, "business"),
        }
    }
}

impl std::str::FromStr for PlanTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "free" | "gratuito" => Ok(Self::Free),
            "basic" | "basico" => Ok(Self::Basic),
            "pro" => Ok(Self::Pro),
            "business" | "empresarial" => Ok(Self::Business),
            _ => Err(format!("invalid plan: {s}")),
        }
    }
}

/// A subscription plan as shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Plan {
    /// Tier this plan belongs to.
    pub tier: PlanTier,
    /// Localized display name.
    pub name: &'static str,
    /// Ordering level; higher levels unlock more features.
    pub level: u8,
    /// Whether the plan is free of charge.
    pub is_free: bool,
}

impl Plan {
    /// Derive the plan for a user's plan identifier.
    #[must_use]
    pub fn for_plan_id(plan_id: Option<&str>) -> Self {
        PlanTier::from_plan_id(plan_id).plan()
    }
}

impl Default for Plan {
    fn default() -> Self {
        PlanTier::Free.plan()
    }
}
