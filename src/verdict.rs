//! Risk tiers, enforcement actions and the pure verdict function

use crate::CategoryLimits;
use serde::{Deserialize, Serialize};

/// Share of the ceiling up to which risk is low (inclusive)
pub const LOW_RISK_RATIO: f64 = 0.5;
/// Share of the ceiling up to which risk is medium (inclusive); above it a
/// flag is raised
pub const FLAG_RATIO: f64 = 0.8;

/// Risk classification of an actor's current velocity
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTier {
    /// At most half the ceiling
    Low,
    /// At most 80% of the ceiling
    Medium,
    High,
}

impl std::fmt::Display for RiskTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        };
        write!(f, "{s}")
    }
}

/// Recommended enforcement action
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VelocityAction {
    Allow,
    /// Route to manual review
    Flag,
    /// Disable the actor
    Block,
}

impl VelocityAction {
    /// Reason passed to the dispatcher, `None` for `Allow`
    pub fn dispatch_reason(&self) -> Option<&'static str> {
        match self {
            Self::Allow => None,
            Self::Flag => Some("high velocity detected"),
            Self::Block => Some("velocity limit exceeded"),
        }
    }
}

impl std::fmt::Display for VelocityAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Allow => "allow",
            Self::Flag => "flag",
            Self::Block => "block",
        };
        write!(f, "{s}")
    }
}

/// Derived risk decision for one analyze call. Never persisted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VelocityVerdict {
    /// Events inside the evaluation window, including the one just recorded
    pub window_count: u64,
    /// Ceiling of the category the verdict was computed against
    pub ceiling: u64,
    /// Exceeding the ceiling flags instead of blocking
    pub soft_flag_allowed: bool,
    pub risk_tier: RiskTier,
    pub action: VelocityAction,
}

impl VelocityVerdict {
    /// Compute the verdict for `window_count` events against `limits`.
    pub fn evaluate(window_count: u64, limits: &CategoryLimits) -> Self {
        Self {
            window_count,
            ceiling: limits.ceiling,
            soft_flag_allowed: limits.soft_flag_allowed,
            risk_tier: risk_tier(window_count, limits.ceiling),
            action: action(window_count, limits.ceiling, limits.soft_flag_allowed),
        }
    }

    /// True when the action is not `Allow`
    pub fn requires_dispatch(&self) -> bool {
        self.action != VelocityAction::Allow
    }
}

/// Tier boundaries are inclusive (`<=`).
pub fn risk_tier(window_count: u64, ceiling: u64) -> RiskTier {
    let count = window_count as f64;
    let ceiling = ceiling as f64;
    if count <= LOW_RISK_RATIO * ceiling {
        RiskTier::Low
    } else if count <= FLAG_RATIO * ceiling {
        RiskTier::Medium
    } else {
        RiskTier::High
    }
}

/// Flag threshold is strict (`>`), unlike the inclusive tier boundary at the
/// same ratio. Both comparators are load-bearing.
pub fn action(window_count: u64, ceiling: u64, soft_flag_allowed: bool) -> VelocityAction {
    if window_count > ceiling {
        if soft_flag_allowed {
            VelocityAction::Flag
        } else {
            VelocityAction::Block
        }
    } else if window_count as f64 > FLAG_RATIO * ceiling as f64 {
        VelocityAction::Flag
    } else {
        VelocityAction::Allow
    }
}
