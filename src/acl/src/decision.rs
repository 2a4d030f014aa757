//! Decision outcomes with the reason behind them

use serde::{Deserialize, Serialize};
use std::fmt;

/// Result of a `check` call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    /// Key that decided the outcome (the failing sub-key for composites)
    pub key: String,

    /// Whether access is granted
    pub allowed: bool,

    /// Why
    pub reason: DecisionReason,
}

impl Decision {
    /// Grant for `key`
    pub fn allow(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            allowed: true,
            reason: DecisionReason::Granted,
        }
    }

    /// Denial for `key`
    pub fn deny(key: impl Into<String>, reason: DecisionReason) -> Self {
        Self {
            key: key.into(),
            allowed: false,
            reason,
        }
    }
}

/// Reason for an authorization decision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DecisionReason {
    /// Every gate passed
    Granted,

    /// No rule registered under the key
    UnknownRule,

    /// No principal passed and none bound to the registry
    NoPrincipal,

    /// Principal has no role
    NoRole,

    /// Rule area is neither the role's home area nor reachable from it
    AreaMismatch { rule_area: String, home_area: String },

    /// Key missing from the effective permission set
    MissingPermission,

    /// Fewer parameters than the handler requires
    HandlerArityMismatch { required: usize, supplied: usize },

    /// Handler returned false
    HandlerDenied,
}

impl fmt::Display for DecisionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Granted => write!(f, "granted"),
            Self::UnknownRule => write!(f, "no rule registered"),
            Self::NoPrincipal => write!(f, "no principal"),
            Self::NoRole => write!(f, "principal has no role"),
            Self::AreaMismatch { rule_area, home_area } => write!(
                f,
                "rule area '{}' not reachable from home area '{}'",
                rule_area, home_area
            ),
            Self::MissingPermission => write!(f, "permission not granted"),
            Self::HandlerArityMismatch { required, supplied } => write!(
                f,
                "handler requires {} parameters, {} supplied",
                required, supplied
            ),
            Self::HandlerDenied => write!(f, "handler denied"),
        }
    }
}
