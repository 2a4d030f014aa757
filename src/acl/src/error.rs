//! Error types for the access control registry
//!
//! Only registry setup can fail. Authorization checks never error: every
//! negative outcome is a denial.

use thiserror::Error;

/// Access control setup errors
#[derive(Debug, Error)]
pub enum AclError {
    /// Role definition failed validation
    #[error("Invalid role: {0}")]
    InvalidRole(String),

    /// Rule definition failed validation
    #[error("Invalid rule: {0}")]
    InvalidRule(String),

    /// Same rule key declared twice in one configuration
    #[error("Duplicate rule: {0}")]
    DuplicateRule(String),

    /// Configuration could not be parsed
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for access control setup operations
pub type Result<T> = std::result::Result<T, AclError>;
