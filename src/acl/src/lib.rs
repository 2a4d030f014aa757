//! # CretoAI Access Control
//!
//! In-process authorization registry: rules, roles and areas decide whether
//! a principal may perform a permission key.
//!
//! ## Features
//!
//! - **Rules** keyed by permission (`articles.create`) with an area tag and an
//!   optional custom handler
//! - **Roles** bundling permissions across one or more areas
//! - **Area gating** with a home-area to rule-area visibility map
//! - **Principal overrides** that replace role permissions outright
//! - **Composite checks** (`articles.read|articles.update`) with per-key parameters
//! - **Bulk verification** of submitted permission forms
//! - **TOML configuration** for static setup
//!
//! ## Example
//!
//! ```rust
//! use cretoai_acl::{Acl, Authorizable, Parameters, Principal, Role};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! let mut acl = Acl::new();
//! acl.rule("articles.update");
//! acl.rule("articles.owner")
//!     .needs_permission(false)
//!     .handler(1, |user, params| params[0] == json!(user.id()));
//!
//! let editor = Arc::new(Role::new("editor").with_permissions(["articles.update"]));
//! let nick = Arc::new(Principal::new("user:nick").with_role(editor));
//! acl.set_current_user(nick.clone());
//!
//! let params = Parameters::keyed([("articles.owner", vec![json!("user:nick")])]);
//! assert!(acl.can("articles.update|articles.owner", &params, None));
//! assert!(nick.cant(&acl, "articles.delete", &Parameters::none()));
//! ```

pub mod acl;
pub mod config;
pub mod decision;
pub mod error;
pub mod parameters;
pub mod permissions;
pub mod principal;
pub mod role;
pub mod rule;
pub mod verify;

// Re-export commonly used types
pub use acl::Acl;
pub use config::{AclConfig, RoleSection, RuleSection};
pub use decision::{Decision, DecisionReason};
pub use error::{AclError, Result};
pub use parameters::Parameters;
pub use permissions::{PermissionSet, Permissionable, Permissions};
pub use principal::{Authorizable, Principal};
pub use role::{Role, DEFAULT_AREA};
pub use rule::{Rule, RuleBuilder, RuleHandler, KEY_SEPARATOR};
pub use verify::VerifyInputPermissions;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
