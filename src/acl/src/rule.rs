//! Rules and the per-rule matching algorithm
//!
//! A rule decides one permission key. Matching runs four gates in order:
//!
//! ```text
//! principal → role → area → permission → handler
//! ```
//!
//! The area and permission gates are skipped for rules that do not need a
//! permission. The handler, when attached, has the final word.

use crate::acl::Acl;
use crate::decision::{Decision, DecisionReason};
use crate::error::{AclError, Result};
use crate::parameters::Parameters;
use crate::permissions::{PermissionSet, Permissionable};
use crate::principal::Authorizable;
use crate::role::DEFAULT_AREA;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

/// Separator of composite keys in `can`
pub const KEY_SEPARATOR: char = '|';

type HandlerFn = dyn Fn(&dyn Authorizable, &[Value]) -> bool + Send + Sync;

/// Custom predicate attached to a rule
///
/// Receives the acting principal and the positional parameters. The core
/// refuses to call it with fewer than `required` parameters and denies
/// instead.
#[derive(Clone)]
pub struct RuleHandler {
    required: usize,
    predicate: Arc<HandlerFn>,
}

impl RuleHandler {
    pub fn new<F>(required: usize, predicate: F) -> Self
    where
        F: Fn(&dyn Authorizable, &[Value]) -> bool + Send + Sync + 'static,
    {
        Self {
            required,
            predicate: Arc::new(predicate),
        }
    }

    /// Minimum number of positional parameters
    pub fn required_parameters(&self) -> usize {
        self.required
    }

    fn invoke(&self, key: &str, principal: &dyn Authorizable, parameters: &[Value]) -> Decision {
        if parameters.len() < self.required {
            return Decision::deny(
                key,
                DecisionReason::HandlerArityMismatch {
                    required: self.required,
                    supplied: parameters.len(),
                },
            );
        }

        if (self.predicate)(principal, parameters) {
            Decision::allow(key)
        } else {
            Decision::deny(key, DecisionReason::HandlerDenied)
        }
    }
}

impl fmt::Debug for RuleHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleHandler")
            .field("required", &self.required)
            .finish_non_exhaustive()
    }
}

/// Named permission check
#[derive(Debug, Clone)]
pub struct Rule {
    /// Unique key (e.g. "articles.create"); dots by convention, opaque otherwise
    key: String,

    title: Option<String>,

    description: String,

    /// Area the rule belongs to
    area: String,

    /// Whether the area and permission gates apply
    needs_permission: bool,

    handler: Option<RuleHandler>,
}

impl Rule {
    /// Create a rule in the default area that needs a permission
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            title: None,
            description: String::new(),
            area: DEFAULT_AREA.to_string(),
            needs_permission: true,
            handler: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_area(mut self, area: impl Into<String>) -> Self {
        self.area = area.into();
        self
    }

    pub fn with_needs_permission(mut self, needs_permission: bool) -> Self {
        self.needs_permission = needs_permission;
        self
    }

    pub fn with_handler(mut self, handler: RuleHandler) -> Self {
        self.handler = Some(handler);
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Form input spelling of the key ("articles.create" → "articles_create")
    pub fn input_key(&self) -> String {
        self.key.replace('.', "_")
    }

    /// Title, falling back to the key
    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.key)
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn area(&self) -> &str {
        &self.area
    }

    pub fn needs_permission(&self) -> bool {
        self.needs_permission
    }

    pub fn handler(&self) -> Option<&RuleHandler> {
        self.handler.as_ref()
    }

    /// Validate the rule definition
    pub fn validate(&self) -> Result<()> {
        if self.key.is_empty() {
            return Err(AclError::InvalidRule("Rule key cannot be empty".to_string()));
        }

        if self.key.contains(KEY_SEPARATOR) {
            return Err(AclError::InvalidRule(format!(
                "Rule key '{}' cannot contain '{}'",
                self.key, KEY_SEPARATOR
            )));
        }

        if self.area.is_empty() {
            return Err(AclError::InvalidRule(format!(
                "Rule '{}' has an empty area",
                self.key
            )));
        }

        Ok(())
    }

    /// Whether the rule grants `key` to the principal
    pub fn matches(
        &self,
        acl: &Acl,
        key: &str,
        parameters: &Parameters,
        principal: Option<&dyn Authorizable>,
    ) -> bool {
        self.evaluate(acl, key, parameters, principal).allowed
    }

    /// Run the matching algorithm and report which gate decided
    ///
    /// Without an explicit principal the registry's current user is taken and
    /// the registry's own permissions are merged into the pool. An explicit
    /// principal is judged on its own permissions only.
    pub fn evaluate(
        &self,
        acl: &Acl,
        key: &str,
        parameters: &Parameters,
        principal: Option<&dyn Authorizable>,
    ) -> Decision {
        let current;
        let (principal, permissions) = match principal {
            Some(principal) => (principal, collect_permissions(principal, acl)),
            None => {
                current = match acl.current_user() {
                    Some(user) => user,
                    None => return deny(key, DecisionReason::NoPrincipal),
                };
                let principal: &dyn Authorizable = current.as_ref();
                let permissions = acl
                    .get_permissions()
                    .union(&collect_permissions(principal, acl));
                (principal, permissions)
            }
        };

        let Some(role) = principal.role() else {
            return deny(key, DecisionReason::NoRole);
        };

        if self.needs_permission {
            let home_area = role.area();
            let reachable = acl
                .get_areas_to_rules()
                .get(home_area)
                .is_some_and(|areas| areas.iter().any(|a| a == &self.area));

            if self.area != home_area && !reachable {
                return deny(
                    key,
                    DecisionReason::AreaMismatch {
                        rule_area: self.area.clone(),
                        home_area: home_area.to_string(),
                    },
                );
            }

            if !permissions.contains(key) {
                return deny(key, DecisionReason::MissingPermission);
            }
        }

        let decision = match &self.handler {
            Some(handler) => handler.invoke(key, principal, parameters.positional(key)),
            None => Decision::allow(key),
        };

        if decision.allowed {
            trace!(key, principal = principal.id(), "Rule granted");
        } else {
            debug!(key, principal = principal.id(), reason = %decision.reason, "Rule denied");
        }

        decision
    }
}

fn deny(key: &str, reason: DecisionReason) -> Decision {
    debug!(key, reason = %reason, "Rule denied");
    Decision::deny(key, reason)
}

/// Permissions the principal brings to a check
///
/// A non-empty principal override wins outright. Otherwise the registered
/// role of the same key is consulted first, so live edits on the registry's
/// role reach principals holding an older copy.
pub(crate) fn collect_permissions(principal: &dyn Authorizable, acl: &Acl) -> PermissionSet {
    if principal.has_permissions() {
        return principal.get_permissions();
    }

    let Some(role) = principal.role() else {
        return PermissionSet::new();
    };

    match acl.get_role(role.key()) {
        Some(registered) => registered.get_permissions(),
        None => role.get_permissions(),
    }
}

/// Fluent editor for a rule held by the registry
pub struct RuleBuilder<'a> {
    rule: &'a mut Rule,
}

impl<'a> RuleBuilder<'a> {
    pub(crate) fn new(rule: &'a mut Rule) -> Self {
        Self { rule }
    }

    pub fn title(self, title: impl Into<String>) -> Self {
        self.rule.title = Some(title.into());
        self
    }

    pub fn description(self, description: impl Into<String>) -> Self {
        self.rule.description = description.into();
        self
    }

    pub fn area(self, area: impl Into<String>) -> Self {
        self.rule.area = area.into();
        self
    }

    pub fn needs_permission(self, needs_permission: bool) -> Self {
        self.rule.needs_permission = needs_permission;
        self
    }

    /// Attach a handler that needs at least `required` positional parameters
    pub fn handler<F>(self, required: usize, predicate: F) -> Self
    where
        F: Fn(&dyn Authorizable, &[Value]) -> bool + Send + Sync + 'static,
    {
        self.rule.handler = Some(RuleHandler::new(required, predicate));
        self
    }

    /// The rule as configured so far
    pub fn get(&self) -> &Rule {
        &*self.rule
    }
}
