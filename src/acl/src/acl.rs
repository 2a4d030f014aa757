//! The access control registry
//!
//! Owns rules, roles, areas and the area-to-rule visibility map, and answers
//! "may this principal do that". Tables are filled during setup through
//! `&mut self`; afterwards the registry can be shared (`Arc<Acl>`) and
//! queried concurrently. Only the registry permissions and the bound current
//! user change after setup, both behind locks.
//!
//! # Example
//!
//! ```rust
//! use cretoai_acl::{Acl, Authorizable, Parameters, Principal, Role};
//! use std::sync::Arc;
//!
//! let mut acl = Acl::new();
//! acl.rule("articles.read");
//! acl.rule("articles.create").area("backend");
//! acl.set_areas_to_rules([("frontend", vec!["backend"])]);
//!
//! let editor = Arc::new(Role::new("editor").with_permissions(["articles.read", "articles.create"]));
//! let nick = Principal::new("user:nick").with_role(editor);
//!
//! assert!(nick.can(&acl, "articles.read|articles.create", &Parameters::none()));
//! ```

use crate::decision::{Decision, DecisionReason};
use crate::error::Result;
use crate::parameters::Parameters;
use crate::permissions::{Permissionable, Permissions};
use crate::principal::Authorizable;
use crate::role::Role;
use crate::rule::{Rule, RuleBuilder, KEY_SEPARATOR};
use parking_lot::RwLock;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Access control registry
#[derive(Default)]
pub struct Acl {
    /// Registry default permissions, merged only for the current user
    permissions: Permissions,

    current_user: RwLock<Option<Arc<dyn Authorizable>>>,

    rules: BTreeMap<String, Rule>,

    roles: BTreeMap<String, Arc<Role>>,

    roles_by_area: BTreeMap<String, BTreeMap<String, Arc<Role>>>,

    /// Area labels to ids in declaration order, e.g. frontend => 1
    areas: Vec<(String, i64)>,

    /// Home area to the additional rule areas it may satisfy
    areas_to_rules: BTreeMap<String, Vec<String>>,
}

impl Acl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind the principal used when a check names none
    pub fn set_current_user(&self, user: Arc<dyn Authorizable>) -> &Self {
        *self.current_user.write() = Some(user);
        self
    }

    pub fn current_user(&self) -> Option<Arc<dyn Authorizable>> {
        self.current_user.read().clone()
    }

    pub fn clear_current_user(&self) -> &Self {
        *self.current_user.write() = None;
        self
    }

    /// Register a fresh rule under `key` and return a builder for it
    ///
    /// Any rule already registered under the key is replaced.
    pub fn rule(&mut self, key: impl Into<String>) -> RuleBuilder<'_> {
        let key = key.into();
        let rule = Rule::new(key.clone());

        let slot = match self.rules.entry(key) {
            Entry::Occupied(mut entry) => {
                entry.insert(rule);
                entry.into_mut()
            }
            Entry::Vacant(entry) => entry.insert(rule),
        };

        RuleBuilder::new(slot)
    }

    /// Register a rule, replacing any rule with the same key
    pub fn add_rule(&mut self, rule: Rule) -> &mut Self {
        if rule.key().contains(KEY_SEPARATOR) {
            warn!(key = rule.key(), "Rule key contains the composite separator and can never match");
        }
        self.rules.insert(rule.key().to_string(), rule);
        self
    }

    pub fn get_rule(&self, key: &str) -> Option<&Rule> {
        self.rules.get(key)
    }

    pub fn has_rule(&self, key: &str) -> bool {
        self.rules.contains_key(key)
    }

    pub fn get_rules(&self) -> &BTreeMap<String, Rule> {
        &self.rules
    }

    /// Index roles by key and by every area they declare
    ///
    /// Roles that fail validation are skipped.
    pub fn set_roles<I, R>(&mut self, roles: I) -> &mut Self
    where
        I: IntoIterator<Item = R>,
        R: Into<Arc<Role>>,
    {
        for role in roles {
            let role = role.into();
            if let Err(e) = role.validate() {
                warn!("Skipping role: {}", e);
                continue;
            }
            self.index_role(role);
        }
        self
    }

    /// Like [`Acl::set_roles`], but stops at the first invalid role
    pub fn try_set_roles<I, R>(&mut self, roles: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = R>,
        R: Into<Arc<Role>>,
    {
        for role in roles {
            let role = role.into();
            role.validate()?;
            self.index_role(role);
        }
        Ok(self)
    }

    fn index_role(&mut self, role: Arc<Role>) {
        for area in role.areas() {
            self.roles_by_area
                .entry(area.clone())
                .or_default()
                .insert(role.key().to_string(), Arc::clone(&role));
        }
        self.roles.insert(role.key().to_string(), role);
    }

    /// All roles, or only those indexed under `area`
    pub fn get_roles(&self, area: Option<&str>) -> BTreeMap<String, Arc<Role>> {
        match area {
            None => self.roles.clone(),
            Some(area) => self.roles_by_area.get(area).cloned().unwrap_or_default(),
        }
    }

    pub fn get_role(&self, key: &str) -> Option<Arc<Role>> {
        self.roles.get(key).cloned()
    }

    pub fn has_role(&self, key: &str) -> bool {
        self.roles.contains_key(key)
    }

    /// Replace the area table, e.g. `[("frontend", 1), ("backend", 2)]`
    ///
    /// A label declared twice keeps its first position and takes the later id.
    pub fn set_areas<I, K>(&mut self, areas: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, i64)>,
        K: Into<String>,
    {
        self.areas.clear();
        for (label, id) in areas {
            let label = label.into();
            match self.areas.iter_mut().find(|(existing, _)| *existing == label) {
                Some(entry) => entry.1 = id,
                None => self.areas.push((label, id)),
            }
        }
        self
    }

    pub fn get_areas(&self) -> &[(String, i64)] {
        &self.areas
    }

    /// Area label for an id
    ///
    /// When several labels share an id, the last declared one wins.
    pub fn get_area_key(&self, id: i64) -> Option<&str> {
        self.areas
            .iter()
            .rfind(|(_, area_id)| *area_id == id)
            .map(|(label, _)| label.as_str())
    }

    pub fn get_area_id(&self, label: &str) -> Option<i64> {
        self.areas
            .iter()
            .find(|(existing, _)| existing == label)
            .map(|(_, id)| *id)
    }

    /// Declare which rule areas each home area may additionally satisfy
    pub fn set_areas_to_rules<I, K, V, S>(&mut self, areas_to_rules: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.areas_to_rules = areas_to_rules
            .into_iter()
            .map(|(home, areas)| (home.into(), areas.into_iter().map(Into::into).collect()))
            .collect();
        self
    }

    pub fn get_areas_to_rules(&self) -> &BTreeMap<String, Vec<String>> {
        &self.areas_to_rules
    }

    /// Whether the principal (or the current user) may do `key`
    ///
    /// `key` may combine several keys with `|`; all of them must pass, each
    /// with its own parameters looked up by sub-key.
    pub fn can(
        &self,
        key: &str,
        parameters: &Parameters,
        principal: Option<&dyn Authorizable>,
    ) -> bool {
        self.check(key, parameters, principal).allowed
    }

    pub fn cant(
        &self,
        key: &str,
        parameters: &Parameters,
        principal: Option<&dyn Authorizable>,
    ) -> bool {
        !self.can(key, parameters, principal)
    }

    /// Decide `key` and report why
    ///
    /// A composite key reports its first failing sub-key.
    pub fn check(
        &self,
        key: &str,
        parameters: &Parameters,
        principal: Option<&dyn Authorizable>,
    ) -> Decision {
        if !key.contains(KEY_SEPARATOR) {
            return match self.rules.get(key) {
                Some(rule) => rule.evaluate(self, key, parameters, principal),
                None => {
                    debug!(key, "No rule registered");
                    Decision::deny(key, DecisionReason::UnknownRule)
                }
            };
        }

        for sub_key in key.split(KEY_SEPARATOR) {
            let decision = self.check(sub_key, &parameters.for_key(sub_key), principal);
            if !decision.allowed {
                return decision;
            }
        }

        Decision::allow(key)
    }
}

impl Permissionable for Acl {
    fn permissions(&self) -> &Permissions {
        &self.permissions
    }
}

impl fmt::Debug for Acl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Acl")
            .field("permissions", &self.permissions.snapshot())
            .field("current_user", &self.current_user.read().as_ref().map(|u| u.id().to_string()))
            .field("rules", &self.rules.keys().collect::<Vec<_>>())
            .field("roles", &self.roles.keys().collect::<Vec<_>>())
            .field("areas", &self.areas)
            .field("areas_to_rules", &self.areas_to_rules)
            .finish()
    }
}
