//! Static registry configuration loading and validation
//!
//! Areas, roles and rules are usually fixed at startup. This module reads
//! them from TOML so they can live next to the rest of a service's
//! configuration. Rule handlers are code and must be attached afterwards.

use crate::acl::Acl;
use crate::error::{AclError, Result};
use crate::permissions::Permissionable;
use crate::role::{Role, DEFAULT_AREA};
use crate::rule::Rule;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use tracing::info;

/// Complete registry configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AclConfig {
    /// Registry default permissions
    #[serde(default)]
    pub permissions: Vec<String>,

    #[serde(default)]
    pub areas: BTreeMap<String, i64>,

    #[serde(default)]
    pub areas_to_rules: BTreeMap<String, Vec<String>>,

    #[serde(default)]
    pub roles: Vec<RoleSection>,

    #[serde(default)]
    pub rules: Vec<RuleSection>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RoleSection {
    pub key: String,
    #[serde(default = "default_areas")]
    pub areas: Vec<String>,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub permissions: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RuleSection {
    pub key: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_area")]
    pub area: String,
    #[serde(default = "default_true")]
    pub needs_permission: bool,
}

// Default value functions
fn default_true() -> bool { true }
fn default_area() -> String { DEFAULT_AREA.to_string() }
fn default_areas() -> Vec<String> { vec![default_area()] }

impl RoleSection {
    pub fn to_role(&self) -> Role {
        let mut role = Role::new(self.key.clone())
            .with_areas(self.areas.iter().cloned())
            .with_active(self.active)
            .with_permissions(self.permissions.iter().cloned());

        if let Some(name) = &self.name {
            role = role.with_name(name.clone());
        }

        role
    }
}

impl RuleSection {
    pub fn to_rule(&self) -> Rule {
        let mut rule = Rule::new(self.key.clone())
            .with_description(self.description.clone())
            .with_area(self.area.clone())
            .with_needs_permission(self.needs_permission);

        if let Some(title) = &self.title {
            rule = rule.with_title(title.clone());
        }

        rule
    }
}

impl AclConfig {
    /// Load configuration from TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        for role in &self.roles {
            role.to_role().validate()?;
        }

        let mut seen = HashSet::new();
        for rule in &self.rules {
            rule.to_rule().validate()?;

            if !seen.insert(rule.key.as_str()) {
                return Err(AclError::DuplicateRule(rule.key.clone()));
            }
        }

        Ok(())
    }
}

impl Acl {
    /// Build a registry from validated configuration
    pub fn from_config(config: &AclConfig) -> Result<Self> {
        config.validate()?;

        let mut acl = Acl::new();
        acl.set_permissions(config.permissions.iter().cloned());
        acl.set_areas(config.areas.iter().map(|(label, id)| (label.clone(), *id)));
        acl.set_areas_to_rules(config.areas_to_rules.clone());
        acl.try_set_roles(config.roles.iter().map(RoleSection::to_role))?;

        for rule in &config.rules {
            acl.add_rule(rule.to_rule());
        }

        info!(
            "Acl built from configuration with {} rules, {} roles, {} areas",
            config.rules.len(),
            config.roles.len(),
            config.areas.len()
        );

        Ok(acl)
    }
}
