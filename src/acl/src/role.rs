//! Role definitions

use crate::error::{AclError, Result};
use crate::permissions::{PermissionSet, Permissionable, Permissions};
use serde::{Deserialize, Serialize};

/// Area every role and rule belongs to unless told otherwise
pub const DEFAULT_AREA: &str = "frontend";

/// A named bundle of permissions scoped to one or more areas
///
/// The first declared area is the role's home area, the one the rule area
/// gate compares against. The `active` flag is carried as metadata only and
/// does not influence decisions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
    key: String,
    areas: Vec<String>,
    active: bool,
    name: Option<String>,
    #[serde(with = "permissions_serde")]
    permissions: Permissions,
}

impl Role {
    /// Create an active role in the default area
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            areas: vec![DEFAULT_AREA.to_string()],
            active: true,
            name: None,
            permissions: Permissions::default(),
        }
    }

    /// Replace the declared areas (first one becomes the home area)
    pub fn with_areas<I, S>(mut self, areas: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.areas = areas.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_permissions<I, S>(self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.permissions.replace(keys.into_iter().collect());
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// All declared areas
    pub fn areas(&self) -> &[String] {
        &self.areas
    }

    /// Home area
    pub fn area(&self) -> &str {
        self.areas.first().map(String::as_str).unwrap_or(DEFAULT_AREA)
    }

    /// Whether the role belongs to `area`
    pub fn in_area(&self, area: &str) -> bool {
        self.areas.iter().any(|a| a == area)
    }

    pub fn active(&self) -> bool {
        self.active
    }

    /// Display name, falling back to the key with its first letter upper-cased
    pub fn name(&self) -> String {
        match &self.name {
            Some(name) if !name.is_empty() => name.clone(),
            _ => capitalize(&self.key),
        }
    }

    /// Validate the role definition
    pub fn validate(&self) -> Result<()> {
        if self.key.is_empty() {
            return Err(AclError::InvalidRole("Role key cannot be empty".to_string()));
        }

        if self.areas.is_empty() {
            return Err(AclError::InvalidRole(format!(
                "Role '{}' must belong to at least one area",
                self.key
            )));
        }

        if self.areas.iter().any(String::is_empty) {
            return Err(AclError::InvalidRole(format!(
                "Role '{}' has an empty area",
                self.key
            )));
        }

        Ok(())
    }
}

impl Permissionable for Role {
    fn permissions(&self) -> &Permissions {
        &self.permissions
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

mod permissions_serde {
    use super::{PermissionSet, Permissions};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(value: &Permissions, serializer: S) -> Result<S::Ok, S::Error> {
        value.snapshot().serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Permissions, D::Error> {
        PermissionSet::deserialize(deserializer).map(Permissions::new)
    }
}
