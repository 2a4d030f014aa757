//! Principals: the acting entities being authorized

use crate::acl::Acl;
use crate::parameters::Parameters;
use crate::permissions::{Permissionable, Permissions};
use crate::role::Role;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Capability of anything that can be authorized
///
/// A principal carries a role and an optional permission override. When the
/// override is non-empty it replaces the role's permissions entirely.
pub trait Authorizable: Permissionable + Send + Sync {
    /// Principal identifier (e.g. "user:nick")
    fn id(&self) -> &str;

    fn role_key(&self) -> String;

    fn set_role_key(&self, role_key: &str);

    /// The bound role, if any
    fn role(&self) -> Option<Arc<Role>>;

    fn set_role(&self, role: Option<Arc<Role>>);

    fn has_role(&self) -> bool {
        self.role().is_some()
    }

    /// This principal as a trait object (implementations return `self`)
    fn as_authorizable(&self) -> &dyn Authorizable;

    /// Check `key` against `acl` with this principal
    fn can(&self, acl: &Acl, key: &str, parameters: &Parameters) -> bool {
        acl.can(key, parameters, Some(self.as_authorizable()))
    }

    fn cant(&self, acl: &Acl, key: &str, parameters: &Parameters) -> bool {
        !self.can(acl, key, parameters)
    }
}

#[derive(Debug, Default)]
struct RoleBinding {
    key: String,
    role: Option<Arc<Role>>,
}

/// Stock principal (user, service account, agent)
///
/// Role binding and permissions sit behind locks so an application can
/// rebind them per request while the principal is shared.
pub struct Principal {
    /// Principal identifier (e.g., "user:alice@example.com", "service:billing")
    id: String,

    /// Principal type derived from the id prefix
    principal_type: String,

    /// Free-form attributes for handlers
    attributes: HashMap<String, String>,

    binding: RwLock<RoleBinding>,

    permissions: Permissions,
}

impl Principal {
    /// Create a new principal from an ID string
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        let principal_type = match id.split_once(':') {
            Some((prefix, _)) => prefix.to_string(),
            None => "user".to_string(),
        };

        Self {
            id,
            principal_type,
            attributes: HashMap::new(),
            binding: RwLock::new(RoleBinding::default()),
            permissions: Permissions::default(),
        }
    }

    /// Add an attribute to the principal
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Bind a role, recording its key as the role key
    pub fn with_role(self, role: Arc<Role>) -> Self {
        {
            let mut binding = self.binding.write();
            binding.key = role.key().to_string();
            binding.role = Some(role);
        }
        self
    }

    /// Set the principal-level permission override
    pub fn with_permissions<I, S>(self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.permissions.replace(keys.into_iter().collect());
        self
    }

    pub fn principal_type(&self) -> &str {
        &self.principal_type
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    pub fn attributes(&self) -> &HashMap<String, String> {
        &self.attributes
    }
}

impl Permissionable for Principal {
    fn permissions(&self) -> &Permissions {
        &self.permissions
    }
}

impl Authorizable for Principal {
    fn id(&self) -> &str {
        &self.id
    }

    fn role_key(&self) -> String {
        self.binding.read().key.clone()
    }

    fn set_role_key(&self, role_key: &str) {
        self.binding.write().key = role_key.to_string();
    }

    fn role(&self) -> Option<Arc<Role>> {
        self.binding.read().role.clone()
    }

    fn set_role(&self, role: Option<Arc<Role>>) {
        self.binding.write().role = role;
    }

    fn as_authorizable(&self) -> &dyn Authorizable {
        self
    }
}

impl fmt::Debug for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let binding = self.binding.read();
        f.debug_struct("Principal")
            .field("id", &self.id)
            .field("principal_type", &self.principal_type)
            .field("attributes", &self.attributes)
            .field("role_key", &binding.key)
            .field("permissions", &self.permissions.snapshot())
            .finish()
    }
}
