//! Permission sets and the shared permission capability
//!
//! [`PermissionSet`] is the value type. [`Permissions`] puts one behind a lock
//! so that the registry, roles and principals can all be edited through a
//! shared reference, and [`Permissionable`] exposes the same accessors on
//! every owner.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Set of permission keys
///
/// Membership is exact string equality. There is no implicit hierarchy:
/// `articles.*` does not grant `articles.create`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionSet {
    keys: BTreeSet<String>,
}

impl PermissionSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `key` is a member
    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    /// Insert a key, returning `false` if it was already present
    pub fn insert(&mut self, key: impl Into<String>) -> bool {
        self.keys.insert(key.into())
    }

    /// Remove a key, returning `true` if it was present
    pub fn remove(&mut self, key: &str) -> bool {
        self.keys.remove(key)
    }

    /// Keys present in either set
    pub fn union(&self, other: &PermissionSet) -> PermissionSet {
        Self {
            keys: self.keys.union(&other.keys).cloned().collect(),
        }
    }

    /// Keys present in `self` but not in `other`
    pub fn difference(&self, other: &PermissionSet) -> PermissionSet {
        Self {
            keys: self.keys.difference(&other.keys).cloned().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Iterate keys in lexical order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(String::as_str)
    }

    /// Keys as an owned, sorted vector
    pub fn to_vec(&self) -> Vec<String> {
        self.keys.iter().cloned().collect()
    }
}

impl<S: Into<String>> FromIterator<S> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            keys: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl<S: Into<String>> Extend<S> for PermissionSet {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        self.keys.extend(iter.into_iter().map(Into::into));
    }
}

impl<'a> IntoIterator for &'a PermissionSet {
    type Item = &'a String;
    type IntoIter = std::collections::btree_set::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.keys.iter()
    }
}

/// Lock-guarded permission set embedded in every permission owner
///
/// Reads take a snapshot, so a decision never observes a half-applied edit.
#[derive(Debug, Default)]
pub struct Permissions {
    inner: RwLock<PermissionSet>,
}

impl Permissions {
    pub fn new(set: PermissionSet) -> Self {
        Self {
            inner: RwLock::new(set),
        }
    }

    /// Current contents
    pub fn snapshot(&self) -> PermissionSet {
        self.inner.read().clone()
    }

    pub fn replace(&self, set: PermissionSet) {
        *self.inner.write() = set;
    }

    pub fn extend(&self, set: PermissionSet) {
        self.inner.write().extend(set.keys);
    }

    pub fn retain_except(&self, set: &PermissionSet) {
        let mut guard = self.inner.write();
        *guard = guard.difference(set);
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.inner.read().contains(key)
    }
}

impl Clone for Permissions {
    fn clone(&self) -> Self {
        Self::new(self.snapshot())
    }
}

impl From<PermissionSet> for Permissions {
    fn from(set: PermissionSet) -> Self {
        Self::new(set)
    }
}

/// Permission accessors shared by the registry, roles and principals
pub trait Permissionable {
    /// The embedded permission storage
    fn permissions(&self) -> &Permissions;

    /// Replace the whole set
    fn set_permissions<I, S>(&self, keys: I) -> &Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        Self: Sized,
    {
        self.permissions().replace(keys.into_iter().collect());
        self
    }

    /// Add keys to the set
    fn add_permissions<I, S>(&self, keys: I) -> &Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        Self: Sized,
    {
        self.permissions().extend(keys.into_iter().collect());
        self
    }

    /// Remove keys from the set
    fn remove_permissions<I, S>(&self, keys: I) -> &Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        Self: Sized,
    {
        self.permissions().retain_except(&keys.into_iter().collect());
        self
    }

    fn get_permissions(&self) -> PermissionSet {
        self.permissions().snapshot()
    }

    /// Whether any permission is set
    fn has_permissions(&self) -> bool {
        !self.permissions().is_empty()
    }

    fn has_permission(&self, key: &str) -> bool {
        self.permissions().contains(key)
    }
}
