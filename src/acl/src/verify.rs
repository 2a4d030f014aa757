//! Bulk permission input verification
//!
//! Turns a submitted permission form (`{"articles_create": 1, ...}`) into the
//! rule keys a role may actually be granted.

use crate::acl::Acl;
use crate::role::Role;
use serde_json::{Map, Value};
use tracing::trace;

/// Verifies submitted permission toggles against the registry
#[derive(Debug, Clone, Copy)]
pub struct VerifyInputPermissions<'a> {
    acl: &'a Acl,
}

impl<'a> VerifyInputPermissions<'a> {
    pub fn new(acl: &'a Acl) -> Self {
        Self { acl }
    }

    /// Rule keys switched on in `input` that fall inside the role's areas
    ///
    /// Only JSON objects carry string keys; arrays and scalars verify to
    /// nothing. Entries are skipped when the value is not switched on, when
    /// no rule exists under the key (underscores read as dots), or when the
    /// rule's area is not one of the role's areas. The result keeps first-seen
    /// order without duplicates.
    pub fn verify(&self, input: &Value, role: &Role) -> Vec<String> {
        match input {
            Value::Object(map) => self.verify_map(map, role),
            _ => Vec::new(),
        }
    }

    pub fn verify_map(&self, input: &Map<String, Value>, role: &Role) -> Vec<String> {
        self.verify_entries(input.iter().map(|(k, v)| (k.as_str(), v)), role)
    }

    pub fn verify_entries<'k, I>(&self, entries: I, role: &Role) -> Vec<String>
    where
        I: IntoIterator<Item = (&'k str, &'k Value)>,
    {
        let mut verified: Vec<String> = Vec::new();

        for (input_key, value) in entries {
            if !is_switched_on(value) {
                continue;
            }

            let key = input_key.replace('_', ".");
            let Some(rule) = self.acl.get_rule(&key) else {
                trace!(input_key, "No rule for permission input");
                continue;
            };

            if !role.in_area(rule.area()) {
                trace!(input_key, area = rule.area(), role = role.key(), "Permission outside role areas");
                continue;
            }

            if !verified.iter().any(|k| k == rule.key()) {
                verified.push(rule.key().to_string());
            }
        }

        verified
    }
}

/// `true`, `1` or `"1"`
fn is_switched_on(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_u64() == Some(1) || n.as_f64() == Some(1.0),
        Value::String(s) => s == "1",
        _ => false,
    }
}
