//! Arguments forwarded to custom rule handlers

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Handler arguments for a `can` check
///
/// A single key takes a positional [`Parameters::List`]. A `|`-composite key
/// takes [`Parameters::Keyed`], where each sub-key looks up its own argument
/// list by its own name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Parameters {
    /// Positional arguments
    List(Vec<Value>),

    /// Argument lists per rule key
    Keyed(HashMap<String, Vec<Value>>),
}

impl Parameters {
    /// No arguments
    pub fn none() -> Self {
        Self::List(Vec::new())
    }

    /// Positional arguments
    pub fn list<I: IntoIterator<Item = Value>>(values: I) -> Self {
        Self::List(values.into_iter().collect())
    }

    /// Argument lists keyed by rule key
    pub fn keyed<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, Vec<Value>)>,
        K: Into<String>,
    {
        Self::Keyed(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Arguments destined for one sub-key of a composite check
    ///
    /// Positional lists cannot be addressed by key, so they yield nothing.
    pub fn for_key(&self, key: &str) -> Parameters {
        match self {
            Self::Keyed(map) => Self::List(map.get(key).cloned().unwrap_or_default()),
            Self::List(_) => Self::none(),
        }
    }

    /// Positional arguments to hand to the handler of rule `key`
    pub fn positional<'a>(&'a self, key: &str) -> &'a [Value] {
        match self {
            Self::List(values) => values,
            Self::Keyed(map) => map.get(key).map(Vec::as_slice).unwrap_or(&[]),
        }
    }
}

impl Default for Parameters {
    fn default() -> Self {
        Self::none()
    }
}

impl From<Vec<Value>> for Parameters {
    fn from(values: Vec<Value>) -> Self {
        Self::List(values)
    }
}

impl From<HashMap<String, Vec<Value>>> for Parameters {
    fn from(map: HashMap<String, Vec<Value>>) -> Self {
        Self::Keyed(map)
    }
}
