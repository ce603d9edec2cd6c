//! Facts - named, typed, mutable values attached to the world or an actor.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::error::WorldError;

/// Value types a fact can hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FactValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl FactValue {
    /// Numeric view of the value, if it has one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FactValue::Int(v) => Some(*v as f64),
            FactValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, FactValue::Int(_) | FactValue::Float(_))
    }

    /// Name of the variant, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            FactValue::Bool(_) => "bool",
            FactValue::Int(_) => "int",
            FactValue::Float(_) => "float",
            FactValue::Text(_) => "text",
        }
    }

    /// Loose equality: numbers compare by value across int/float, everything
    /// else must be the same variant.
    pub fn loose_eq(&self, other: &FactValue) -> bool {
        match (self.as_f64(), other.as_f64()) {
            (Some(a), Some(b)) => a == b,
            _ => self == other,
        }
    }

    /// Ordering between two values. Defined for number/number and text/text only.
    pub fn compare(&self, other: &FactValue) -> Option<Ordering> {
        match (self, other) {
            (FactValue::Text(a), FactValue::Text(b)) => Some(a.cmp(b)),
            _ => match (self.as_f64(), other.as_f64()) {
                (Some(a), Some(b)) => a.partial_cmp(&b),
                _ => None,
            },
        }
    }

    /// Numeric addition. Int + Int stays an integer; anything involving a float is a float.
    /// `None` for non-numeric operands or integer overflow.
    pub fn checked_add(&self, delta: &FactValue) -> Option<FactValue> {
        match (self, delta) {
            (FactValue::Int(a), FactValue::Int(b)) => a.checked_add(*b).map(FactValue::Int),
            _ => match (self.as_f64(), delta.as_f64()) {
                (Some(a), Some(b)) => Some(FactValue::Float(a + b)),
                _ => None,
            },
        }
    }
}

impl std::fmt::Display for FactValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FactValue::Bool(v) => write!(f, "{}", v),
            FactValue::Int(v) => write!(f, "{}", v),
            FactValue::Float(v) => write!(f, "{}", v),
            FactValue::Text(v) => write!(f, "\"{}\"", v),
        }
    }
}

impl From<bool> for FactValue {
    fn from(value: bool) -> Self {
        FactValue::Bool(value)
    }
}

impl From<i64> for FactValue {
    fn from(value: i64) -> Self {
        FactValue::Int(value)
    }
}

impl From<f64> for FactValue {
    fn from(value: f64) -> Self {
        FactValue::Float(value)
    }
}

impl From<&str> for FactValue {
    fn from(value: &str) -> Self {
        FactValue::Text(value.to_string())
    }
}

/// Per-entity mapping from fact name to value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FactStore {
    facts: BTreeMap<String, FactValue>,
}

impl FactStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&FactValue> {
        self.facts.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.facts.contains_key(name)
    }

    /// Create or overwrite a fact.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<FactValue>) {
        self.facts.insert(name.into(), value.into());
    }

    /// Add `delta` to a fact, creating it at `delta` when absent.
    ///
    /// Returns the new value. Fails when either side is not numeric.
    pub fn add(&mut self, name: &str, delta: &FactValue) -> Result<&FactValue, WorldError> {
        let updated = match self.facts.get(name) {
            Some(current) => current.checked_add(delta).ok_or_else(|| {
                if current.is_numeric() && delta.is_numeric() {
                    WorldError::Overflow {
                        name: name.to_string(),
                        value: current.to_string(),
                        delta: delta.to_string(),
                    }
                } else {
                    WorldError::NotNumeric {
                        name: name.to_string(),
                        value: current.to_string(),
                        delta: delta.to_string(),
                    }
                }
            })?,
            None if delta.is_numeric() => delta.clone(),
            None => {
                return Err(WorldError::NotNumeric {
                    name: name.to_string(),
                    value: "<absent>".to_string(),
                    delta: delta.to_string(),
                })
            }
        };

        let slot = self.facts.entry(name.to_string()).or_insert(FactValue::Int(0));
        *slot = updated;
        Ok(slot)
    }

    pub fn remove(&mut self, name: &str) -> Option<FactValue> {
        self.facts.remove(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FactValue)> {
        self.facts.iter()
    }

    pub fn len(&self) -> usize {
        self.facts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }
}

impl FromIterator<(String, FactValue)> for FactStore {
    fn from_iter<T: IntoIterator<Item = (String, FactValue)>>(iter: T) -> Self {
        Self {
            facts: iter.into_iter().collect(),
        }
    }
}
