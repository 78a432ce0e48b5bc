//! Policy conditions.
//!
//! A condition block maps an operator to `key → values`. Evaluation ANDs
//! every operator/key pair and ORs the values listed for one key, which is
//! how IAM reads the `Condition` element.

use chaos_core::{StackContext, Token};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::BTreeMap;
use std::fmt;

use crate::pattern::glob_matches;

/// Condition operators used by the experiment roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ConditionOperator {
    StringEquals,
    StringNotEquals,
    StringLike,
    ArnEquals,
    ArnLike,
    Bool,
}

impl ConditionOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConditionOperator::StringEquals => "StringEquals",
            ConditionOperator::StringNotEquals => "StringNotEquals",
            ConditionOperator::StringLike => "StringLike",
            ConditionOperator::ArnEquals => "ArnEquals",
            ConditionOperator::ArnLike => "ArnLike",
            ConditionOperator::Bool => "Bool",
        }
    }

    /// Negated operators hold when the key is absent from the request.
    fn is_negated(&self) -> bool {
        matches!(self, ConditionOperator::StringNotEquals)
    }

    fn test(&self, expected: &str, actual: &str) -> bool {
        match self {
            ConditionOperator::StringEquals | ConditionOperator::ArnEquals => expected == actual,
            ConditionOperator::StringNotEquals => expected != actual,
            ConditionOperator::StringLike | ConditionOperator::ArnLike => {
                glob_matches(expected, actual)
            }
            ConditionOperator::Bool => expected.eq_ignore_ascii_case(actual),
        }
    }
}

impl fmt::Display for ConditionOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The `Condition` element of a statement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Conditions {
    entries: BTreeMap<ConditionOperator, BTreeMap<String, Vec<Token>>>,
}

impl Conditions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an expected value for `operator`/`key`. Values for the same key
    /// accumulate.
    pub fn add(&mut self, operator: ConditionOperator, key: impl Into<String>, value: impl Into<Token>) {
        let values = self
            .entries
            .entry(operator)
            .or_default()
            .entry(key.into())
            .or_default();
        let value = value.into();
        if !values.contains(&value) {
            values.push(value);
        }
    }

    pub fn with(mut self, operator: ConditionOperator, key: impl Into<String>, value: impl Into<Token>) -> Self {
        self.add(operator, key, value);
        self
    }

    /// Union of both condition blocks.
    pub fn merge(&mut self, other: &Conditions) {
        for (operator, keys) in &other.entries {
            for (key, values) in keys {
                for value in values {
                    self.add(*operator, key.clone(), value.clone());
                }
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Expected values for one operator/key.
    pub fn get(&self, operator: ConditionOperator, key: &str) -> Option<&[Token]> {
        self.entries
            .get(&operator)
            .and_then(|keys| keys.get(key))
            .map(Vec::as_slice)
    }

    /// True when any operator constrains `key`.
    pub fn has_key(&self, key: &str) -> bool {
        self.entries.values().any(|keys| keys.contains_key(key))
    }

    /// Evaluate against the request context.
    ///
    /// Expected values that cannot be resolved in `ctx` never match.
    pub fn evaluate(&self, request: &BTreeMap<String, String>, ctx: &StackContext) -> bool {
        self.entries.iter().all(|(operator, keys)| {
            keys.iter().all(|(key, expected)| match request.get(key) {
                None => operator.is_negated(),
                Some(actual) => {
                    let mut resolved = expected.iter().map(|t| t.resolve(ctx));
                    if operator.is_negated() {
                        resolved.all(|e| e.is_some_and(|e| operator.test(&e, actual)))
                    } else {
                        resolved.any(|e| e.is_some_and(|e| operator.test(&e, actual)))
                    }
                }
            })
        })
    }
}

impl Serialize for Conditions {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (operator, keys) in &self.entries {
            let rendered: BTreeMap<&str, SingleOrMany<'_>> = keys
                .iter()
                .map(|(k, v)| (k.as_str(), SingleOrMany(v)))
                .collect();
            map.serialize_entry(operator.as_str(), &rendered)?;
        }
        map.end()
    }
}

/// Renders a one-element list as a scalar, the way IAM documents are
/// usually written.
pub(crate) struct SingleOrMany<'a, T: Serialize = Token>(pub &'a [T]);

impl<T: Serialize> Serialize for SingleOrMany<'_, T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0 {
            [single] => single.serialize(serializer),
            many => many.serialize(serializer),
        }
    }
}
