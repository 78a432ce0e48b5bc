//! Automation document parameters.
//!
//! FIS passes `documentParameters` to SSM as one JSON string. Values may be
//! deferred (a function name, a role ARN), so the string is assembled as a
//! token: literal JSON punctuation around JSON-quoted value tokens.

use chaos_core::Token;

/// One parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterValue {
    String(Token),
    Integer(i64),
}

impl From<Token> for ParameterValue {
    fn from(value: Token) -> Self {
        ParameterValue::String(value)
    }
}

impl From<&Token> for ParameterValue {
    fn from(value: &Token) -> Self {
        ParameterValue::String(value.clone())
    }
}

impl From<&str> for ParameterValue {
    fn from(value: &str) -> Self {
        ParameterValue::String(Token::literal(value))
    }
}

impl From<String> for ParameterValue {
    fn from(value: String) -> Self {
        ParameterValue::String(Token::Literal(value))
    }
}

impl From<i64> for ParameterValue {
    fn from(value: i64) -> Self {
        ParameterValue::Integer(value)
    }
}

impl From<u32> for ParameterValue {
    fn from(value: u32) -> Self {
        ParameterValue::Integer(i64::from(value))
    }
}

/// Ordered parameter mapping. Setting an existing name replaces its value
/// in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentParameters {
    entries: Vec<(String, ParameterValue)>,
}

impl DocumentParameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<ParameterValue>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<ParameterValue>) -> Self {
        self.set(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&ParameterValue> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The mapping as a JSON object string.
    pub fn to_json(&self) -> Token {
        let mut parts = vec![Token::literal("{")];
        for (i, (name, value)) in self.entries.iter().enumerate() {
            if i > 0 {
                parts.push(Token::literal(","));
            }
            parts.push(Token::literal(name.as_str()).to_json_string());
            parts.push(Token::literal(":"));
            match value {
                ParameterValue::String(token) => parts.push(token.to_json_string()),
                ParameterValue::Integer(n) => parts.push(Token::literal(n.to_string())),
            }
        }
        parts.push(Token::literal("}"));
        Token::concat(parts)
    }
}
