//! Deferred values.
//!
//! A [`Token`] stands for a string whose final value is only known once the
//! deployment engine resolves the template: pseudo parameters such as the
//! account id, references to other resources, or concatenations of both.
//! Tokens render to CloudFormation intrinsic functions (`Ref`,
//! `Fn::GetAtt`, `Fn::Join`) and never trigger a lookup of their own.

use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fmt;

use crate::construct::LogicalId;
use crate::context::StackContext;

/// CloudFormation pseudo parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Pseudo {
    AccountId,
    Region,
    Partition,
    StackName,
    UrlSuffix,
}

impl Pseudo {
    /// The name used in a `Ref`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Pseudo::AccountId => "AWS::AccountId",
            Pseudo::Region => "AWS::Region",
            Pseudo::Partition => "AWS::Partition",
            Pseudo::StackName => "AWS::StackName",
            Pseudo::UrlSuffix => "AWS::URLSuffix",
        }
    }
}

/// A string value that may be resolved only at deployment time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Token {
    /// A plain string known at synthesis time.
    Literal(String),
    /// A pseudo parameter such as `AWS::Region`.
    Pseudo(Pseudo),
    /// `Ref` to a resource declared in the same template.
    Ref(LogicalId),
    /// `Fn::GetAtt` on a resource declared in the same template.
    GetAtt {
        logical_id: LogicalId,
        attribute: String,
    },
    /// Concatenation of parts (`Fn::Join` with an empty delimiter).
    Join(Vec<Token>),
}

impl Token {
    pub fn literal(value: impl Into<String>) -> Self {
        Token::Literal(value.into())
    }

    /// The empty string.
    pub fn empty() -> Self {
        Token::Literal(String::new())
    }

    pub fn reference(logical_id: &LogicalId) -> Self {
        Token::Ref(logical_id.clone())
    }

    pub fn get_att(logical_id: &LogicalId, attribute: impl Into<String>) -> Self {
        Token::GetAtt {
            logical_id: logical_id.clone(),
            attribute: attribute.into(),
        }
    }

    /// Concatenate parts into one token.
    ///
    /// Nested joins are flattened, adjacent literals merged and empty
    /// literals dropped, so a concatenation of literals is itself a literal.
    pub fn concat<I>(parts: I) -> Token
    where
        I: IntoIterator<Item = Token>,
    {
        let mut out: Vec<Token> = Vec::new();
        for part in parts {
            match part {
                Token::Join(inner) => {
                    for p in inner {
                        push_part(&mut out, p);
                    }
                }
                other => push_part(&mut out, other),
            }
        }

        match out.len() {
            0 => Token::empty(),
            1 => out.remove(0),
            _ => Token::Join(out),
        }
    }

    /// Returns the string if the token holds no deferred parts.
    pub fn as_literal(&self) -> Option<&str> {
        match self {
            Token::Literal(s) => Some(s),
            _ => None,
        }
    }

    /// True when the value is fully known at synthesis time.
    pub fn is_resolved(&self) -> bool {
        self.as_literal().is_some()
    }

    /// The parts of this token, a single-element slice unless it is a join.
    pub fn parts(&self) -> &[Token] {
        match self {
            Token::Join(parts) => parts,
            other => std::slice::from_ref(other),
        }
    }

    /// Logical ids of every resource this token refers to.
    pub fn references(&self) -> Vec<&LogicalId> {
        let mut refs = Vec::new();
        for part in self.parts() {
            match part {
                Token::Ref(id) | Token::GetAtt { logical_id: id, .. } => refs.push(id),
                _ => {}
            }
        }
        refs
    }

    /// Resolve against a stack context.
    ///
    /// Pseudo parameters resolve only when the context pins them; resource
    /// references never resolve locally.
    pub fn resolve(&self, ctx: &StackContext) -> Option<String> {
        match self {
            Token::Literal(s) => Some(s.clone()),
            Token::Pseudo(Pseudo::AccountId) => ctx.environment().account.clone(),
            Token::Pseudo(Pseudo::Region) => ctx.environment().region.clone(),
            Token::Pseudo(Pseudo::Partition) => Some(ctx.environment().partition().to_string()),
            Token::Pseudo(Pseudo::StackName) => Some(ctx.stack_name().to_string()),
            Token::Pseudo(Pseudo::UrlSuffix) => Some("amazonaws.com".to_string()),
            Token::Ref(_) | Token::GetAtt { .. } => None,
            Token::Join(parts) => {
                let mut out = String::new();
                for part in parts {
                    out.push_str(&part.resolve(ctx)?);
                }
                Some(out)
            }
        }
    }

    /// Encode this value as a JSON string literal (quotes included).
    ///
    /// Literal parts are escaped; deferred parts stay deferred so the
    /// resulting token can be embedded in a larger JSON payload.
    pub fn to_json_string(&self) -> Token {
        let mut parts = vec![Token::literal("\"")];
        for part in self.parts() {
            match part {
                Token::Literal(s) => parts.push(Token::Literal(escape_json(s))),
                other => parts.push(other.clone()),
            }
        }
        parts.push(Token::literal("\""));
        Token::concat(parts)
    }
}

fn push_part(out: &mut Vec<Token>, part: Token) {
    if let Token::Literal(s) = &part {
        if s.is_empty() {
            return;
        }
        if let Some(Token::Literal(last)) = out.last_mut() {
            last.push_str(s);
            return;
        }
    }
    out.push(part);
}

fn escape_json(s: &str) -> String {
    let quoted = serde_json::Value::String(s.to_string()).to_string();
    quoted[1..quoted.len() - 1].to_string()
}

impl From<&str> for Token {
    fn from(value: &str) -> Self {
        Token::Literal(value.to_string())
    }
}

impl From<String> for Token {
    fn from(value: String) -> Self {
        Token::Literal(value)
    }
}

impl From<&String> for Token {
    fn from(value: &String) -> Self {
        Token::Literal(value.clone())
    }
}

impl From<Pseudo> for Token {
    fn from(value: Pseudo) -> Self {
        Token::Pseudo(value)
    }
}

impl From<&Token> for Token {
    fn from(value: &Token) -> Self {
        value.clone()
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Literal(s) => write!(f, "{}", s),
            Token::Pseudo(p) => write!(f, "${{{}}}", p.as_str()),
            Token::Ref(id) => write!(f, "${{{}}}", id),
            Token::GetAtt {
                logical_id,
                attribute,
            } => write!(f, "${{{}.{}}}", logical_id, attribute),
            Token::Join(parts) => {
                for part in parts {
                    write!(f, "{}", part)?;
                }
                Ok(())
            }
        }
    }
}

impl Serialize for Token {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Token::Literal(s) => serializer.serialize_str(s),
            Token::Pseudo(p) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("Ref", p.as_str())?;
                map.end()
            }
            Token::Ref(id) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("Ref", id.as_str())?;
                map.end()
            }
            Token::GetAtt {
                logical_id,
                attribute,
            } => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("Fn::GetAtt", &[logical_id.as_str(), attribute.as_str()])?;
                map.end()
            }
            Token::Join(parts) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("Fn::Join", &("", parts))?;
                map.end()
            }
        }
    }
}
