//! Policy documents.

use serde::Serialize;

use crate::statement::PolicyStatement;

/// IAM policy language version.
pub const POLICY_VERSION: &str = "2012-10-17";

/// Inline policy size limit enforced by IAM, in characters.
pub const MAX_INLINE_POLICY_SIZE: usize = 10_240;

/// An identity policy document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PolicyDocument {
    #[serde(rename = "Statement")]
    statements: Vec<PolicyStatement>,
    #[serde(rename = "Version")]
    version: &'static str,
}

impl PolicyDocument {
    pub fn new() -> Self {
        Self {
            statements: Vec::new(),
            version: POLICY_VERSION,
        }
    }

    pub fn from_statements(statements: impl IntoIterator<Item = PolicyStatement>) -> Self {
        let mut doc = Self::new();
        for statement in statements {
            doc.add_statement(statement);
        }
        doc
    }

    /// Append a statement; an identical statement is only kept once.
    pub fn add_statement(&mut self, statement: PolicyStatement) {
        if !self.statements.contains(&statement) {
            self.statements.push(statement);
        }
    }

    pub fn statements(&self) -> &[PolicyStatement] {
        &self.statements
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    /// Length of the minified JSON rendering.
    pub fn rendered_len(&self) -> Result<usize, serde_json::Error> {
        serde_json::to_string(self).map(|s| s.len())
    }
}

impl Default for PolicyDocument {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_document_shape_and_dedup() {
        let statement = PolicyStatement::allow(["logs:CreateLogDelivery"], ["*"]).unwrap();
        let mut doc = PolicyDocument::new();
        doc.add_statement(statement.clone());
        doc.add_statement(statement);

        assert_eq!(doc.statements().len(), 1);
        assert_eq!(
            serde_json::to_value(&doc).unwrap(),
            json!({
                "Statement": [{
                    "Action": "logs:CreateLogDelivery",
                    "Effect": "Allow",
                    "Resource": "*"
                }],
                "Version": "2012-10-17"
            })
        );
        assert!(doc.rendered_len().unwrap() < MAX_INLINE_POLICY_SIZE);
    }
}
