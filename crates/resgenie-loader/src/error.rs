use std::fmt;

use resgenie_schema::SchemaError;
use serde::Serialize;

use crate::path::FieldPath;

/// Category of a validation failure.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ValidationKind {
    MissingField,
    TypeMismatch,
    DateOrderViolation,
    MalformedUrl,
    MalformedEmail,
    MalformedPhone,
    MalformedDate,
    EmptyValue,
    DuplicateRank,
}

impl ValidationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ValidationKind::MissingField => "missing-field",
            ValidationKind::TypeMismatch => "type-mismatch",
            ValidationKind::DateOrderViolation => "date-order-violation",
            ValidationKind::MalformedUrl => "malformed-url",
            ValidationKind::MalformedEmail => "malformed-email",
            ValidationKind::MalformedPhone => "malformed-phone",
            ValidationKind::MalformedDate => "malformed-date",
            ValidationKind::EmptyValue => "empty-value",
            ValidationKind::DuplicateRank => "duplicate-rank",
        }
    }

    pub(crate) fn for_schema_error(error: &SchemaError) -> Self {
        match error {
            SchemaError::Empty { .. } => ValidationKind::EmptyValue,
            SchemaError::MalformedEmail { .. } => ValidationKind::MalformedEmail,
            SchemaError::MalformedPhone { .. } => ValidationKind::MalformedPhone,
            SchemaError::MalformedUrl { .. } => ValidationKind::MalformedUrl,
            SchemaError::MalformedDate { .. } => ValidationKind::MalformedDate,
            SchemaError::DateOrder { .. } => ValidationKind::DateOrderViolation,
            SchemaError::DuplicateRank { .. } => ValidationKind::DuplicateRank,
        }
    }
}

impl fmt::Display for ValidationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Single problem found in the input, anchored to a field path.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub path: FieldPath,
    pub kind: ValidationKind,
    pub message: String,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} [{}]", self.path, self.message, self.kind)
    }
}

/// Every issue found during one load, in discovery order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(pub Vec<ValidationIssue>);

impl ValidationErrors {
    pub fn iter(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// First issue reported at exactly `path`.
    pub fn find(&self, path: &str) -> Option<&ValidationIssue> {
        self.0.iter().find(|issue| issue.path.to_string() == path)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "resume failed validation with {} issue(s):", self.0.len())?;
        for issue in &self.0 {
            write!(f, "\n- {issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}
