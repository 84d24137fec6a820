use thiserror::Error;

/// Reasons a schema constructor refuses a value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("{field} must not be empty")]
    Empty { field: &'static str },

    #[error("'{value}' is not a valid email address")]
    MalformedEmail { value: String },

    #[error("'{value}' is not a valid phone number: {reason}")]
    MalformedPhone { value: String, reason: &'static str },

    #[error("'{value}' is not a valid URL: {reason}")]
    MalformedUrl { value: String, reason: String },

    #[error("'{value}' is not a valid date (expected {expected})")]
    MalformedDate {
        value: String,
        expected: &'static str,
    },

    #[error("end date {end} is before start date {start}")]
    DateOrder { start: String, end: String },

    #[error("skill rank {rank} is shared by {}", names.join(", "))]
    DuplicateRank { rank: i64, names: Vec<String> },
}

pub type SchemaResult<T> = Result<T, SchemaError>;
