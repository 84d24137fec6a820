use thiserror::Error;

/// Problems with a template, detected while parsing it or binding it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("line {line}: unknown placeholder '{key}'")]
    UnknownPlaceholder { line: usize, key: String },

    #[error("line {line}: '{key}' is used outside a '{scope}' block")]
    OutOfScope {
        line: usize,
        key: String,
        scope: &'static str,
    },

    #[error("line {line}: {detail}")]
    UnbalancedBlock { line: usize, detail: String },

    #[error("line {line}: {construct} is not supported in resume templates")]
    UnsupportedMarkup {
        line: usize,
        construct: &'static str,
    },

    #[error("'{format}' is not a valid date format")]
    InvalidDateFormat { format: String },

    #[error("no built-in template named '{name}'")]
    UnknownBuiltin { name: String },
}

impl TemplateError {
    /// Template line the error points at, if any.
    pub fn line(&self) -> Option<usize> {
        match self {
            TemplateError::UnknownPlaceholder { line, .. }
            | TemplateError::OutOfScope { line, .. }
            | TemplateError::UnbalancedBlock { line, .. }
            | TemplateError::UnsupportedMarkup { line, .. } => Some(*line),
            TemplateError::InvalidDateFormat { .. } | TemplateError::UnknownBuiltin { .. } => None,
        }
    }
}
