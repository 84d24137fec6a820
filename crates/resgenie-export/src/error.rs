use std::io;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("PDF engine '{engine}' was not found; install it or set export.engine")]
    EngineUnavailable { engine: String },

    #[error("PDF engine '{engine}' did not finish within {}s", .timeout.as_secs_f64())]
    Timeout { engine: String, timeout: Duration },

    #[error("refusing to export malformed HTML: {reason}")]
    InvalidMarkup { reason: &'static str },

    #[error("PDF engine {}: {diagnostic}", describe_status(.status))]
    EngineFailed {
        status: Option<i32>,
        diagnostic: String,
    },

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },
}

impl ExportError {
    pub(crate) fn io(context: impl Into<String>, source: io::Error) -> Self {
        ExportError::Io {
            context: context.into(),
            source,
        }
    }

    /// Whether running the same export again could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ExportError::Timeout { .. } | ExportError::Io { .. })
    }
}

fn describe_status(status: &Option<i32>) -> String {
    match status {
        Some(code) => format!("exited with status {code}"),
        None => "was terminated by a signal".to_string(),
    }
}
