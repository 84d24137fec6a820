use std::io;
use std::path::PathBuf;

use resgenie_export::ExportError;
use resgenie_loader::{SourceError, ValidationErrors};
use resgenie_render::RenderError;
use resgenie_template::TemplateError;
use thiserror::Error;

/// Process exit status for each failure class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    Success = 0,
    Unexpected = 1,
    Validation = 2,
    Template = 3,
    Render = 4,
    Export = 5,
    Io = 6,
}

impl ExitCode {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Success),
            1 => Some(Self::Unexpected),
            2 => Some(Self::Validation),
            3 => Some(Self::Template),
            4 => Some(Self::Render),
            5 => Some(Self::Export),
            6 => Some(Self::Io),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    #[error("template '{name}': {source}")]
    Template {
        name: String,
        #[source]
        source: TemplateError,
    },

    #[error("failed to read template {path}: {source}")]
    TemplateFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to read stylesheet {path}: {source}")]
    Stylesheet {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("render failed: {0}")]
    Render(#[from] RenderError),

    #[error(transparent)]
    Export(#[from] ExportError),
}

impl GenerateError {
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::Source(SourceError::Io { .. }) => ExitCode::Io,
            Self::Source(_) | Self::Validation(_) => ExitCode::Validation,
            Self::Template { .. } => ExitCode::Template,
            Self::TemplateFile { .. } | Self::Stylesheet { .. } => ExitCode::Io,
            Self::Render(_) => ExitCode::Render,
            Self::Export(_) => ExitCode::Export,
        }
    }
}

pub type GenerateResult<T> = Result<T, GenerateError>;
