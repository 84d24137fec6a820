//! Turns a parsed YAML/JSON mapping into a validated [`Resume`].
//!
//! The loader never stops at the first problem: every issue it can detect in
//! one pass is collected with the path of the offending field, so a single run
//! tells the author everything that needs fixing.

mod error;
mod load;
mod path;
pub mod source;

pub use error::{ValidationErrors, ValidationIssue, ValidationKind};
pub use load::load;
pub use path::FieldPath;
pub use resgenie_config::ValidationSettings;
pub use resgenie_schema::Resume;
pub use source::{parse_document, read_document, DocumentFormat, SourceError};
