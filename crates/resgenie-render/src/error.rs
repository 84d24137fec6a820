use thiserror::Error;

/// Structural problems in a document tree. These indicate a defect in the
/// binder rather than bad user input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("heading level {level} is outside 1..=6")]
    InvalidHeadingLevel { level: u8 },

    #[error("table row {row} has {found} cells but the header has {expected}")]
    RaggedTable {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("link '{text}' has an empty destination")]
    EmptyLink { text: String },
}
