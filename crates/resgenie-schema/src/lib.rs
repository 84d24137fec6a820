//! Typed resume model.
//!
//! Every type in this crate is built through a constructor that rejects
//! structurally invalid values up front, so a [`Resume`] that exists is a
//! resume that satisfies its invariants. Nothing here mutates after
//! construction; accessors hand out shared references only.

mod contact;
mod entry;
mod error;
mod resume;
mod section;
mod skills;

pub use contact::{Contact, Email, Link, Phone, WebUrl};
pub use entry::{EndDate, Entry, EntryDate, EntryParts};
pub use error::{SchemaError, SchemaResult};
pub use resume::Resume;
pub use section::Section;
pub use skills::SkillGroup;

/// Trim `value` and collapse internal whitespace runs to one space, the form
/// in which text is rendered.
pub(crate) fn normalize_text(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalize `value` and fail with [`SchemaError::Empty`] when nothing is left.
pub(crate) fn require_text(field: &'static str, value: &str) -> SchemaResult<String> {
    let text = normalize_text(value);
    if text.is_empty() {
        return Err(SchemaError::Empty { field });
    }
    Ok(text)
}

/// Normalize an optional value, collapsing blank strings to `None`.
pub(crate) fn optional_text(value: Option<&str>) -> Option<String> {
    value.map(normalize_text).filter(|text| !text.is_empty())
}
