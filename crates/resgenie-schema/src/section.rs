use serde::Serialize;

use crate::entry::Entry;
use crate::error::{SchemaError, SchemaResult};
use crate::require_text;

/// Titled group of entries, kept in display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
    title: String,
    entries: Vec<Entry>,
}

impl Section {
    pub fn new(title: &str, entries: Vec<Entry>) -> SchemaResult<Self> {
        let title = require_text("title", title)?;
        if entries.is_empty() {
            return Err(SchemaError::Empty { field: "entries" });
        }
        Ok(Section { title, entries })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }
}
