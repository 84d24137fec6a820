use serde::Serialize;

use crate::error::{SchemaError, SchemaResult};
use crate::{normalize_text, require_text};

/// Named bucket of skills with a display rank (lower ranks first).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkillGroup {
    name: String,
    rank: i64,
    items: Vec<String>,
}

impl SkillGroup {
    pub fn new(name: &str, rank: i64, items: Vec<String>) -> SchemaResult<Self> {
        let name = require_text("skills", name)?;
        let items: Vec<String> = items
            .into_iter()
            .map(|item| normalize_text(&item))
            .filter(|item| !item.is_empty())
            .collect();
        if items.is_empty() {
            return Err(SchemaError::Empty { field: "items" });
        }
        Ok(SkillGroup { name, rank, items })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rank(&self) -> i64 {
        self.rank
    }

    pub fn items(&self) -> &[String] {
        &self.items
    }

    /// Report every rank shared by more than one group, in first-seen order.
    pub fn rank_conflicts(groups: &[SkillGroup]) -> Vec<SchemaError> {
        let mut seen: Vec<(i64, Vec<String>)> = Vec::new();
        for group in groups {
            match seen.iter_mut().find(|(rank, _)| *rank == group.rank) {
                Some((_, names)) => names.push(group.name.clone()),
                None => seen.push((group.rank, vec![group.name.clone()])),
            }
        }

        seen.into_iter()
            .filter(|(_, names)| names.len() > 1)
            .map(|(rank, names)| SchemaError::DuplicateRank { rank, names })
            .collect()
    }
}
