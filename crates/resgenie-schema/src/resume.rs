use serde::Serialize;

use crate::contact::Contact;
use crate::error::{SchemaError, SchemaResult};
use crate::optional_text;
use crate::section::Section;
use crate::skills::SkillGroup;

/// Root aggregate: one person's complete resume content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resume {
    contact: Contact,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<String>,
    sections: Vec<Section>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    skills: Vec<SkillGroup>,
}

impl Resume {
    pub fn new(
        contact: Contact,
        summary: Option<&str>,
        sections: Vec<Section>,
        skills: Vec<SkillGroup>,
    ) -> SchemaResult<Self> {
        if sections.is_empty() {
            return Err(SchemaError::Empty { field: "sections" });
        }
        if let Some(conflict) = SkillGroup::rank_conflicts(&skills).into_iter().next() {
            return Err(conflict);
        }

        Ok(Resume {
            contact,
            summary: optional_text(summary),
            sections,
            skills,
        })
    }

    pub fn contact(&self) -> &Contact {
        &self.contact
    }

    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Skill groups in input order.
    pub fn skills(&self) -> &[SkillGroup] {
        &self.skills
    }

    /// Skill groups ordered by ascending rank.
    pub fn skills_by_rank(&self) -> Vec<&SkillGroup> {
        let mut ordered: Vec<&SkillGroup> = self.skills.iter().collect();
        ordered.sort_by_key(|group| group.rank());
        ordered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Email, Entry, EntryDate, EntryParts};

    fn contact() -> Contact {
        Contact::new(
            "A. Author",
            Email::parse("a@example.com").unwrap(),
            None,
            None,
            Vec::new(),
        )
        .unwrap()
    }

    fn section(title: &str) -> Section {
        let entry = Entry::new(
            EntryParts {
                heading: "Engineer",
                ..EntryParts::default()
            },
            EntryDate::parse("2020-01-01", false).unwrap(),
            None,
        )
        .unwrap();
        Section::new(title, vec![entry]).unwrap()
    }

    #[test]
    fn requires_at_least_one_section() {
        assert_eq!(
            Resume::new(contact(), None, Vec::new(), Vec::new()),
            Err(SchemaError::Empty { field: "sections" })
        );
    }

    #[test]
    fn orders_skills_by_rank_without_touching_input_order() {
        let skills = vec![
            SkillGroup::new("tools", 3, vec!["git".into()]).unwrap(),
            SkillGroup::new("languages", 1, vec!["rust".into()]).unwrap(),
        ];
        let resume = Resume::new(contact(), Some("  "), vec![section("Work")], skills).unwrap();

        let ranked: Vec<&str> = resume.skills_by_rank().iter().map(|g| g.name()).collect();
        assert_eq!(ranked, ["languages", "tools"]);
        assert_eq!(resume.skills()[0].name(), "tools");
        assert_eq!(resume.summary(), None);
    }

    #[test]
    fn serializes_to_plain_json() {
        let resume = Resume::new(contact(), None, vec![section("Work")], Vec::new()).unwrap();
        let json = serde_json::to_value(&resume).unwrap();
        assert_eq!(json["contact"]["email"], "a@example.com");
        assert_eq!(json["sections"][0]["entries"][0]["start_date"], "2020-01-01");
    }
}
