use std::borrow::Cow;
use std::fmt::Write as _;

use chrono::format::{Item, StrftimeItems};
use resgenie_schema::{EndDate, Entry, EntryDate, Link, Resume, Section, SkillGroup};
use tracing::debug;

use crate::error::TemplateError;
use crate::escape::escape_markdown;
use crate::parse::{Condition, Node, Template};
use crate::placeholder::{Collection, Placeholder};
use crate::tree::{self, DocumentTree};

const DEFAULT_PRESENT_LABEL: &str = "Present";
const DEFAULT_DATE_FORMAT: &str = "%b %Y";

/// Presentation choices applied while substituting values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindOptions {
    /// Text shown for an open-ended or missing end date.
    pub present_label: String,
    /// `chrono` strftime pattern for entry dates.
    pub date_format: String,
}

impl Default for BindOptions {
    fn default() -> Self {
        BindOptions {
            present_label: DEFAULT_PRESENT_LABEL.to_string(),
            date_format: DEFAULT_DATE_FORMAT.to_string(),
        }
    }
}

/// Output of [`bind`]: the substituted Markdown and its parsed tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundDocument {
    pub markdown: String,
    pub tree: DocumentTree,
}

/// Substitute `resume` into `template`.
pub fn bind(
    resume: &Resume,
    template: &Template,
    options: &BindOptions,
) -> Result<BoundDocument, TemplateError> {
    if StrftimeItems::new(&options.date_format).any(|item| matches!(item, Item::Error)) {
        return Err(TemplateError::InvalidDateFormat {
            format: options.date_format.clone(),
        });
    }

    let mut binder = Binder {
        resume,
        options,
        out: String::new(),
    };
    binder.nodes(template.nodes(), Frame::default())?;
    let markdown = binder.out;

    let tree = tree::build(&markdown).map_err(|unsupported| TemplateError::UnsupportedMarkup {
        line: unsupported.line,
        construct: unsupported.construct,
    })?;

    debug!(
        template = template.name(),
        bytes = markdown.len(),
        blocks = tree.blocks.len(),
        "bound template"
    );
    Ok(BoundDocument { markdown, tree })
}

/// Elements bound by the enclosing collection blocks.
#[derive(Clone, Copy, Default)]
struct Frame<'r> {
    section: Option<&'r Section>,
    entry: Option<&'r Entry>,
    bullet: Option<&'r str>,
    detail: Option<&'r str>,
    link: Option<&'r Link>,
    skill: Option<&'r SkillGroup>,
}

enum Value<'r> {
    Text(Cow<'r, str>),
    Url(&'r str),
    Absent,
}

struct Binder<'r> {
    resume: &'r Resume,
    options: &'r BindOptions,
    out: String,
}

impl<'r> Binder<'r> {
    fn nodes(&mut self, nodes: &[Node], frame: Frame<'r>) -> Result<(), TemplateError> {
        for node in nodes {
            match node {
                Node::Text(text) => self.out.push_str(text),
                Node::Value(placeholder) => match self.value(*placeholder, frame)? {
                    Value::Text(text) => self.out.push_str(&escape_markdown(&text)),
                    Value::Url(url) => self.out.push_str(url),
                    Value::Absent => {}
                },
                Node::Each { collection, body } => self.each(*collection, body, frame)?,
                Node::When { condition, body } => {
                    if self.holds(*condition, frame)? {
                        self.nodes(body, frame)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn each(
        &mut self,
        collection: Collection,
        body: &[Node],
        frame: Frame<'r>,
    ) -> Result<(), TemplateError> {
        let resume = self.resume;
        match collection {
            Collection::Sections => {
                for section in resume.sections() {
                    self.nodes(body, Frame { section: Some(section), ..frame })?;
                }
            }
            Collection::Entries => {
                let entries = frame.section.map(Section::entries).unwrap_or_default();
                for entry in entries {
                    self.nodes(body, Frame { entry: Some(entry), ..frame })?;
                }
            }
            Collection::Bullets => {
                let bullets = frame.entry.map(Entry::bullets).unwrap_or_default();
                for bullet in bullets {
                    let bullet = Some(bullet.as_str());
                    self.nodes(body, Frame { bullet, ..frame })?;
                }
            }
            Collection::Details => {
                let details = frame.entry.map(Entry::details).unwrap_or_default();
                for detail in details {
                    let detail = Some(detail.as_str());
                    self.nodes(body, Frame { detail, ..frame })?;
                }
            }
            Collection::Links => {
                for link in resume.contact().links() {
                    self.nodes(body, Frame { link: Some(link), ..frame })?;
                }
            }
            Collection::Skills => {
                for skill in resume.skills_by_rank() {
                    self.nodes(body, Frame { skill: Some(skill), ..frame })?;
                }
            }
        }
        Ok(())
    }

    fn holds(&self, condition: Condition, frame: Frame<'r>) -> Result<bool, TemplateError> {
        let resume = self.resume;
        Ok(match condition {
            Condition::Present(placeholder) => {
                !matches!(self.value(placeholder, frame)?, Value::Absent)
            }
            Condition::NonEmpty(Collection::Sections) => !resume.sections().is_empty(),
            Condition::NonEmpty(Collection::Entries) => frame
                .section
                .map_or(false, |section| !section.entries().is_empty()),
            Condition::NonEmpty(Collection::Bullets) => frame
                .entry
                .map_or(false, |entry| !entry.bullets().is_empty()),
            Condition::NonEmpty(Collection::Details) => frame
                .entry
                .map_or(false, |entry| !entry.details().is_empty()),
            Condition::NonEmpty(Collection::Links) => !resume.contact().links().is_empty(),
            Condition::NonEmpty(Collection::Skills) => !resume.skills().is_empty(),
        })
    }

    fn value(&self, placeholder: Placeholder, frame: Frame<'r>) -> Result<Value<'r>, TemplateError> {
        let resume = self.resume;
        let contact = resume.contact();
        let text = |value: Option<&'r str>| match value {
            Some(value) => Value::Text(Cow::Borrowed(value)),
            None => Value::Absent,
        };

        let value = match placeholder {
            Placeholder::ContactName => text(Some(contact.name())),
            Placeholder::ContactEmail => text(Some(contact.email().as_str())),
            Placeholder::ContactPhone => text(contact.phone().map(|phone| phone.as_str())),
            Placeholder::ContactLocation => text(contact.location()),
            Placeholder::Summary => text(resume.summary()),
            Placeholder::LinkLabel => text(frame.link.map(Link::label)),
            Placeholder::LinkUrl => match frame.link {
                Some(link) => Value::Url(link.url().as_str()),
                None => Value::Absent,
            },
            Placeholder::SectionTitle => text(frame.section.map(Section::title)),
            Placeholder::EntryHeading => text(frame.entry.map(Entry::heading)),
            Placeholder::EntryOrganization => text(frame.entry.and_then(Entry::organization)),
            Placeholder::EntryLocation => text(frame.entry.and_then(Entry::location)),
            Placeholder::EntrySummary => text(frame.entry.and_then(Entry::summary)),
            Placeholder::EntryStartDate => match frame.entry {
                Some(entry) => Value::Text(self.format_date(entry.start_date())?.into()),
                None => Value::Absent,
            },
            Placeholder::EntryEndDate => match frame.entry {
                Some(entry) => Value::Text(self.end_date(entry)?),
                None => Value::Absent,
            },
            Placeholder::EntryDates => match frame.entry {
                Some(entry) => {
                    let start = self.format_date(entry.start_date())?;
                    let end = self.end_date(entry)?;
                    Value::Text(format!("{start} – {end}").into())
                }
                None => Value::Absent,
            },
            Placeholder::Bullet => text(frame.bullet),
            Placeholder::Detail => text(frame.detail),
            Placeholder::SkillName => text(frame.skill.map(SkillGroup::name)),
            Placeholder::SkillItems => match frame.skill {
                Some(skill) => Value::Text(skill.items().join(", ").into()),
                None => Value::Absent,
            },
        };
        Ok(value)
    }

    fn end_date(&self, entry: &Entry) -> Result<Cow<'r, str>, TemplateError> {
        let options: &'r BindOptions = self.options;
        match entry.end_date() {
            Some(EndDate::On(date)) => Ok(self.format_date(date)?.into()),
            Some(EndDate::Present) | None => Ok(Cow::Borrowed(options.present_label.as_str())),
        }
    }

    fn format_date(&self, date: EntryDate) -> Result<String, TemplateError> {
        let mut formatted = String::new();
        write!(formatted, "{}", date.date().format(&self.options.date_format)).map_err(|_| {
            TemplateError::InvalidDateFormat {
                format: self.options.date_format.clone(),
            }
        })?;
        Ok(formatted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use resgenie_schema::{Contact, Email, EntryParts, WebUrl};

    fn resume() -> Resume {
        let entry = Entry::new(
            EntryParts {
                heading: "Engineer",
                organization: Some("Acme"),
                bullets: vec!["Built *X*".to_string()],
                details: vec!["Focus: Backend".to_string()],
                ..EntryParts::default()
            },
            EntryDate::parse("2020-01-01", false).expect("date"),
            Some(EndDate::Present),
        )
        .expect("entry");
        let contact = Contact::new(
            "A. Author",
            Email::parse("a@example.com").expect("email"),
            None,
            None,
            vec![Link::new(
                Some("Site"),
                WebUrl::parse("https://example.com/a_b").expect("url"),
            )],
        )
        .expect("contact");
        let section = Section::new("Experience", vec![entry]).expect("section");
        Resume::new(contact, None, vec![section], Vec::new()).expect("resume")
    }

    fn bind_source(source: &str, options: &BindOptions) -> Result<BoundDocument, TemplateError> {
        let template = Template::parse("test", source).expect("template parses");
        bind(&resume(), &template, options)
    }

    #[test]
    fn substitutes_escaped_text_and_verbatim_urls() {
        let bound = bind_source(
            "# {{contact.name}}\n{{#contact.links}}\n[{{link.label}}](<{{link.url}}>)\n{{/contact.links}}\n",
            &BindOptions::default(),
        )
        .expect("binds");
        assert_eq!(
            bound.markdown,
            "# A\\. Author\n[Site](<https://example.com/a_b>)\n"
        );
    }

    #[test]
    fn absent_optionals_skip_blocks_and_end_dates_use_present_label() {
        let source = "{{#sections}}\n{{#section.entries}}\n{{entry.heading}}{{#entry.location}} in {{entry.location}}{{/entry.location}}: {{entry.dates}}\n{{/section.entries}}\n{{/sections}}\n{{?skills}}\nSkills!\n{{/skills}}\n";
        let options = BindOptions {
            present_label: "now".to_string(),
            date_format: "%Y-%m".to_string(),
        };
        let bound = bind_source(source, &options).expect("binds");
        assert_eq!(bound.markdown, "Engineer: 2020\\-01 – now\n");
    }

    #[test]
    fn bullets_are_escaped() {
        let bound = bind_source(
            "{{#sections}}\n{{#section.entries}}\n{{#entry.bullets}}\n- {{bullet}}\n{{/entry.bullets}}\n{{/section.entries}}\n{{/sections}}\n",
            &BindOptions::default(),
        )
        .expect("binds");
        assert_eq!(bound.markdown, "- Built \\*X\\*\n");

        let tree::Block::List { items, .. } = &bound.tree.blocks[0] else {
            panic!("expected a list, got {:?}", bound.tree.blocks);
        };
        let tree::Block::Plain(inlines) = &items[0].blocks[0] else {
            panic!("expected plain item content, got {:?}", items[0]);
        };
        assert_eq!(tree::plain_text(inlines), "Built *X*");
    }

    #[test]
    fn details_bind_inside_their_entry() {
        let bound = bind_source(
            "{{#sections}}\n{{#section.entries}}\n{{?entry.details}}\nFacts:\n{{/entry.details}}\n{{#entry.details}}\n- {{detail}}\n{{/entry.details}}\n{{/section.entries}}\n{{/sections}}\n",
            &BindOptions::default(),
        )
        .expect("binds");
        assert_eq!(bound.markdown, "Facts:\n- Focus: Backend\n");
    }

    #[test]
    fn rejects_invalid_date_format() {
        let options = BindOptions {
            date_format: "%Y-%".to_string(),
            ..BindOptions::default()
        };
        let err = bind_source("# {{contact.name}}\n", &options).unwrap_err();
        assert!(matches!(err, TemplateError::InvalidDateFormat { .. }));
    }
}
