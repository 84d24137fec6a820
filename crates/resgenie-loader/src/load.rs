use resgenie_config::ValidationSettings;
use resgenie_schema::{
    Contact, Email, EndDate, Entry, EntryDate, EntryParts, Link, Phone, Resume, SchemaError,
    SchemaResult, Section, SkillGroup, WebUrl,
};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::{ValidationErrors, ValidationIssue, ValidationKind};
use crate::path::FieldPath;

type Object = Map<String, Value>;

const RESUME_KEYS: &[&str] = &[
    "contact",
    "summary",
    "sections",
    "experience",
    "education",
    "skills",
    "charts",
];
const CONTACT_KEYS: &[&str] = &["name", "email", "phone", "location", "address", "links"];
const SECTION_KEYS: &[&str] = &["title", "name", "entries"];
const ENTRY_KEYS: &[&str] = &[
    "heading",
    "title",
    "degree",
    "organization",
    "institution",
    "company",
    "location",
    "start_date",
    "start",
    "end_date",
    "end",
    "summary",
    "bullets",
    "highlights",
    "focus",
    "gpa",
    "specialty",
    "minor",
];

/// Top-level entry lists that each become one titled section.
const ENTRY_LISTS: &[(&str, &str)] = &[
    ("experience", "Professional Experience"),
    ("education", "Education and Course Work"),
];

/// Entry keys carried through as `Label: value` details, in display order.
const DETAIL_KEYS: &[(&str, &str)] = &[
    ("focus", "Focus"),
    ("gpa", "GPA"),
    ("specialty", "Specialty"),
    ("minor", "Minor"),
];

/// Build a [`Resume`] from a parsed document, collecting every issue found.
///
/// No partial resume is ever returned: if a single issue was recorded the
/// whole load fails with the complete list.
pub fn load(raw: &Value, settings: &ValidationSettings) -> Result<Resume, ValidationErrors> {
    let mut cx = Collector::default();
    let root = FieldPath::root();

    let resume = match raw {
        Value::Object(map) => build_resume(map, &root, settings, &mut cx),
        other => {
            cx.push(
                root,
                ValidationKind::TypeMismatch,
                format!("expected a mapping at the document root, found {}", describe(other)),
            );
            None
        }
    };

    match resume {
        Some(resume) if cx.issues.is_empty() => {
            debug!(
                sections = resume.sections().len(),
                skills = resume.skills().len(),
                "resume loaded"
            );
            Ok(resume)
        }
        _ => {
            debug!(issues = cx.issues.len(), "resume rejected");
            Err(ValidationErrors(cx.issues))
        }
    }
}

fn build_resume(
    map: &Object,
    path: &FieldPath,
    settings: &ValidationSettings,
    cx: &mut Collector,
) -> Option<Resume> {
    note_unknown_keys(map, path, RESUME_KEYS);

    let contact = cx
        .required_object(map, path, "contact")
        .and_then(|(contact_path, object)| build_contact(object, &contact_path, settings, cx));

    let summary = cx.optional_str(map, path, &["summary"]).map(|field| field.text);

    let has_entry_lists = ENTRY_LISTS
        .iter()
        .any(|(key, _)| lookup(map, &[*key]).is_some());
    let sections = if has_entry_lists && lookup(map, &["sections"]).is_none() {
        Some(Vec::new())
    } else {
        cx.required_list(map, path, &["sections"]).map(|(list_path, items)| {
            items
                .iter()
                .enumerate()
                .map(|(idx, item)| {
                    let item_path = list_path.index(idx);
                    cx.object(item, &item_path)
                        .and_then(|object| build_section(object, &item_path, settings, cx))
                })
                .collect::<Vec<_>>()
        })
    };

    let mut listed = Vec::new();
    for (key, title) in ENTRY_LISTS {
        if let Some((list_path, items)) = cx.optional_list(map, path, &[*key]) {
            listed.push(build_entry_list(title, items, &list_path, settings, cx));
        }
    }

    let skills = build_skills(map, path, cx);

    if lookup(map, &["charts"]).is_some() {
        warn!(field = %path.key("charts"), "charts are not rendered; ignoring");
    }

    let contact = contact?;
    let mut sections: Vec<Section> = sections?.into_iter().collect::<Option<_>>()?;
    let listed: Vec<Section> = listed.into_iter().collect::<Option<_>>()?;
    sections.extend(listed);
    let skills = skills?;

    cx.check(path.clone(), Resume::new(contact, summary, sections, skills))
}

fn build_contact(
    map: &Object,
    path: &FieldPath,
    settings: &ValidationSettings,
    cx: &mut Collector,
) -> Option<Contact> {
    note_unknown_keys(map, path, CONTACT_KEYS);

    let name = cx.required_str(map, path, &["name"]);
    let email = cx
        .required_str(map, path, &["email"])
        .and_then(|field| cx.check(field.path, Email::parse(field.text)));

    let phone_field = cx.optional_str(map, path, &["phone"]);
    if phone_field.is_none() && settings.require_phone && absent_or_blank(map, &["phone"]) {
        cx.push(
            path.key("phone"),
            ValidationKind::MissingField,
            "is required by the validation settings",
        );
    }
    let phone = phone_field.and_then(|field| cx.check(field.path, Phone::parse(field.text)));

    let location = contact_location(map, path, cx);
    if location.is_none()
        && settings.require_location
        && absent_or_blank(map, &["location", "address"])
    {
        cx.push(
            path.key("location"),
            ValidationKind::MissingField,
            "is required by the validation settings",
        );
    }

    let links: Vec<Option<Link>> = cx
        .optional_list(map, path, &["links"])
        .map(|(list_path, items)| {
            items
                .iter()
                .enumerate()
                .map(|(idx, item)| build_link(item, &list_path.index(idx), cx))
                .collect()
        })
        .unwrap_or_default();

    let name = name?;
    let email = email?;
    let links: Vec<Link> = links.into_iter().collect::<Option<_>>()?;

    cx.check(
        name.path.clone(),
        Contact::new(name.text, email, phone, location.as_deref(), links),
    )
}

/// `location: "City, ST"` or the structured `address: {city, state}` form.
fn contact_location(map: &Object, path: &FieldPath, cx: &mut Collector) -> Option<String> {
    if let Some(field) = cx.optional_str(map, path, &["location"]) {
        return Some(field.text.to_string());
    }

    let (key, value) = lookup(map, &["address"])?;
    let address_path = path.key(key);
    let address = cx.object(value, &address_path)?;
    let city = cx.optional_str(address, &address_path, &["city"]);
    let state = cx.optional_str(address, &address_path, &["state"]);

    let parts: Vec<&str> = [city, state]
        .into_iter()
        .flatten()
        .map(|field| field.text.trim())
        .collect();
    (!parts.is_empty()).then(|| parts.join(", "))
}

fn build_link(value: &Value, path: &FieldPath, cx: &mut Collector) -> Option<Link> {
    match value {
        Value::String(url) => cx
            .check(path.clone(), WebUrl::parse(url))
            .map(|url| Link::new(None, url)),
        Value::Object(map) => {
            let label = cx.optional_str(map, path, &["label", "name"]);
            let url = cx
                .required_str(map, path, &["url"])
                .and_then(|field| cx.check(field.path, WebUrl::parse(field.text)))?;
            Some(Link::new(label.map(|field| field.text), url))
        }
        other => {
            cx.push(
                path.clone(),
                ValidationKind::TypeMismatch,
                format!("expected a URL or a mapping with 'url', found {}", describe(other)),
            );
            None
        }
    }
}

fn build_section(
    map: &Object,
    path: &FieldPath,
    settings: &ValidationSettings,
    cx: &mut Collector,
) -> Option<Section> {
    note_unknown_keys(map, path, SECTION_KEYS);

    let title = cx.required_str(map, path, &["title", "name"]);
    let entries = cx.required_list(map, path, &["entries"]).map(|(list_path, items)| {
        items
            .iter()
            .enumerate()
            .map(|(idx, item)| {
                let item_path = list_path.index(idx);
                cx.object(item, &item_path)
                    .and_then(|object| build_entry(object, &item_path, settings, cx))
            })
            .collect::<Vec<_>>()
    });

    let title = title?;
    let entries: Vec<Entry> = entries?.into_iter().collect::<Option<_>>()?;
    cx.check(title.path, Section::new(title.text, entries))
}

/// A top-level `experience:` or `education:` list, titled by its key.
fn build_entry_list(
    title: &str,
    items: &[Value],
    path: &FieldPath,
    settings: &ValidationSettings,
    cx: &mut Collector,
) -> Option<Section> {
    if items.is_empty() {
        cx.push(path.clone(), ValidationKind::EmptyValue, "must contain at least one item");
        return None;
    }

    let entries: Vec<Option<Entry>> = items
        .iter()
        .enumerate()
        .map(|(idx, item)| {
            let item_path = path.index(idx);
            cx.object(item, &item_path)
                .and_then(|object| build_entry(object, &item_path, settings, cx))
        })
        .collect();

    let entries: Vec<Entry> = entries.into_iter().collect::<Option<_>>()?;
    cx.check(path.clone(), Section::new(title, entries))
}

fn build_entry(
    map: &Object,
    path: &FieldPath,
    settings: &ValidationSettings,
    cx: &mut Collector,
) -> Option<Entry> {
    note_unknown_keys(map, path, ENTRY_KEYS);
    let partial = settings.allow_partial_dates;

    let heading = cx.required_str(map, path, &["heading", "title", "degree"]);
    let organization = cx.optional_str(map, path, &["organization", "institution", "company"]);
    let location = cx.optional_str(map, path, &["location"]);
    let summary = cx.optional_str(map, path, &["summary"]);

    let start = cx
        .required_str(map, path, &["start_date", "start"])
        .and_then(|field| cx.check(field.path, EntryDate::parse(field.text, partial)));

    let end_field = cx.optional_str(map, path, &["end_date", "end"]);
    let end_path = end_field
        .as_ref()
        .map(|field| field.path.clone())
        .unwrap_or_else(|| path.key("end_date"));
    let end = end_field.map(|field| cx.check(field.path, EndDate::parse(field.text, partial)));

    let in_order = match (start, end) {
        (Some(start), Some(Some(end))) => cx
            .check(end_path, Entry::check_order(start, Some(end)))
            .is_some(),
        _ => true,
    };

    let bullets = cx
        .optional_list(map, path, &["bullets", "highlights"])
        .map(|(list_path, items)| text_items(items, &list_path, cx))
        .unwrap_or_default();
    let details = DETAIL_KEYS
        .iter()
        .filter_map(|(key, label)| detail(map, path, *key, label, cx))
        .collect();

    let heading = heading?;
    let start = start?;
    let end = match end {
        Some(parsed) => Some(parsed?),
        None => None,
    };
    if !in_order {
        return None;
    }

    let parts = EntryParts {
        heading: heading.text,
        organization: organization.map(|field| field.text),
        location: location.map(|field| field.text),
        summary: summary.map(|field| field.text),
        bullets,
        details,
    };
    cx.check(path.clone(), Entry::new(parts, start, end))
}

/// `Label: value` for a scalar detail field; blank values are skipped.
fn detail(
    map: &Object,
    path: &FieldPath,
    key: &'static str,
    label: &str,
    cx: &mut Collector,
) -> Option<String> {
    match lookup(map, &[key])? {
        (_, Value::String(text)) if text.trim().is_empty() => None,
        (_, Value::String(text)) => Some(format!("{label}: {text}")),
        (_, Value::Number(number)) => Some(format!("{label}: {number}")),
        (key, other) => {
            cx.push(
                path.key(key),
                ValidationKind::TypeMismatch,
                format!("expected a string or number, found {}", describe(other)),
            );
            None
        }
    }
}

/// Skills come either as a mapping `name: {rank, items}` or a list of
/// `{name, rank, items}`; `entries` is accepted in place of `items`.
fn build_skills(map: &Object, path: &FieldPath, cx: &mut Collector) -> Option<Vec<SkillGroup>> {
    let Some((key, value)) = lookup(map, &["skills"]) else {
        return Some(Vec::new());
    };
    let skills_path = path.key(key);

    let groups: Vec<Option<SkillGroup>> = match value {
        Value::Object(groups) => groups
            .iter()
            .map(|(name, group)| {
                let group_path = skills_path.key(name.as_str());
                cx.object(group, &group_path)
                    .and_then(|object| build_skill_group(Some(name.as_str()), object, &group_path, cx))
            })
            .collect(),
        Value::Array(groups) => groups
            .iter()
            .enumerate()
            .map(|(idx, group)| {
                let group_path = skills_path.index(idx);
                cx.object(group, &group_path)
                    .and_then(|object| build_skill_group(None, object, &group_path, cx))
            })
            .collect(),
        other => {
            cx.push(
                skills_path,
                ValidationKind::TypeMismatch,
                format!("expected a mapping or list of skill groups, found {}", describe(other)),
            );
            return None;
        }
    };

    let groups: Vec<SkillGroup> = groups.into_iter().collect::<Option<_>>()?;
    let conflicts = SkillGroup::rank_conflicts(&groups);
    if !conflicts.is_empty() {
        for conflict in conflicts {
            cx.schema_issue(skills_path.clone(), &conflict);
        }
        return None;
    }
    Some(groups)
}

fn build_skill_group(
    name: Option<&str>,
    map: &Object,
    path: &FieldPath,
    cx: &mut Collector,
) -> Option<SkillGroup> {
    let name = match name {
        Some(name) => Some(name),
        None => cx.required_str(map, path, &["name"]).map(|field| field.text),
    };

    let rank = match lookup(map, &["rank"]) {
        None => {
            cx.push(path.key("rank"), ValidationKind::MissingField, "is required");
            None
        }
        Some((key, value)) => match value.as_i64() {
            Some(rank) => Some(rank),
            None => {
                cx.push(
                    path.key(key),
                    ValidationKind::TypeMismatch,
                    format!("expected an integer, found {}", describe(value)),
                );
                None
            }
        },
    };

    let items = cx
        .required_list(map, path, &["items", "entries"])
        .map(|(list_path, items)| text_items(items, &list_path, cx));

    let (name, rank, items) = (name?, rank?, items?);
    cx.check(path.clone(), SkillGroup::new(name, rank, items))
}

/// Strings (or scalars rendered as strings) from a list, reporting anything else.
fn text_items(items: &[Value], path: &FieldPath, cx: &mut Collector) -> Vec<String> {
    items
        .iter()
        .enumerate()
        .filter_map(|(idx, item)| match item {
            Value::String(text) => Some(text.clone()),
            Value::Number(number) => Some(number.to_string()),
            other => {
                cx.push(
                    path.index(idx),
                    ValidationKind::TypeMismatch,
                    format!("expected a string, found {}", describe(other)),
                );
                None
            }
        })
        .collect()
}

fn note_unknown_keys(map: &Object, path: &FieldPath, known: &[&str]) {
    for key in map.keys() {
        if !known.contains(&key.as_str()) {
            debug!(field = %path.key(key.as_str()), "ignoring unknown field");
        }
    }
}

/// First non-null value among `names`, with the key that matched.
fn lookup<'a>(map: &'a Object, names: &[&'static str]) -> Option<(&'static str, &'a Value)> {
    names.iter().find_map(|name| match map.get(*name) {
        None | Some(Value::Null) => None,
        Some(value) => Some((*name, value)),
    })
}

/// True when none of `names` holds a value other than a blank string.
fn absent_or_blank(map: &Object, names: &[&'static str]) -> bool {
    match lookup(map, names) {
        None => true,
        Some((_, Value::String(text))) => text.trim().is_empty(),
        Some(_) => false,
    }
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a mapping",
    }
}

struct Field<'a> {
    path: FieldPath,
    text: &'a str,
}

#[derive(Default)]
struct Collector {
    issues: Vec<ValidationIssue>,
}

impl Collector {
    fn push(&mut self, path: FieldPath, kind: ValidationKind, message: impl Into<String>) {
        self.issues.push(ValidationIssue {
            path,
            kind,
            message: message.into(),
        });
    }

    fn schema_issue(&mut self, path: FieldPath, error: &SchemaError) {
        self.push(path, ValidationKind::for_schema_error(error), error.to_string());
    }

    fn check<T>(&mut self, path: FieldPath, result: SchemaResult<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                self.schema_issue(path, &err);
                None
            }
        }
    }

    fn object<'a>(&mut self, value: &'a Value, path: &FieldPath) -> Option<&'a Object> {
        match value {
            Value::Object(map) => Some(map),
            other => {
                self.push(
                    path.clone(),
                    ValidationKind::TypeMismatch,
                    format!("expected a mapping, found {}", describe(other)),
                );
                None
            }
        }
    }

    fn required_object<'a>(
        &mut self,
        map: &'a Object,
        parent: &FieldPath,
        name: &'static str,
    ) -> Option<(FieldPath, &'a Object)> {
        match lookup(map, &[name]) {
            None => {
                self.push(parent.key(name), ValidationKind::MissingField, "is required");
                None
            }
            Some((key, value)) => {
                let path = parent.key(key);
                self.object(value, &path).map(|object| (path, object))
            }
        }
    }

    fn required_str<'a>(
        &mut self,
        map: &'a Object,
        parent: &FieldPath,
        names: &[&'static str],
    ) -> Option<Field<'a>> {
        match lookup(map, names) {
            None => {
                self.push(parent.key(names[0]), ValidationKind::MissingField, "is required");
                None
            }
            Some((key, Value::String(text))) => {
                let path = parent.key(key);
                if text.trim().is_empty() {
                    self.push(path, ValidationKind::EmptyValue, "must not be empty");
                    return None;
                }
                Some(Field { path, text })
            }
            Some((key, other)) => {
                self.push(
                    parent.key(key),
                    ValidationKind::TypeMismatch,
                    format!("expected a string, found {}", describe(other)),
                );
                None
            }
        }
    }

    fn optional_str<'a>(
        &mut self,
        map: &'a Object,
        parent: &FieldPath,
        names: &[&'static str],
    ) -> Option<Field<'a>> {
        match lookup(map, names)? {
            (_, Value::String(text)) if text.trim().is_empty() => None,
            (key, Value::String(text)) => Some(Field {
                path: parent.key(key),
                text,
            }),
            (key, other) => {
                self.push(
                    parent.key(key),
                    ValidationKind::TypeMismatch,
                    format!("expected a string, found {}", describe(other)),
                );
                None
            }
        }
    }

    fn required_list<'a>(
        &mut self,
        map: &'a Object,
        parent: &FieldPath,
        names: &[&'static str],
    ) -> Option<(FieldPath, &'a [Value])> {
        if lookup(map, names).is_none() {
            self.push(parent.key(names[0]), ValidationKind::MissingField, "is required");
            return None;
        }
        let (path, items) = self.optional_list(map, parent, names)?;
        if items.is_empty() {
            self.push(
                path,
                ValidationKind::EmptyValue,
                "must contain at least one item",
            );
            return None;
        }
        Some((path, items))
    }

    fn optional_list<'a>(
        &mut self,
        map: &'a Object,
        parent: &FieldPath,
        names: &[&'static str],
    ) -> Option<(FieldPath, &'a [Value])> {
        match lookup(map, names)? {
            (key, Value::Array(items)) => Some((parent.key(key), items.as_slice())),
            (key, other) => {
                self.push(
                    parent.key(key),
                    ValidationKind::TypeMismatch,
                    format!("expected a list, found {}", describe(other)),
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn settings() -> ValidationSettings {
        ValidationSettings::default()
    }

    fn minimal() -> Value {
        json!({
            "contact": {"name": "A. Author", "email": "a@example.com"},
            "sections": [{
                "title": "Experience",
                "entries": [{"heading": "Engineer", "start_date": "2020-01-01"}]
            }]
        })
    }

    #[test]
    fn loads_minimal_document() {
        let resume = load(&minimal(), &settings()).expect("valid resume");
        assert_eq!(resume.contact().name(), "A. Author");
        assert_eq!(resume.sections()[0].entries()[0].heading(), "Engineer");
    }

    #[test]
    fn rejects_non_mapping_root() {
        let errors = load(&json!(["not", "a", "mapping"]), &settings()).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.0[0].kind, ValidationKind::TypeMismatch);
        assert!(errors.0[0].path.is_root());
    }

    #[test]
    fn reports_type_mismatch_with_path() {
        let mut raw = minimal();
        raw["sections"][0]["entries"][0]["bullets"] = json!("not a list");
        let errors = load(&raw, &settings()).unwrap_err();
        let issue = errors
            .find("sections[0].entries[0].bullets")
            .expect("bullets issue");
        assert_eq!(issue.kind, ValidationKind::TypeMismatch);
    }

    #[test]
    fn null_counts_as_missing() {
        let mut raw = minimal();
        raw["contact"]["email"] = Value::Null;
        let errors = load(&raw, &settings()).unwrap_err();
        assert_eq!(
            errors.find("contact.email").map(|issue| issue.kind),
            Some(ValidationKind::MissingField)
        );
    }

    #[test]
    fn accepts_legacy_field_names() {
        let raw = json!({
            "contact": {
                "name": "A. Author",
                "email": "a@example.com",
                "address": {"city": "Portland", "state": "OR"}
            },
            "sections": [{
                "title": "Experience",
                "entries": [{
                    "title": "Engineer",
                    "institution": "Acme",
                    "start": "2019-02",
                    "highlights": ["Shipped"]
                }]
            }]
        });
        let resume = load(&raw, &settings()).expect("legacy names load");
        assert_eq!(resume.contact().location(), Some("Portland, OR"));
        let entry = &resume.sections()[0].entries()[0];
        assert_eq!(entry.organization(), Some("Acme"));
        assert_eq!(entry.start_date().to_string(), "2019-02-01");
        assert_eq!(entry.bullets(), ["Shipped".to_string()]);
    }

    #[test]
    fn charts_are_accepted_but_not_loaded() {
        let mut raw = minimal();
        raw["charts"] = json!([{"title": "Languages", "points": []}]);
        let resume = load(&raw, &settings()).expect("charts do not block loading");
        assert_eq!(resume.sections().len(), 1);
    }

    #[test]
    fn detail_fields_must_be_scalars() {
        let mut raw = minimal();
        raw["sections"][0]["entries"][0]["gpa"] = json!([3.8]);
        let errors = load(&raw, &settings()).unwrap_err();
        assert_eq!(
            errors.find("sections[0].entries[0].gpa").map(|issue| issue.kind),
            Some(ValidationKind::TypeMismatch)
        );
    }
}
