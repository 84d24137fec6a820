/// Context a placeholder can be resolved in. Each non-root scope is opened by
/// exactly one [`Collection`] block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Root,
    Link,
    Section,
    Entry,
    Bullet,
    Detail,
    Skill,
}

impl Scope {
    /// Block key that opens this scope.
    pub fn opened_by(self) -> &'static str {
        match self {
            Scope::Root => "document",
            Scope::Link => Collection::Links.key(),
            Scope::Section => Collection::Sections.key(),
            Scope::Entry => Collection::Entries.key(),
            Scope::Bullet => Collection::Bullets.key(),
            Scope::Detail => Collection::Details.key(),
            Scope::Skill => Collection::Skills.key(),
        }
    }
}

/// Repeatable parts of a resume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Sections,
    Entries,
    Bullets,
    Details,
    Links,
    Skills,
}

const COLLECTIONS: &[Collection] = &[
    Collection::Sections,
    Collection::Entries,
    Collection::Bullets,
    Collection::Details,
    Collection::Links,
    Collection::Skills,
];

impl Collection {
    pub fn from_key(key: &str) -> Option<Self> {
        COLLECTIONS.iter().copied().find(|c| c.key() == key)
    }

    pub fn key(self) -> &'static str {
        match self {
            Collection::Sections => "sections",
            Collection::Entries => "section.entries",
            Collection::Bullets => "entry.bullets",
            Collection::Details => "entry.details",
            Collection::Links => "contact.links",
            Collection::Skills => "skills",
        }
    }

    /// Scope that must be active for the block to be legal.
    pub fn requires(self) -> Scope {
        match self {
            Collection::Sections | Collection::Links | Collection::Skills => Scope::Root,
            Collection::Entries => Scope::Section,
            Collection::Bullets | Collection::Details => Scope::Entry,
        }
    }

    /// Scope active inside the block body.
    pub fn opens(self) -> Scope {
        match self {
            Collection::Sections => Scope::Section,
            Collection::Entries => Scope::Entry,
            Collection::Bullets => Scope::Bullet,
            Collection::Details => Scope::Detail,
            Collection::Links => Scope::Link,
            Collection::Skills => Scope::Skill,
        }
    }
}

/// The closed set of values a template can reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    ContactName,
    ContactEmail,
    ContactPhone,
    ContactLocation,
    Summary,
    LinkLabel,
    LinkUrl,
    SectionTitle,
    EntryHeading,
    EntryOrganization,
    EntryLocation,
    EntryStartDate,
    EntryEndDate,
    EntryDates,
    EntrySummary,
    Bullet,
    Detail,
    SkillName,
    SkillItems,
}

const PLACEHOLDERS: &[(&str, Placeholder)] = &[
    ("contact.name", Placeholder::ContactName),
    ("contact.email", Placeholder::ContactEmail),
    ("contact.phone", Placeholder::ContactPhone),
    ("contact.location", Placeholder::ContactLocation),
    ("summary", Placeholder::Summary),
    ("link.label", Placeholder::LinkLabel),
    ("link.url", Placeholder::LinkUrl),
    ("section.title", Placeholder::SectionTitle),
    ("entry.heading", Placeholder::EntryHeading),
    ("entry.organization", Placeholder::EntryOrganization),
    ("entry.location", Placeholder::EntryLocation),
    ("entry.start_date", Placeholder::EntryStartDate),
    ("entry.end_date", Placeholder::EntryEndDate),
    ("entry.dates", Placeholder::EntryDates),
    ("entry.summary", Placeholder::EntrySummary),
    ("bullet", Placeholder::Bullet),
    ("detail", Placeholder::Detail),
    ("skill.name", Placeholder::SkillName),
    ("skill.items", Placeholder::SkillItems),
];

impl Placeholder {
    pub fn from_key(key: &str) -> Option<Self> {
        PLACEHOLDERS
            .iter()
            .find(|(candidate, _)| *candidate == key)
            .map(|(_, placeholder)| *placeholder)
    }

    pub fn key(self) -> &'static str {
        PLACEHOLDERS
            .iter()
            .find(|(_, candidate)| *candidate == self)
            .map(|(key, _)| *key)
            .unwrap_or("?")
    }

    pub fn scope(self) -> Scope {
        use Placeholder::*;
        match self {
            ContactName | ContactEmail | ContactPhone | ContactLocation | Summary => Scope::Root,
            LinkLabel | LinkUrl => Scope::Link,
            SectionTitle => Scope::Section,
            EntryHeading | EntryOrganization | EntryLocation | EntryStartDate | EntryEndDate
            | EntryDates | EntrySummary => Scope::Entry,
            Bullet => Scope::Bullet,
            Detail => Scope::Detail,
            SkillName | SkillItems => Scope::Skill,
        }
    }

    /// Optional fields may open a conditional `{{#key}}` block.
    pub fn is_optional(self) -> bool {
        matches!(
            self,
            Placeholder::ContactPhone
                | Placeholder::ContactLocation
                | Placeholder::Summary
                | Placeholder::EntryOrganization
                | Placeholder::EntryLocation
                | Placeholder::EntrySummary
        )
    }
}
