use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::{SchemaError, SchemaResult};
use crate::{normalize_text, optional_text, require_text};

const PRESENT: &str = "present";

/// Calendar date attached to an entry.
///
/// Inputs are ISO-8601 days (`2020-01-31`). Month precision (`2020-01`) is
/// accepted on request and pinned to the first of the month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct EntryDate(NaiveDate);

impl EntryDate {
    pub fn parse(value: &str, allow_partial: bool) -> SchemaResult<Self> {
        let trimmed = value.trim();
        let expected = if allow_partial {
            "YYYY-MM-DD or YYYY-MM"
        } else {
            "YYYY-MM-DD"
        };
        let malformed = || SchemaError::MalformedDate {
            value: trimmed.to_string(),
            expected,
        };

        let padded = if has_date_shape(trimmed) {
            trimmed.to_string()
        } else if allow_partial && has_date_shape(&format!("{trimmed}-01")) {
            format!("{trimmed}-01")
        } else {
            return Err(malformed());
        };

        NaiveDate::parse_from_str(&padded, "%Y-%m-%d")
            .map(EntryDate)
            .map_err(|_| malformed())
    }

    pub fn from_date(date: NaiveDate) -> Self {
        EntryDate(date)
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }
}

impl fmt::Display for EntryDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

/// Exactly `DDDD-DD-DD`; chrono alone also takes unpadded or signed years.
fn has_date_shape(value: &str) -> bool {
    let bytes = value.as_bytes();
    bytes.len() == 10
        && bytes.iter().enumerate().all(|(idx, byte)| match idx {
            4 | 7 => *byte == b'-',
            _ => byte.is_ascii_digit(),
        })
}

/// End of an entry: a concrete date or the open-ended `present` sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EndDate {
    Present,
    On(EntryDate),
}

impl EndDate {
    pub fn parse(value: &str, allow_partial: bool) -> SchemaResult<Self> {
        if value.trim().eq_ignore_ascii_case(PRESENT) {
            return Ok(EndDate::Present);
        }
        EntryDate::parse(value, allow_partial).map(EndDate::On)
    }

    pub fn date(&self) -> Option<EntryDate> {
        match self {
            EndDate::Present => None,
            EndDate::On(date) => Some(*date),
        }
    }
}

/// Raw parts of an entry, validated by [`Entry::new`].
#[derive(Debug, Clone, Default)]
pub struct EntryParts<'a> {
    pub heading: &'a str,
    pub organization: Option<&'a str>,
    pub location: Option<&'a str>,
    pub summary: Option<&'a str>,
    pub bullets: Vec<String>,
    /// Short labelled facts such as `GPA: 3.8`, shown after the bullets.
    pub details: Vec<String>,
}

/// One role, degree, or achievement inside a section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    heading: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    organization: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    location: Option<String>,
    start_date: EntryDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    end_date: Option<EndDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<String>,
    bullets: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    details: Vec<String>,
}

impl Entry {
    pub fn new(
        parts: EntryParts<'_>,
        start_date: EntryDate,
        end_date: Option<EndDate>,
    ) -> SchemaResult<Self> {
        let heading = require_text("heading", parts.heading)?;
        Entry::check_order(start_date, end_date)?;

        let bullets = non_blank(parts.bullets);
        let details = non_blank(parts.details);

        Ok(Entry {
            heading,
            organization: optional_text(parts.organization),
            location: optional_text(parts.location),
            start_date,
            end_date,
            summary: optional_text(parts.summary),
            bullets,
            details,
        })
    }

    /// Fails when a concrete end date falls before `start_date`.
    pub fn check_order(start_date: EntryDate, end_date: Option<EndDate>) -> SchemaResult<()> {
        match end_date {
            Some(EndDate::On(end)) if end < start_date => Err(SchemaError::DateOrder {
                start: start_date.to_string(),
                end: end.to_string(),
            }),
            _ => Ok(()),
        }
    }

    pub fn heading(&self) -> &str {
        &self.heading
    }

    pub fn organization(&self) -> Option<&str> {
        self.organization.as_deref()
    }

    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    pub fn start_date(&self) -> EntryDate {
        self.start_date
    }

    pub fn end_date(&self) -> Option<EndDate> {
        self.end_date
    }

    /// True when the entry has no end date or ends at `present`.
    pub fn is_ongoing(&self) -> bool {
        !matches!(self.end_date, Some(EndDate::On(_)))
    }

    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    pub fn bullets(&self) -> &[String] {
        &self.bullets
    }

    pub fn details(&self) -> &[String] {
        &self.details
    }
}

fn non_blank(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|item| normalize_text(&item))
        .filter(|item| !item.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(value: &str) -> EntryDate {
        EntryDate::parse(value, false).unwrap()
    }

    fn parts(heading: &str) -> EntryParts<'_> {
        EntryParts {
            heading,
            ..EntryParts::default()
        }
    }

    #[test]
    fn parses_iso_dates_and_present() {
        assert_eq!(date("2020-01-31").to_string(), "2020-01-31");
        assert_eq!(EndDate::parse("Present", false), Ok(EndDate::Present));
        assert!(matches!(
            EntryDate::parse("01/31/2020", false),
            Err(SchemaError::MalformedDate { .. })
        ));
    }

    #[test]
    fn month_precision_requires_opt_in() {
        assert!(EntryDate::parse("2020-03", false).is_err());
        assert_eq!(
            EntryDate::parse("2020-03", true).unwrap().to_string(),
            "2020-03-01"
        );
    }

    #[test]
    fn rejects_dates_chrono_would_stretch_to_fit() {
        for value in ["2020-1-5", "+2020-01-01", "20200-01-01", "2020-01-5", "2020/01/05"] {
            assert!(
                matches!(
                    EntryDate::parse(value, true),
                    Err(SchemaError::MalformedDate { .. })
                ),
                "{value} should be rejected"
            );
        }
        assert!(EntryDate::parse("2020-1", true).is_err());
        assert!(EntryDate::parse("2020-02-30", false).is_err());
    }

    #[test]
    fn rejects_end_before_start() {
        let err = Entry::new(
            parts("Engineer"),
            date("2021-05-01"),
            Some(EndDate::On(date("2020-01-01"))),
        )
        .unwrap_err();
        assert!(matches!(err, SchemaError::DateOrder { .. }));
    }

    #[test]
    fn same_day_range_is_allowed() {
        let entry = Entry::new(
            parts("Talk"),
            date("2021-05-01"),
            Some(EndDate::On(date("2021-05-01"))),
        )
        .unwrap();
        assert!(!entry.is_ongoing());
    }

    #[test]
    fn blank_bullets_are_dropped() {
        let entry = Entry::new(
            EntryParts {
                heading: "Engineer",
                bullets: vec!["Built X".into(), "   ".into()],
                details: vec!["GPA:  3.8".into(), "".into()],
                ..EntryParts::default()
            },
            date("2020-01-01"),
            None,
        )
        .unwrap();
        assert_eq!(entry.bullets(), ["Built X".to_string()]);
        assert_eq!(entry.details(), ["GPA: 3.8".to_string()]);
        assert!(entry.is_ongoing());
    }
}
