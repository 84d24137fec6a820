use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use url::Url;

use crate::error::{SchemaError, SchemaResult};
use crate::{optional_text, require_text};

const EMAIL_PATTERN: &str = r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?)+$";
const PHONE_PATTERN: &str =
    r"(\+[0-9]{0,3})?[\(\s\-]?([0-9]{3})[\)\s\.\-]?\s?([0-9]{3})[\s\.\-]?([0-9]{4})";
const AREA_CODE_PATTERN: &str = r"\([0-9]{3}\)";

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(EMAIL_PATTERN).expect("email pattern compiles"))
}

fn phone_regex() -> &'static Regex {
    static PHONE: OnceLock<Regex> = OnceLock::new();
    PHONE.get_or_init(|| Regex::new(PHONE_PATTERN).expect("phone pattern compiles"))
}

fn area_code_regex() -> &'static Regex {
    static AREA: OnceLock<Regex> = OnceLock::new();
    AREA.get_or_init(|| Regex::new(AREA_CODE_PATTERN).expect("area code pattern compiles"))
}

/// Syntactically valid email address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    pub fn parse(value: &str) -> SchemaResult<Self> {
        let trimmed = require_text("email", value)?;
        let malformed = || SchemaError::MalformedEmail {
            value: trimmed.clone(),
        };

        if !email_regex().is_match(&trimmed) {
            return Err(malformed());
        }

        // The pattern admits dots anywhere in the local part; RFC 5322 does not.
        let local = trimmed.split('@').next().unwrap_or_default();
        if local.starts_with('.') || local.ends_with('.') || local.contains("..") {
            return Err(malformed());
        }

        Ok(Email(trimmed))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Phone number in the North-American shape, with an optional country code.
///
/// The value is kept exactly as written; only its shape is checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Phone(String);

impl Phone {
    pub fn parse(value: &str) -> SchemaResult<Self> {
        let trimmed = require_text("phone", value)?;

        if !phone_regex().is_match(&trimmed) {
            return Err(SchemaError::MalformedPhone {
                value: trimmed,
                reason: "expected a 3-3-4 digit number with an optional country code",
            });
        }

        let has_parens = trimmed.contains('(') || trimmed.contains(')');
        if has_parens && !area_code_regex().is_match(&trimmed) {
            return Err(SchemaError::MalformedPhone {
                value: trimmed,
                reason: "parentheses must enclose a three digit area code",
            });
        }

        Ok(Phone(trimmed))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Phone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Absolute URL with both a scheme and a host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct WebUrl(Url);

impl WebUrl {
    pub fn parse(value: &str) -> SchemaResult<Self> {
        let trimmed = require_text("url", value)?;
        let url = Url::parse(&trimmed).map_err(|err| SchemaError::MalformedUrl {
            value: trimmed.clone(),
            reason: err.to_string(),
        })?;

        match url.host_str() {
            Some(host) if !host.is_empty() => Ok(WebUrl(url)),
            _ => Err(SchemaError::MalformedUrl {
                value: trimmed,
                reason: "missing host".into(),
            }),
        }
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn host(&self) -> &str {
        self.0.host_str().unwrap_or_default()
    }
}

impl fmt::Display for WebUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

/// Labelled URL such as a portfolio or profile page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Link {
    label: String,
    url: WebUrl,
}

impl Link {
    /// Build a link. A blank label falls back to the URL host.
    pub fn new(label: Option<&str>, url: WebUrl) -> Self {
        let label = optional_text(label).unwrap_or_else(|| url.host().to_string());
        Link { label, url }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn url(&self) -> &WebUrl {
        &self.url
    }
}

/// Contact block shown at the top of a resume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Contact {
    name: String,
    email: Email,
    #[serde(skip_serializing_if = "Option::is_none")]
    phone: Option<Phone>,
    #[serde(skip_serializing_if = "Option::is_none")]
    location: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    links: Vec<Link>,
}

impl Contact {
    pub fn new(
        name: &str,
        email: Email,
        phone: Option<Phone>,
        location: Option<&str>,
        links: Vec<Link>,
    ) -> SchemaResult<Self> {
        Ok(Contact {
            name: require_text("contact.name", name)?,
            email,
            phone,
            location: optional_text(location),
            links,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &Email {
        &self.email
    }

    pub fn phone(&self) -> Option<&Phone> {
        self.phone.as_ref()
    }

    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_common_email_shapes() {
        for value in ["a@example.com", "first.last+tag@sub.example.co.uk"] {
            assert!(Email::parse(value).is_ok(), "{value} should parse");
        }
    }

    #[test]
    fn rejects_malformed_email() {
        for value in ["no-at-sign", "a@b", "a@@example.com", ".a@example.com", "a..b@example.com"] {
            assert!(
                matches!(Email::parse(value), Err(SchemaError::MalformedEmail { .. })),
                "{value} should be rejected"
            );
        }
        assert_eq!(
            Email::parse("   "),
            Err(SchemaError::Empty { field: "email" })
        );
    }

    #[test]
    fn phone_shapes_follow_north_american_rules() {
        let cases = [
            ("5555555555", true),
            ("+55555555555", true),
            ("+1(555)5555555", true),
            ("(555) 555 5555", true),
            ("(555 555 5555", false),
            ("555.555.555", false),
            ("555.555.5555", true),
            ("555 555-5555", true),
        ];
        for (value, valid) in cases {
            assert_eq!(Phone::parse(value).is_ok(), valid, "{value}");
        }
    }

    #[test]
    fn url_requires_scheme_and_host() {
        assert!(WebUrl::parse("https://example.com/me").is_ok());
        assert!(matches!(
            WebUrl::parse("example.com"),
            Err(SchemaError::MalformedUrl { .. })
        ));
        assert!(matches!(
            WebUrl::parse("mailto:a@example.com"),
            Err(SchemaError::MalformedUrl { .. })
        ));
    }

    #[test]
    fn link_label_defaults_to_host() {
        let url = WebUrl::parse("https://github.com/someone").unwrap();
        let link = Link::new(Some("  "), url);
        assert_eq!(link.label(), "github.com");
    }

    #[test]
    fn contact_text_is_stored_as_rendered() {
        let contact = Contact::new(
            "  Pat   O'Neil\n",
            Email::parse("pat@example.com").unwrap(),
            None,
            Some("Portland,\tOR"),
            Vec::new(),
        )
        .unwrap();
        assert_eq!(contact.name(), "Pat O'Neil");
        assert_eq!(contact.location(), Some("Portland, OR"));
    }
}
