use crate::error::TemplateError;
use crate::parse::Template;

const BUILTINS: &[(&str, &str)] = &[
    ("default", include_str!("../templates/default.md")),
    ("compact", include_str!("../templates/compact.md")),
];

/// Names of the templates compiled into the crate.
pub fn builtin_names() -> impl Iterator<Item = &'static str> {
    BUILTINS.iter().map(|(name, _)| *name)
}

/// Markdown source of a built-in template.
pub fn builtin_source(name: &str) -> Option<&'static str> {
    BUILTINS
        .iter()
        .find(|(candidate, _)| *candidate == name)
        .map(|(_, source)| *source)
}

/// Parse a built-in template by name.
pub fn builtin(name: &str) -> Result<Template, TemplateError> {
    let source = builtin_source(name).ok_or_else(|| TemplateError::UnknownBuiltin {
        name: name.to_string(),
    })?;
    Template::parse(name, source)
}
