//! Configuration primitives and loader for resgenie.
//!
//! Settings resolve through a precedence stack:
//! override flag → working directory → git root → built-in defaults.
//! Each layer only replaces the keys it sets, and every resolved value keeps
//! track of the layer it came from so validation messages can point at the
//! offending file. All validation failures are collected before reporting.

use std::env;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::format::{Item, StrftimeItems};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

pub const CONFIG_FILE_NAME: &str = ".resgenie.toml";
pub const DEFAULT_TEMPLATE: &str = "default";

const DEFAULT_TITLE: &str = "Resume";
const DEFAULT_PRESENT_LABEL: &str = "Present";
const DEFAULT_DATE_FORMAT: &str = "%b %Y";
const DEFAULT_ENGINE: &str = "wkhtmltopdf";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Complete configuration resolved from defaults and on-disk overrides.
#[derive(Clone, Debug)]
pub struct Config {
    pub template: TemplateSettings,
    pub render: RenderSettings,
    pub validation: ValidationSettings,
    pub export: ExportSettings,
    pub sources: ConfigSources,
}

/// Which template the binder should use.
#[derive(Clone, Debug)]
pub struct TemplateSettings {
    pub selection: TemplateSelection,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TemplateSelection {
    /// One of the templates compiled into the binary.
    Builtin(String),
    /// A Markdown template on disk, resolved against the declaring layer.
    File(PathBuf),
}

impl fmt::Display for TemplateSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateSelection::Builtin(name) => write!(f, "built-in template '{name}'"),
            TemplateSelection::File(path) => write!(f, "template file {}", path.display()),
        }
    }
}

/// Presentation settings consumed by the binder and renderer.
#[derive(Clone, Debug)]
pub struct RenderSettings {
    pub title: String,
    pub present_label: String,
    pub date_format: String,
    pub stylesheet: Option<PathBuf>,
}

/// Optional strictness switches for the loader.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ValidationSettings {
    pub require_phone: bool,
    pub require_location: bool,
    pub allow_partial_dates: bool,
}

impl Default for ValidationSettings {
    fn default() -> Self {
        ValidationSettings {
            require_phone: false,
            require_location: false,
            allow_partial_dates: true,
        }
    }
}

/// External HTML→PDF engine invocation.
#[derive(Clone, Debug)]
pub struct ExportSettings {
    pub engine: String,
    pub args: Vec<String>,
    pub timeout: Duration,
}

/// Provenance information for resolved configuration.
#[derive(Clone, Debug)]
pub struct ConfigSources {
    pub working_directory: PathBuf,
    pub layers: Vec<ConfigSource>,
}

/// Specific layer of configuration (default/git/local/override).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ConfigSource {
    pub kind: ConfigSourceKind,
    pub path: Option<PathBuf>,
    pub base_dir: PathBuf,
}

impl ConfigSource {
    fn default(base_dir: PathBuf) -> Self {
        ConfigSource {
            kind: ConfigSourceKind::Default,
            path: None,
            base_dir,
        }
    }

    fn for_file(kind: ConfigSourceKind, path: PathBuf) -> Self {
        let base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        ConfigSource {
            kind,
            path: Some(path),
            base_dir,
        }
    }

    fn describe(&self) -> String {
        match (&self.kind, &self.path) {
            (ConfigSourceKind::Default, _) => "built-in defaults".to_owned(),
            (kind, Some(path)) => format!("{} at {}", kind, path.display()),
            (kind, None) => kind.to_string(),
        }
    }
}

/// Kinds of configuration sources, ordered from lowest to highest precedence.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ConfigSourceKind {
    Default,
    GitRoot,
    Local,
    Override,
}

impl fmt::Display for ConfigSourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ConfigSourceKind::Default => "defaults",
            ConfigSourceKind::GitRoot => "git-root config",
            ConfigSourceKind::Local => "local config",
            ConfigSourceKind::Override => "override config",
        };
        f.write_str(label)
    }
}

/// Loader options, typically supplied by the CLI layer.
#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub override_path: Option<PathBuf>,
    pub working_dir: Option<PathBuf>,
}

impl LoadOptions {
    pub fn with_override_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.override_path = Some(path.into());
        self
    }

    pub fn with_working_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(path.into());
        self
    }
}

/// Errors surfaced while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to resolve working directory {attempted}: {source}")]
    WorkingDirectory {
        attempted: PathBuf,
        source: io::Error,
    },
    #[error("override config {path} not found")]
    OverrideNotFound { path: PathBuf },
    #[error("failed to read config {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("configuration validation failed:\n{0}")]
    Validation(ConfigValidationErrors),
}

impl Config {
    /// Loads configuration using the precedence rules and returns typed settings.
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let working_dir = resolve_working_dir(options.working_dir)?;
        let override_path = options
            .override_path
            .map(|path| make_absolute(&path, &working_dir));

        if let Some(path) = &override_path {
            if !path.exists() {
                return Err(ConfigError::OverrideNotFound { path: path.clone() });
            }
        }

        let default_source = ConfigSource::default(working_dir.clone());
        let mut merged = PartialConfig::default();
        merged.merge(defaults_layer(default_source.clone()));

        let mut source_layers = vec![default_source];

        let git_root = find_git_root(&working_dir);
        let git_config_path = git_root.as_ref().map(|root| root.join(CONFIG_FILE_NAME));
        let local_config_path = working_dir.join(CONFIG_FILE_NAME);

        if let Some(path) = git_config_path.as_ref() {
            if path.exists() && Some(path) != override_path.as_ref() && path != &local_config_path {
                let source = ConfigSource::for_file(ConfigSourceKind::GitRoot, path.clone());
                merged.merge(load_layer(path, source.clone())?);
                source_layers.push(source);
            }
        }

        if local_config_path.exists() && Some(&local_config_path) != override_path.as_ref() {
            let source = ConfigSource::for_file(ConfigSourceKind::Local, local_config_path.clone());
            merged.merge(load_layer(&local_config_path, source.clone())?);
            source_layers.push(source);
        }

        if let Some(path) = override_path {
            let source = ConfigSource::for_file(ConfigSourceKind::Override, path.clone());
            merged.merge(load_layer(&path, source.clone())?);
            source_layers.push(source);
        }

        for layer in &source_layers {
            debug!(layer = %layer.describe(), "applied config layer");
        }

        let resolved = merged.finalize().map_err(ConfigError::Validation)?;
        Ok(Config {
            template: TemplateSettings {
                selection: resolved.template,
            },
            render: resolved.render,
            validation: resolved.validation,
            export: resolved.export,
            sources: ConfigSources {
                working_directory: working_dir,
                layers: source_layers,
            },
        })
    }

    /// Built-in defaults only, rooted at `working_dir`; never touches the disk.
    pub fn defaults(working_dir: impl Into<PathBuf>) -> Self {
        let working_dir = working_dir.into();
        let source = ConfigSource::default(working_dir.clone());
        let resolved = defaults_layer(source.clone())
            .finalize()
            .unwrap_or_else(|err| panic!("built-in resgenie defaults are invalid: {err}"));
        Config {
            template: TemplateSettings {
                selection: resolved.template,
            },
            render: resolved.render,
            validation: resolved.validation,
            export: resolved.export,
            sources: ConfigSources {
                working_directory: working_dir,
                layers: vec![source],
            },
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config::defaults(PathBuf::from("."))
    }
}

fn resolve_working_dir(override_dir: Option<PathBuf>) -> Result<PathBuf, ConfigError> {
    match override_dir {
        Some(path) => fs::canonicalize(&path).map_err(|source| ConfigError::WorkingDirectory {
            attempted: path,
            source,
        }),
        None => env::current_dir().map_err(|source| ConfigError::WorkingDirectory {
            attempted: PathBuf::from("."),
            source,
        }),
    }
}

fn make_absolute(path: &Path, base: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

fn find_git_root(start: &Path) -> Option<PathBuf> {
    let mut current = Some(start);
    while let Some(dir) = current {
        if dir.join(".git").exists() {
            return Some(dir.to_path_buf());
        }
        current = dir.parent();
    }
    None
}

fn load_layer(path: &Path, source: ConfigSource) -> Result<PartialConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.into(),
        source,
    })?;
    let raw: RawConfig = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.into(),
        source,
    })?;
    Ok(raw.into_partial(source))
}

fn defaults_layer(source: ConfigSource) -> PartialConfig {
    let at = |value| Some(Located::new(value, source.clone()));

    PartialConfig {
        template: TemplatePartial {
            name: Some(Located::new(DEFAULT_TEMPLATE.to_string(), source.clone())),
            path: None,
            conflict: None,
        },
        render: RenderPartial {
            title: at(DEFAULT_TITLE.to_string()),
            present_label: at(DEFAULT_PRESENT_LABEL.to_string()),
            date_format: at(DEFAULT_DATE_FORMAT.to_string()),
            stylesheet: None,
        },
        validation: ValidationPartial {
            require_phone: Some(Located::new(false, source.clone())),
            require_location: Some(Located::new(false, source.clone())),
            allow_partial_dates: Some(Located::new(true, source.clone())),
        },
        export: ExportPartial {
            engine: at(DEFAULT_ENGINE.to_string()),
            args: Some(Located::new(
                vec!["--quiet".to_string(), "--enable-local-file-access".to_string()],
                source.clone(),
            )),
            timeout_secs: Some(Located::new(DEFAULT_TIMEOUT_SECS, source.clone())),
        },
    }
}

#[derive(Clone, Debug)]
struct Located<T> {
    value: T,
    source: ConfigSource,
}

impl<T> Located<T> {
    fn new(value: T, source: ConfigSource) -> Self {
        Located { value, source }
    }
}

fn resolve_path(located: &Located<PathBuf>) -> PathBuf {
    make_absolute(&located.value, &located.source.base_dir)
}

fn fallback<T>(value: Option<Located<T>>, default: T) -> Located<T> {
    value.unwrap_or_else(|| Located::new(default, ConfigSource::default(PathBuf::from("."))))
}

#[derive(Clone, Debug, Default)]
struct PartialConfig {
    template: TemplatePartial,
    render: RenderPartial,
    validation: ValidationPartial,
    export: ExportPartial,
}

impl PartialConfig {
    fn merge(&mut self, other: PartialConfig) {
        self.template.merge(other.template);
        self.render.merge(other.render);
        self.validation.merge(other.validation);
        self.export.merge(other.export);
    }

    fn finalize(self) -> Result<ResolvedConfig, ConfigValidationErrors> {
        let mut errors = Vec::new();

        let template = self.template.finalize(&mut errors);

        let title = fallback(self.render.title, DEFAULT_TITLE.to_string());
        require_non_blank(&title, "render.title", &mut errors);

        let present_label = fallback(
            self.render.present_label,
            DEFAULT_PRESENT_LABEL.to_string(),
        );
        require_non_blank(&present_label, "render.present_label", &mut errors);

        let date_format = fallback(self.render.date_format, DEFAULT_DATE_FORMAT.to_string());
        if date_format.value.trim().is_empty()
            || StrftimeItems::new(&date_format.value).any(|item| matches!(item, Item::Error))
        {
            errors.push(
                ConfigValidationError::new(
                    Some(date_format.source.clone()),
                    format!("'{}' is not a valid strftime format", date_format.value),
                )
                .with_context("render.date_format"),
            );
        }

        let stylesheet = self.render.stylesheet.as_ref().map(resolve_path);

        let engine = fallback(self.export.engine, DEFAULT_ENGINE.to_string());
        require_non_blank(&engine, "export.engine", &mut errors);

        let timeout_secs = fallback(self.export.timeout_secs, DEFAULT_TIMEOUT_SECS);
        if timeout_secs.value == 0 {
            errors.push(
                ConfigValidationError::new(
                    Some(timeout_secs.source.clone()),
                    "must be at least 1 second".into(),
                )
                .with_context("export.timeout_secs"),
            );
        }

        let args = self.export.args.map(|args| args.value).unwrap_or_default();

        let defaults = ValidationSettings::default();
        let validation = ValidationSettings {
            require_phone: self
                .validation
                .require_phone
                .map_or(defaults.require_phone, |flag| flag.value),
            require_location: self
                .validation
                .require_location
                .map_or(defaults.require_location, |flag| flag.value),
            allow_partial_dates: self
                .validation
                .allow_partial_dates
                .map_or(defaults.allow_partial_dates, |flag| flag.value),
        };

        if !errors.is_empty() {
            return Err(ConfigValidationErrors(errors));
        }

        Ok(ResolvedConfig {
            template,
            render: RenderSettings {
                title: title.value.trim().to_string(),
                present_label: present_label.value.trim().to_string(),
                date_format: date_format.value,
                stylesheet,
            },
            validation,
            export: ExportSettings {
                engine: engine.value.trim().to_string(),
                args,
                timeout: Duration::from_secs(timeout_secs.value),
            },
        })
    }
}

fn require_non_blank(
    located: &Located<String>,
    context: &str,
    errors: &mut Vec<ConfigValidationError>,
) {
    if located.value.trim().is_empty() {
        errors.push(
            ConfigValidationError::new(Some(located.source.clone()), "cannot be empty".into())
                .with_context(context),
        );
    }
}

#[derive(Clone, Debug, Default)]
struct TemplatePartial {
    name: Option<Located<String>>,
    path: Option<Located<PathBuf>>,
    conflict: Option<ConfigSource>,
}

impl TemplatePartial {
    fn merge(&mut self, other: TemplatePartial) {
        // A layer that picks a template replaces the whole selection.
        if other.name.is_some() || other.path.is_some() || other.conflict.is_some() {
            *self = other;
        }
    }

    fn finalize(self, errors: &mut Vec<ConfigValidationError>) -> TemplateSelection {
        if let Some(source) = self.conflict {
            errors.push(
                ConfigValidationError::new(
                    Some(source),
                    "set either template.name or template.path, not both".into(),
                )
                .with_context("template"),
            );
        }

        if let Some(path) = &self.path {
            return TemplateSelection::File(resolve_path(path));
        }

        let name = fallback(self.name, DEFAULT_TEMPLATE.to_string());
        require_non_blank(&name, "template.name", errors);
        TemplateSelection::Builtin(name.value.trim().to_string())
    }
}

#[derive(Clone, Debug, Default)]
struct RenderPartial {
    title: Option<Located<String>>,
    present_label: Option<Located<String>>,
    date_format: Option<Located<String>>,
    stylesheet: Option<Located<PathBuf>>,
}

impl RenderPartial {
    fn merge(&mut self, other: RenderPartial) {
        if other.title.is_some() {
            self.title = other.title;
        }
        if other.present_label.is_some() {
            self.present_label = other.present_label;
        }
        if other.date_format.is_some() {
            self.date_format = other.date_format;
        }
        if other.stylesheet.is_some() {
            self.stylesheet = other.stylesheet;
        }
    }
}

#[derive(Clone, Debug, Default)]
struct ValidationPartial {
    require_phone: Option<Located<bool>>,
    require_location: Option<Located<bool>>,
    allow_partial_dates: Option<Located<bool>>,
}

impl ValidationPartial {
    fn merge(&mut self, other: ValidationPartial) {
        if other.require_phone.is_some() {
            self.require_phone = other.require_phone;
        }
        if other.require_location.is_some() {
            self.require_location = other.require_location;
        }
        if other.allow_partial_dates.is_some() {
            self.allow_partial_dates = other.allow_partial_dates;
        }
    }
}

#[derive(Clone, Debug, Default)]
struct ExportPartial {
    engine: Option<Located<String>>,
    args: Option<Located<Vec<String>>>,
    timeout_secs: Option<Located<u64>>,
}

impl ExportPartial {
    fn merge(&mut self, other: ExportPartial) {
        if other.engine.is_some() {
            self.engine = other.engine;
        }
        if other.args.is_some() {
            self.args = other.args;
        }
        if other.timeout_secs.is_some() {
            self.timeout_secs = other.timeout_secs;
        }
    }
}

#[derive(Clone, Debug)]
struct ResolvedConfig {
    template: TemplateSelection,
    render: RenderSettings,
    validation: ValidationSettings,
    export: ExportSettings,
}

/// Container for validation failures, formatted as a bullet list.
#[derive(Debug)]
pub struct ConfigValidationErrors(pub Vec<ConfigValidationError>);

impl fmt::Display for ConfigValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, err) in self.0.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "- {err}")?;
        }
        Ok(())
    }
}

impl ConfigValidationErrors {
    pub fn iter(&self) -> impl Iterator<Item = &ConfigValidationError> {
        self.0.iter()
    }
}

/// Validation failure with optional provenance.
#[derive(Clone, Debug)]
pub struct ConfigValidationError {
    pub source: Option<ConfigSource>,
    pub message: String,
    pub context: Option<String>,
}

impl ConfigValidationError {
    fn new(source: Option<ConfigSource>, message: String) -> Self {
        ConfigValidationError {
            source,
            message,
            context: None,
        }
    }

    fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

impl fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(context) = &self.context {
            write!(f, "{}: {}", context, self.message)?;
        } else {
            write!(f, "{}", self.message)?;
        }
        if let Some(source) = &self.source {
            write!(f, " ({})", source.describe())?;
        }
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default)]
    template: Option<RawTemplate>,
    #[serde(default)]
    render: Option<RawRender>,
    #[serde(default)]
    validation: Option<RawValidation>,
    #[serde(default)]
    export: Option<RawExport>,
}

impl RawConfig {
    fn into_partial(self, source: ConfigSource) -> PartialConfig {
        PartialConfig {
            template: self
                .template
                .map(|template| template.into_partial(source.clone()))
                .unwrap_or_default(),
            render: self
                .render
                .map(|render| render.into_partial(source.clone()))
                .unwrap_or_default(),
            validation: self
                .validation
                .map(|validation| validation.into_partial(source.clone()))
                .unwrap_or_default(),
            export: self
                .export
                .map(|export| export.into_partial(source))
                .unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawTemplate {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    path: Option<PathBuf>,
}

impl RawTemplate {
    fn into_partial(self, source: ConfigSource) -> TemplatePartial {
        let conflict = (self.name.is_some() && self.path.is_some()).then(|| source.clone());
        TemplatePartial {
            name: self.name.map(|value| Located::new(value, source.clone())),
            path: self.path.map(|value| Located::new(value, source)),
            conflict,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawRender {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    present_label: Option<String>,
    #[serde(default)]
    date_format: Option<String>,
    #[serde(default)]
    stylesheet: Option<PathBuf>,
}

impl RawRender {
    fn into_partial(self, source: ConfigSource) -> RenderPartial {
        RenderPartial {
            title: self.title.map(|value| Located::new(value, source.clone())),
            present_label: self
                .present_label
                .map(|value| Located::new(value, source.clone())),
            date_format: self
                .date_format
                .map(|value| Located::new(value, source.clone())),
            stylesheet: self.stylesheet.map(|value| Located::new(value, source)),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawValidation {
    #[serde(default)]
    require_phone: Option<bool>,
    #[serde(default)]
    require_location: Option<bool>,
    #[serde(default)]
    allow_partial_dates: Option<bool>,
}

impl RawValidation {
    fn into_partial(self, source: ConfigSource) -> ValidationPartial {
        ValidationPartial {
            require_phone: self
                .require_phone
                .map(|value| Located::new(value, source.clone())),
            require_location: self
                .require_location
                .map(|value| Located::new(value, source.clone())),
            allow_partial_dates: self
                .allow_partial_dates
                .map(|value| Located::new(value, source)),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawExport {
    #[serde(default)]
    engine: Option<String>,
    #[serde(default)]
    args: Option<Vec<String>>,
    #[serde(default)]
    timeout_secs: Option<u64>,
}

impl RawExport {
    fn into_partial(self, source: ConfigSource) -> ExportPartial {
        ExportPartial {
            engine: self.engine.map(|value| Located::new(value, source.clone())),
            args: self.args.map(|value| Located::new(value, source.clone())),
            timeout_secs: self
                .timeout_secs
                .map(|value| Located::new(value, source)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = Config::defaults("/tmp");
        assert_eq!(
            config.template.selection,
            TemplateSelection::Builtin("default".into())
        );
        assert_eq!(config.render.present_label, "Present");
        assert_eq!(config.render.date_format, "%b %Y");
        assert_eq!(config.export.engine, "wkhtmltopdf");
        assert_eq!(config.export.timeout, Duration::from_secs(30));
        assert_eq!(config.validation, ValidationSettings::default());
    }

    #[test]
    fn later_template_choice_replaces_earlier_one() {
        let base = ConfigSource::default(PathBuf::from("/work"));
        let local = ConfigSource::for_file(
            ConfigSourceKind::Local,
            PathBuf::from("/work/.resgenie.toml"),
        );

        let mut merged = defaults_layer(base);
        let raw: RawConfig = toml::from_str("[template]\npath = \"mine.md\"\n").unwrap();
        merged.merge(raw.into_partial(local));

        let resolved = merged.finalize().unwrap();
        assert_eq!(
            resolved.template,
            TemplateSelection::File(PathBuf::from("/work/mine.md"))
        );
    }
}
