//! Core orchestration layer for resgenie.
//!
//! [`ResGenie`] wires the stages together: load and validate the resume, bind
//! it into the selected template, render HTML, then hand the page to an
//! exporter. Every stage either succeeds completely or returns a typed error;
//! nothing is written until rendering has succeeded.

mod error;

use std::fs;
use std::path::{Path, PathBuf};

use resgenie_config::{Config, TemplateSelection};
use resgenie_export::{write_markdown, Exporter, HtmlExporter, PdfExporter};
use resgenie_loader::{load, read_document, Resume, ValidationErrors};
use resgenie_render::{render, HtmlDocument, RenderOptions};
use resgenie_template::{bind, builtin, builtin_names, BindOptions, BoundDocument, Template};
use serde_json::Value;
use tracing::{debug, info, info_span};

pub use error::{ExitCode, GenerateError, GenerateResult};

/// Output formats the pipeline can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Pdf,
    Html,
    Markdown,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Pdf => "pdf",
            OutputFormat::Html => "html",
            OutputFormat::Markdown => "md",
        }
    }
}

/// One input file and where its output goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateRequest {
    pub input: PathBuf,
    pub output: PathBuf,
    pub format: OutputFormat,
}

impl GenerateRequest {
    /// Output lands next to the input with the format's extension.
    pub fn new(input: impl Into<PathBuf>, format: OutputFormat) -> Self {
        let input = input.into();
        let output = default_output(&input, format);
        GenerateRequest {
            input,
            output,
            format,
        }
    }

    pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = output.into();
        self
    }
}

/// `input` with its extension replaced by the one `format` produces.
pub fn default_output(input: &Path, format: OutputFormat) -> PathBuf {
    input.with_extension(format.extension())
}

/// Interpret a `--template` argument: a built-in name wins over a path.
pub fn template_selection(value: &str) -> TemplateSelection {
    if builtin_names().any(|name| name == value) {
        TemplateSelection::Builtin(value.to_string())
    } else {
        TemplateSelection::File(PathBuf::from(value))
    }
}

/// Everything the pipeline derived from one resume, before export.
#[derive(Debug, Clone)]
pub struct Prepared {
    pub resume: Resume,
    pub bound: BoundDocument,
    pub html: HtmlDocument,
}

/// Entry point for higher-level consumers (CLI, batch runs, tests).
pub struct ResGenie {
    config: Config,
    template: Template,
    bind_options: BindOptions,
    render_options: RenderOptions,
    pdf: PdfExporter,
}

impl ResGenie {
    /// Resolve the template and stylesheet named by `config`.
    pub fn bootstrap(config: Config) -> GenerateResult<Self> {
        let template = resolve_template(&config.template.selection)?;
        let stylesheet = match &config.render.stylesheet {
            Some(path) => Some(fs::read_to_string(path).map_err(|source| {
                GenerateError::Stylesheet {
                    path: path.clone(),
                    source,
                }
            })?),
            None => None,
        };

        let bind_options = BindOptions {
            present_label: config.render.present_label.clone(),
            date_format: config.render.date_format.clone(),
        };
        let render_options = RenderOptions {
            title: config.render.title.clone(),
            stylesheet,
        };
        let pdf = PdfExporter::from_settings(&config.export);

        debug!(template = template.name(), "bootstrapped resgenie");
        Ok(Self {
            config,
            template,
            bind_options,
            render_options,
            pdf,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    /// Validate a parsed document without rendering it.
    pub fn validate(&self, raw: &Value) -> Result<Resume, ValidationErrors> {
        load(raw, &self.config.validation)
    }

    /// Run every stage up to, but not including, export.
    pub fn prepare(&self, raw: &Value) -> GenerateResult<Prepared> {
        let resume = self.validate(raw)?;
        let bound = bind(&resume, &self.template, &self.bind_options).map_err(|source| {
            GenerateError::Template {
                name: self.template.name().to_string(),
                source,
            }
        })?;
        let html = render(&bound.tree, &self.render_options)?;
        Ok(Prepared {
            resume,
            bound,
            html,
        })
    }

    /// Read `request.input`, run the pipeline and write `request.output`.
    pub fn generate(&self, request: &GenerateRequest) -> GenerateResult<PathBuf> {
        let span = info_span!(
            "generate",
            input = %request.input.display(),
            format = request.format.extension()
        );
        let _guard = span.enter();

        let raw = read_document(&request.input)?;
        let prepared = self.prepare(&raw)?;
        debug!(
            sections = prepared.resume.sections().len(),
            bytes = prepared.html.as_str().len(),
            "rendered resume"
        );

        match request.format {
            OutputFormat::Markdown => write_markdown(&prepared.bound.markdown, &request.output)?,
            OutputFormat::Html => self.export_with(&HtmlExporter, &prepared.html, &request.output)?,
            OutputFormat::Pdf => self.export_with(&self.pdf, &prepared.html, &request.output)?,
        }

        info!(output = %request.output.display(), "generated resume");
        Ok(request.output.clone())
    }

    /// Export an already rendered page with a caller-chosen exporter.
    pub fn export_with(
        &self,
        exporter: &dyn Exporter,
        html: &HtmlDocument,
        output: &Path,
    ) -> GenerateResult<()> {
        exporter.export(html, output)?;
        Ok(())
    }
}

fn resolve_template(selection: &TemplateSelection) -> GenerateResult<Template> {
    match selection {
        TemplateSelection::Builtin(name) => {
            builtin(name).map_err(|source| GenerateError::Template {
                name: name.clone(),
                source,
            })
        }
        TemplateSelection::File(path) => {
            let source = fs::read_to_string(path).map_err(|source| {
                GenerateError::TemplateFile {
                    path: path.clone(),
                    source,
                }
            })?;
            let name = path.display().to_string();
            Template::parse(name.clone(), &source)
                .map_err(|source| GenerateError::Template { name, source })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_output_swaps_extension() {
        assert_eq!(
            default_output(Path::new("cv/resume.yaml"), OutputFormat::Pdf),
            PathBuf::from("cv/resume.pdf")
        );
        assert_eq!(
            default_output(Path::new("resume.json"), OutputFormat::Markdown),
            PathBuf::from("resume.md")
        );
        assert_eq!(
            default_output(Path::new("resume"), OutputFormat::Html),
            PathBuf::from("resume.html")
        );
    }

    #[test]
    fn template_argument_prefers_builtins() {
        assert_eq!(
            template_selection("compact"),
            TemplateSelection::Builtin("compact".to_string())
        );
        assert_eq!(
            template_selection("templates/compact.md"),
            TemplateSelection::File(PathBuf::from("templates/compact.md"))
        );
    }

    #[test]
    fn exit_codes_round_trip_through_u8() {
        for code in [
            ExitCode::Success,
            ExitCode::Unexpected,
            ExitCode::Validation,
            ExitCode::Template,
            ExitCode::Render,
            ExitCode::Export,
            ExitCode::Io,
        ] {
            assert_eq!(ExitCode::from_u8(code as u8), Some(code));
        }
        assert_eq!(ExitCode::from_u8(7), None);
    }
}
