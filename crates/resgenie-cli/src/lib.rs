use std::collections::HashMap;
use std::fmt::Display;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use resgenie_config::{Config, ConfigError, LoadOptions};
use resgenie_core::{
    default_output, template_selection, ExitCode, GenerateError, GenerateRequest, OutputFormat,
    ResGenie,
};
use resgenie_loader::{load, read_document};
use resgenie_template::builtin_names;
use serde_json::json;
use tracing::{debug, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Entry point for CLI execution. Returns the desired exit code.
pub fn run() -> Result<i32> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Build(args) => handle_build(args),
        Command::Validate(args) => handle_validate(args),
        Command::Batch(args) => handle_batch(args),
        Command::Templates => handle_templates(),
    }
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Generate a formatted resume from structured YAML or JSON",
    propagate_version = true
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render one resume to PDF, HTML or Markdown
    Build(BuildArgs),
    /// Check a resume and report every problem found
    Validate(ValidateArgs),
    /// Render several resumes in parallel into one directory
    Batch(BatchArgs),
    /// List the built-in templates
    Templates,
}

#[derive(Args)]
struct TemplateArgs {
    /// Built-in template name or path to a Markdown template
    #[arg(long, value_name = "NAME|PATH")]
    template: Option<String>,
    /// Use this configuration file instead of `.resgenie.toml`
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

#[derive(Args)]
struct BuildArgs {
    /// Resume source (.yaml, .yml or .json)
    #[arg(value_name = "INPUT")]
    input: PathBuf,
    /// Output path; defaults to the input path with the format's extension
    #[arg(short, long, value_name = "OUTPUT")]
    output: Option<PathBuf>,
    /// Output format
    #[arg(long, value_enum, default_value_t = FormatValue::Pdf)]
    format: FormatValue,
    #[command(flatten)]
    template: TemplateArgs,
}

#[derive(Args)]
struct ValidateArgs {
    /// Resume source (.yaml, .yml or .json)
    #[arg(value_name = "INPUT")]
    input: PathBuf,
    /// Report format
    #[arg(long, value_enum)]
    format: Option<ValidateFormatValue>,
    /// Use this configuration file instead of `.resgenie.toml`
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

#[derive(Args)]
struct BatchArgs {
    /// Resume sources
    #[arg(value_name = "INPUT", required = true, num_args = 1..)]
    inputs: Vec<PathBuf>,
    /// Directory receiving one output per input
    #[arg(long = "out-dir", value_name = "DIR")]
    out_dir: PathBuf,
    /// Output format
    #[arg(long, value_enum, default_value_t = FormatValue::Pdf)]
    format: FormatValue,
    #[command(flatten)]
    template: TemplateArgs,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum FormatValue {
    Pdf,
    Html,
    Markdown,
}

impl From<FormatValue> for OutputFormat {
    fn from(value: FormatValue) -> Self {
        match value {
            FormatValue::Pdf => OutputFormat::Pdf,
            FormatValue::Html => OutputFormat::Html,
            FormatValue::Markdown => OutputFormat::Markdown,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum ValidateFormatValue {
    Plain,
    Json,
}

fn handle_build(args: BuildArgs) -> Result<i32> {
    let BuildArgs {
        input,
        output,
        format,
        template,
    } = args;

    let genie = match bootstrap(&template) {
        Ok(genie) => genie,
        Err(code) => return Ok(code),
    };

    let mut request = GenerateRequest::new(input, format.into());
    if let Some(output) = output {
        request = request.with_output(output);
    }

    match genie.generate(&request) {
        Ok(written) => {
            emit(&format!("wrote {}", written.display()))?;
            Ok(0)
        }
        Err(err) => Ok(report(&err, err.exit_code())),
    }
}

fn handle_validate(args: ValidateArgs) -> Result<i32> {
    let ValidateArgs {
        input,
        format,
        config,
    } = args;
    let format = format.unwrap_or(ValidateFormatValue::Plain);

    let config = match load_config(config) {
        Ok(config) => config,
        Err(err) => return Ok(report(&err, ExitCode::Io)),
    };
    let raw = match read_document(&input) {
        Ok(raw) => raw,
        Err(err) => {
            let err = GenerateError::from(err);
            return Ok(report(&err, err.exit_code()));
        }
    };

    match (load(&raw, &config.validation), format) {
        (Ok(_), ValidateFormatValue::Plain) => {
            emit(&format!("{}: ok", input.display()))?;
            Ok(0)
        }
        (Ok(resume), ValidateFormatValue::Json) => {
            let payload = json!({ "valid": true, "resume": resume });
            emit(&serde_json::to_string_pretty(&payload)?)?;
            Ok(0)
        }
        (Err(errors), ValidateFormatValue::Plain) => {
            let mut lines = vec![format!(
                "{}: {} issue(s)",
                input.display(),
                errors.len()
            )];
            lines.extend(errors.iter().map(|issue| format!("  {issue}")));
            emit(&lines.join("\n"))?;
            Ok(ExitCode::Validation as i32)
        }
        (Err(errors), ValidateFormatValue::Json) => {
            let payload = json!({ "valid": false, "issues": errors });
            emit(&serde_json::to_string_pretty(&payload)?)?;
            Ok(ExitCode::Validation as i32)
        }
    }
}

fn handle_batch(args: BatchArgs) -> Result<i32> {
    let BatchArgs {
        inputs,
        out_dir,
        format,
        template,
    } = args;
    let format = OutputFormat::from(format);

    let genie = match bootstrap(&template) {
        Ok(genie) => genie,
        Err(code) => return Ok(code),
    };

    debug!(inputs = inputs.len(), out_dir = %out_dir.display(), "starting batch");
    let planned: Vec<(PathBuf, BatchOutcome)> = inputs
        .into_iter()
        .map(|input| {
            let output = batch_output(&out_dir, &input, format)
                .map_err(|err| (err.exit_code(), summarize(&err)));
            (input, output)
        })
        .collect();

    let mut claims: HashMap<PathBuf, usize> = HashMap::new();
    for output in planned.iter().filter_map(|(_, output)| output.as_ref().ok()) {
        *claims.entry(output.clone()).or_default() += 1;
    }

    let outcomes = resgenie_utils::parallel_map(planned, |(input, output)| {
        let outcome = output.and_then(|output| {
            if claims.get(&output).copied().unwrap_or_default() > 1 {
                warn!(
                    input = %input.display(),
                    output = %output.display(),
                    "skipping input with a shared output path"
                );
                return Err((
                    ExitCode::Io,
                    format!("output {} is shared with another input", output.display()),
                ));
            }
            genie
                .generate(&GenerateRequest::new(input.clone(), format).with_output(output))
                .map_err(|err| (err.exit_code(), summarize(&err)))
        });
        (input, outcome)
    });

    let mut exit_code = 0;
    let mut lines = Vec::with_capacity(outcomes.len());
    for (input, outcome) in outcomes {
        match outcome {
            Ok(written) => lines.push(format!("ok {} -> {}", input.display(), written.display())),
            Err((code, summary)) => {
                if exit_code == 0 {
                    exit_code = code as i32;
                }
                lines.push(format!("error {}: {summary}", input.display()));
            }
        }
    }
    emit(&lines.join("\n"))?;
    Ok(exit_code)
}

fn handle_templates() -> Result<i32> {
    let names: Vec<&str> = builtin_names().collect();
    emit(&names.join("\n"))?;
    Ok(0)
}

fn bootstrap(args: &TemplateArgs) -> std::result::Result<ResGenie, i32> {
    let mut config = load_config(args.config.clone()).map_err(|err| report(&err, ExitCode::Io))?;
    if let Some(value) = &args.template {
        config.template.selection = template_selection(value);
    }
    ResGenie::bootstrap(config).map_err(|err| report(&err, err.exit_code()))
}

fn load_config(path: Option<PathBuf>) -> std::result::Result<Config, ConfigError> {
    let mut options = LoadOptions::default();
    if let Some(path) = path {
        options = options.with_override_path(path);
    }
    Config::load(options)
}

/// Written path on success, or the exit code and one-line summary of the failure.
type BatchOutcome = std::result::Result<PathBuf, (ExitCode, String)>;

/// Output path for one batch input: its file name, re-extended, under `out_dir`.
fn batch_output(
    out_dir: &Path,
    input: &Path,
    format: OutputFormat,
) -> std::result::Result<PathBuf, GenerateError> {
    match input.file_name() {
        Some(name) => Ok(out_dir.join(default_output(Path::new(name), format))),
        None => Err(GenerateError::Source(resgenie_loader::SourceError::UnsupportedExtension {
            path: input.to_path_buf(),
        })),
    }
}

/// Single-line form of an error for batch results.
fn summarize(err: &GenerateError) -> String {
    match err {
        GenerateError::Validation(errors) => {
            let first = errors
                .iter()
                .next()
                .map(|issue| format!(" (first: {issue})"))
                .unwrap_or_default();
            format!("{} validation issue(s){first}", errors.len())
        }
        other => other.to_string(),
    }
}

fn report(err: &dyn Display, code: ExitCode) -> i32 {
    eprintln!("resgenie error: {err}");
    code as i32
}

fn emit(text: &str) -> Result<()> {
    let mut stdout = io::stdout().lock();
    stdout.write_all(text.as_bytes())?;
    if !text.ends_with('\n') {
        stdout.write_all(b"\n")?;
    }
    Ok(())
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_env("RESGENIE_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_target(false)
                .compact(),
        )
        .try_init();
}
