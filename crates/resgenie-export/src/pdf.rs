use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use resgenie_config::ExportSettings;
use resgenie_render::HtmlDocument;
use tracing::{debug, info, warn};

use crate::error::ExportError;
use crate::{check_markup, Exporter};

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Converts HTML to PDF by running an external engine as
/// `<engine> <args…> <input.html> <output.pdf>`.
#[derive(Debug, Clone)]
pub struct PdfExporter {
    engine: String,
    args: Vec<String>,
    timeout: Duration,
}

impl PdfExporter {
    pub fn new(engine: impl Into<String>, args: Vec<String>, timeout: Duration) -> Self {
        PdfExporter {
            engine: engine.into(),
            args,
            timeout,
        }
    }

    pub fn from_settings(settings: &ExportSettings) -> Self {
        PdfExporter::new(
            settings.engine.clone(),
            settings.args.clone(),
            settings.timeout,
        )
    }

    pub fn engine(&self) -> &str {
        &self.engine
    }

    /// Resolve the engine to an executable path.
    pub fn locate(&self) -> Result<PathBuf, ExportError> {
        which::which(&self.engine).map_err(|err| {
            debug!(engine = %self.engine, error = %err, "engine lookup failed");
            ExportError::EngineUnavailable {
                engine: self.engine.clone(),
            }
        })
    }

    fn run(&self, program: &Path, input: &Path, output: &Path) -> Result<(), ExportError> {
        let mut command = Command::new(program);
        command
            .args(&self.args)
            .arg(input)
            .arg(output)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        own_process_group(&mut command);
        let mut child = command
            .spawn()
            .map_err(|source| {
                ExportError::io(format!("failed to start {}", program.display()), source)
            })?;

        // Drain stderr concurrently so a chatty engine cannot block on a full pipe.
        let stderr = child.stderr.take();
        let reader = thread::spawn(move || {
            let mut diagnostic = String::new();
            if let Some(mut stderr) = stderr {
                let _ = stderr.read_to_string(&mut diagnostic);
            }
            diagnostic
        });

        let started = Instant::now();
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) if started.elapsed() >= self.timeout => {
                    warn!(engine = %self.engine, timeout = ?self.timeout, "engine timed out; killing it");
                    terminate(&mut child);
                    // A surviving descendant may still hold stderr open; leave the reader detached.
                    drop(reader);
                    return Err(ExportError::Timeout {
                        engine: self.engine.clone(),
                        timeout: self.timeout,
                    });
                }
                Ok(None) => thread::sleep(POLL_INTERVAL),
                Err(source) => {
                    terminate(&mut child);
                    return Err(ExportError::io("failed to wait for PDF engine", source));
                }
            }
        };

        let diagnostic = reader.join().unwrap_or_default();
        debug!(engine = %self.engine, elapsed = ?started.elapsed(), %status, "engine finished");
        check_status(status, diagnostic)
    }
}

/// Run the engine as the leader of a new process group so a timeout can
/// reach every process it spawned.
#[cfg(unix)]
fn own_process_group(command: &mut Command) {
    use std::os::unix::process::CommandExt;
    command.process_group(0);
}

#[cfg(not(unix))]
fn own_process_group(_command: &mut Command) {}

/// Kill the engine and everything in its process group, then reap it.
fn terminate(child: &mut Child) {
    kill_group(child);
    let _ = child.kill();
    let _ = child.wait();
}

#[cfg(unix)]
fn kill_group(child: &Child) {
    if let Ok(pid) = i32::try_from(child.id()) {
        // SAFETY: `kill` has no memory-safety preconditions; the negative pid
        // targets the group created for this child by `own_process_group`.
        unsafe {
            libc::kill(-pid, libc::SIGKILL);
        }
    }
}

#[cfg(not(unix))]
fn kill_group(_child: &Child) {}

fn check_status(status: ExitStatus, diagnostic: String) -> Result<(), ExportError> {
    if status.success() {
        return Ok(());
    }
    Err(ExportError::EngineFailed {
        status: status.code(),
        diagnostic: diagnostic.trim().to_string(),
    })
}

impl Exporter for PdfExporter {
    fn export(&self, document: &HtmlDocument, output: &Path) -> Result<(), ExportError> {
        check_markup(document)?;
        let program = self.locate()?;

        let stage_input = |source| ExportError::io("failed to stage HTML for the PDF engine", source);
        let mut input = resgenie_utils::staging_file(output, ".html").map_err(stage_input)?;
        input.write_all(document.as_bytes()).map_err(stage_input)?;
        input.flush().map_err(stage_input)?;

        let staged = resgenie_utils::staging_file(output, ".pdf")
            .map_err(|source| ExportError::io("failed to stage PDF output", source))?;

        self.run(&program, input.path(), staged.path())?;

        // The engine may replace the staged file rather than write into it.
        let produced = std::fs::metadata(staged.path())
            .map(|meta| meta.len())
            .unwrap_or(0);
        if produced == 0 {
            return Err(ExportError::EngineFailed {
                status: Some(0),
                diagnostic: "engine reported success but wrote no output".to_string(),
            });
        }

        resgenie_utils::persist(staged, output).map_err(|source| {
            ExportError::io(format!("failed to move PDF to {}", output.display()), source)
        })?;
        info!(path = %output.display(), bytes = produced, engine = %self.engine, "wrote pdf");
        Ok(())
    }
}
