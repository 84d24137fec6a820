//! Shared fixtures for resgenie tests.

use std::fs;
use std::path::{Path, PathBuf};

use resgenie_config::Config;
use serde_json::{json, Value};

/// A full resume exercising every optional field and both skill spellings.
pub const SAMPLE_YAML: &str = r#"contact:
  name: Jordan Rivera
  email: jordan.rivera@example.com
  phone: (503) 555-0142
  location: Portland, OR
  links:
    - label: GitHub
      url: https://github.com/jrivera
    - https://jrivera.dev
summary: Backend engineer focused on data pipelines & developer tooling.
sections:
  - title: Experience
    entries:
      - heading: Senior Engineer
        organization: Acme Corp
        location: Remote
        start_date: 2021-03-01
        end_date: present
        bullets:
          - Led the migration to event-driven ingestion
          - Cut p99 latency by 40%
      - heading: Engineer
        organization: Initech
        start_date: 2017-06-01
        end_date: 2021-02-28
        summary: Payments platform team.
        bullets:
          - Built the reconciliation service
  - title: Education
    entries:
      - heading: B.S. Computer Science
        institution: Portland State University
        start: 2013-09
        end: 2017-06
skills:
  Languages:
    rank: 1
    items: [Rust, Python, SQL]
  Tools:
    rank: 2
    entries: [Kafka, Postgres]
"#;

/// The smallest document that loads.
pub const MINIMAL_JSON: &str = r#"{
  "contact": {"name": "A. Author", "email": "a@example.com"},
  "sections": [
    {
      "title": "Experience",
      "entries": [
        {
          "heading": "Engineer",
          "organization": "Acme",
          "start_date": "2020-01-01",
          "end_date": "present",
          "bullets": ["Built X"]
        }
      ]
    }
  ]
}"#;

/// [`MINIMAL_JSON`] as a value tree.
pub fn minimal_resume() -> Value {
    json!({
        "contact": {"name": "A. Author", "email": "a@example.com"},
        "sections": [{
            "title": "Experience",
            "entries": [{
                "heading": "Engineer",
                "organization": "Acme",
                "start_date": "2020-01-01",
                "end_date": "present",
                "bullets": ["Built X"]
            }]
        }]
    })
}

/// Returns a baseline configuration for tests.
pub fn test_config() -> Config {
    Config::default()
}

/// Write `contents` to `dir/name`, returning the full path.
pub fn write_fixture(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create fixture directory");
    }
    fs::write(&path, contents).expect("write fixture");
    path
}

/// A shell script standing in for the PDF engine: copies the input (second to
/// last argument) to the output (last argument).
#[cfg(unix)]
pub fn fake_engine(dir: &Path) -> PathBuf {
    script(
        dir,
        "fake-engine.sh",
        "#!/bin/sh\nwhile [ \"$#\" -gt 2 ]; do shift; done\ncp \"$1\" \"$2\"\n",
    )
}

/// An engine that prints a diagnostic and exits non-zero.
#[cfg(unix)]
pub fn failing_engine(dir: &Path) -> PathBuf {
    script(
        dir,
        "failing-engine.sh",
        "#!/bin/sh\necho 'engine exploded' >&2\nexit 3\n",
    )
}

/// An engine that never finishes on its own.
#[cfg(unix)]
pub fn hanging_engine(dir: &Path) -> PathBuf {
    script(dir, "hanging-engine.sh", "#!/bin/sh\nexec sleep 30\n")
}

/// An engine whose shell stays the parent of a long-running child, so the
/// child keeps stderr open after the shell itself is killed.
#[cfg(unix)]
pub fn forking_engine(dir: &Path) -> PathBuf {
    script(
        dir,
        "forking-engine.sh",
        "#!/bin/sh\nsleep 30\necho 'woke up' >&2\n",
    )
}

#[cfg(unix)]
fn script(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = write_fixture(dir, name, body);
    let mut perms = fs::metadata(&path).expect("script metadata").permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).expect("make script executable");
    path
}
