use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use resgenie_config::{
    Config, ConfigError, ConfigSourceKind, LoadOptions, TemplateSelection, CONFIG_FILE_NAME,
};
use tempfile::TempDir;

fn write_file(path: impl AsRef<Path>, contents: &str) {
    let mut file = fs::File::create(path).expect("create config");
    file.write_all(contents.as_bytes()).expect("write config");
}

fn canonical(path: impl AsRef<Path>) -> PathBuf {
    fs::canonicalize(path).expect("canonicalize path")
}

#[test]
fn loads_defaults_when_no_files_present() {
    let temp = TempDir::new().expect("tempdir");
    let working_dir = canonical(temp.path());

    let config = Config::load(LoadOptions::default().with_working_dir(working_dir.clone()))
        .expect("load defaults");

    assert_eq!(
        config.template.selection,
        TemplateSelection::Builtin("default".into())
    );
    assert_eq!(config.render.title, "Resume");
    assert_eq!(config.render.present_label, "Present");
    assert!(config.render.stylesheet.is_none());
    assert!(!config.validation.require_phone);
    assert!(config.validation.allow_partial_dates);
    assert_eq!(config.sources.working_directory, working_dir);
    assert_eq!(config.sources.layers.len(), 1);
    assert_eq!(config.sources.layers[0].kind, ConfigSourceKind::Default);
}

#[test]
fn applies_precedence_and_merges_fields() {
    let temp = TempDir::new().expect("tempdir");
    let git_root = canonical(temp.path());
    fs::create_dir(git_root.join(".git")).expect("create .git");

    write_file(
        git_root.join(CONFIG_FILE_NAME),
        r#"
        [render]
        title = "Root Resume"
        date_format = "%Y"

        [export]
        engine = "weasyprint"
        timeout_secs = 10
        "#,
    );

    let project = git_root.join("resumes");
    fs::create_dir(&project).expect("create project dir");
    write_file(
        project.join(CONFIG_FILE_NAME),
        r#"
        [render]
        title = "Local Resume"
        stylesheet = "style/print.css"

        [validation]
        require_phone = true
        "#,
    );

    let config =
        Config::load(LoadOptions::default().with_working_dir(&project)).expect("load layered");

    assert_eq!(config.render.title, "Local Resume");
    assert_eq!(config.render.date_format, "%Y");
    assert_eq!(
        config.render.stylesheet,
        Some(project.join("style/print.css"))
    );
    assert!(config.validation.require_phone);
    assert_eq!(config.export.engine, "weasyprint");
    assert_eq!(config.export.timeout, Duration::from_secs(10));

    let kinds: Vec<_> = config.sources.layers.iter().map(|layer| layer.kind).collect();
    assert_eq!(
        kinds,
        vec![
            ConfigSourceKind::Default,
            ConfigSourceKind::GitRoot,
            ConfigSourceKind::Local
        ]
    );
}

#[test]
fn override_path_wins_and_resolves_template_relative_to_file() {
    let temp = TempDir::new().expect("tempdir");
    let working_dir = canonical(temp.path());
    write_file(
        working_dir.join(CONFIG_FILE_NAME),
        "[template]\nname = \"compact\"\n",
    );

    let extra = working_dir.join("profiles");
    fs::create_dir(&extra).expect("create profiles");
    write_file(
        extra.join("print.toml"),
        "[template]\npath = \"templates/print.md\"\n",
    );

    let config = Config::load(
        LoadOptions::default()
            .with_working_dir(&working_dir)
            .with_override_path("profiles/print.toml"),
    )
    .expect("load override");

    assert_eq!(
        config.template.selection,
        TemplateSelection::File(extra.join("templates/print.md"))
    );
    assert_eq!(
        config.sources.layers.last().map(|layer| layer.kind),
        Some(ConfigSourceKind::Override)
    );
}

#[test]
fn missing_override_is_reported() {
    let temp = TempDir::new().expect("tempdir");
    let err = Config::load(
        LoadOptions::default()
            .with_working_dir(temp.path())
            .with_override_path("nope.toml"),
    )
    .expect_err("override should be missing");
    assert!(matches!(err, ConfigError::OverrideNotFound { .. }));
}

#[test]
fn parse_errors_name_the_file() {
    let temp = TempDir::new().expect("tempdir");
    write_file(temp.path().join(CONFIG_FILE_NAME), "[render\ntitle = 1");

    let err = Config::load(LoadOptions::default().with_working_dir(temp.path()))
        .expect_err("invalid toml");
    match err {
        ConfigError::Parse { path, .. } => assert!(path.ends_with(CONFIG_FILE_NAME)),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn collects_every_validation_failure() {
    let temp = TempDir::new().expect("tempdir");
    write_file(
        temp.path().join(CONFIG_FILE_NAME),
        r#"
        [template]
        name = "default"
        path = "mine.md"

        [render]
        present_label = "  "
        date_format = "%Y-%"

        [export]
        timeout_secs = 0
        "#,
    );

    let err = Config::load(LoadOptions::default().with_working_dir(temp.path()))
        .expect_err("validation should fail");
    let errors = match err {
        ConfigError::Validation(errors) => errors,
        other => panic!("unexpected error: {other}"),
    };

    let contexts: Vec<String> = errors
        .iter()
        .filter_map(|error| error.context.clone())
        .collect();
    assert_eq!(
        contexts,
        vec![
            "template".to_string(),
            "render.present_label".to_string(),
            "render.date_format".to_string(),
            "export.timeout_secs".to_string(),
        ]
    );

    let rendered = errors.to_string();
    assert!(rendered.contains("local config at"));
}
