use pretty_assertions::assert_eq;
use resgenie_loader::{load, parse_document, DocumentFormat, Resume, ValidationSettings};
use resgenie_template::tree::Block;
use resgenie_template::{bind, builtin, BindOptions, Template, TemplateError};
use resgenie_test_support::{minimal_resume, SAMPLE_YAML};

fn sample() -> Resume {
    let raw = parse_document(SAMPLE_YAML, DocumentFormat::Yaml).expect("sample parses");
    load(&raw, &ValidationSettings::default()).expect("sample loads")
}

fn minimal() -> Resume {
    load(&minimal_resume(), &ValidationSettings::default()).expect("minimal loads")
}

#[test]
fn default_template_binds_minimal_resume() {
    let template = builtin("default").expect("default template");
    let bound = bind(&minimal(), &template, &BindOptions::default()).expect("binds");

    assert_eq!(
        bound.markdown,
        r"# A\. Author

a@example\.com

## Experience

### Engineer, Acme

*Jan 2020 – Present*

- Built X

---

*Generated with [resgenie](https://github.com/interifter/resgenie)*
"
    );
    assert_eq!(
        bound.tree.headings(),
        vec![
            (1, "A. Author".to_string()),
            (2, "Experience".to_string()),
            (3, "Engineer, Acme".to_string()),
        ]
    );
}

#[test]
fn default_template_lists_entry_details_after_bullets() {
    let mut raw = minimal_resume();
    raw["sections"][0]["entries"][0]["gpa"] = serde_json::json!(3.8);
    raw["sections"][0]["entries"][0]["minor"] = serde_json::json!("Mathematics");
    let resume = load(&raw, &ValidationSettings::default()).expect("loads");

    let template = builtin("default").expect("default template");
    let bound = bind(&resume, &template, &BindOptions::default()).expect("binds");
    assert!(
        bound
            .markdown
            .contains("- Built X\n- *GPA: 3\\.8*\n- *Minor: Mathematics*\n"),
        "{}",
        bound.markdown
    );
}

#[test]
fn default_template_renders_every_part_of_the_sample() {
    let template = builtin("default").expect("default template");
    let bound = bind(&sample(), &template, &BindOptions::default()).expect("binds");

    let headings: Vec<String> = bound
        .tree
        .headings()
        .into_iter()
        .map(|(_, text)| text)
        .collect();
    assert_eq!(
        headings,
        [
            "Jordan Rivera",
            "Summary",
            "Skills",
            "Experience",
            "Senior Engineer, Acme Corp",
            "Engineer, Initech",
            "Education",
            "B.S. Computer Science, Portland State University",
        ]
    );

    assert!(bound
        .markdown
        .contains(r"· [GitHub](<https://github.com/jrivera>) · [jrivera\.dev](<https://jrivera.dev/>)"));
    assert!(bound.markdown.contains("*Mar 2021 – Present* · Remote"));
    assert!(bound.markdown.contains("*Sep 2013 – Jun 2017*"));
    assert!(bound.markdown.contains("Payments platform team\\."));

    let table = bound
        .tree
        .blocks
        .iter()
        .find_map(|block| match block {
            Block::Table { rows, .. } => Some(rows.len()),
            _ => None,
        })
        .expect("skills table");
    assert_eq!(table, 2);
}

#[test]
fn compact_template_lists_entries_inline() {
    let template = builtin("compact").expect("compact template");
    let bound = bind(&sample(), &template, &BindOptions::default()).expect("binds");

    assert!(bound
        .markdown
        .contains("- **Senior Engineer**, Acme Corp (Mar 2021 – Present)"));
    assert!(bound.markdown.contains("- **Languages:** Rust, Python, SQL"));
    assert!(bound.markdown.contains("- **Tools:** Kafka, Postgres"));
}

#[test]
fn binding_is_deterministic() {
    let template = builtin("default").expect("default template");
    let options = BindOptions::default();
    let first = bind(&sample(), &template, &options).expect("first bind");
    let second = bind(&sample(), &template, &options).expect("second bind");
    assert_eq!(first, second);
}

#[test]
fn custom_options_change_dates() {
    let template = Template::parse(
        "dates",
        "{{#sections}}\n{{#section.entries}}\n{{entry.start_date}} to {{entry.end_date}}\n{{/section.entries}}\n{{/sections}}\n",
    )
    .expect("template parses");
    let options = BindOptions {
        present_label: "Current".to_string(),
        date_format: "%m/%Y".to_string(),
    };
    let bound = bind(&minimal(), &template, &options).expect("binds");
    assert_eq!(bound.markdown, "01/2020 to Current\n");
}

#[test]
fn user_values_cannot_inject_markup() {
    let mut raw = minimal_resume();
    raw["sections"][0]["entries"][0]["bullets"] =
        serde_json::json!(["<script>alert(1)</script>", "![img](x.png)", "line\n\n```\ncode"]);
    let resume = load(&raw, &ValidationSettings::default()).expect("loads");

    let template = builtin("default").expect("default template");
    let bound = bind(&resume, &template, &BindOptions::default()).expect("escaped values bind");
    assert!(bound.markdown.contains(r"- \<script\>alert\(1\)\</script\>"));
}

#[test]
fn template_errors_surface_from_parse() {
    let err = Template::parse("broken", "# {{contact.name}}\n{{#sections}}\n").unwrap_err();
    assert!(matches!(err, TemplateError::UnbalancedBlock { line: 2, .. }));
}
