use specup::assets::AssetBundle;
use specup::document_config::{self, DocumentConfig, RawDocumentConfig};
use specup::page_shell::StandardShell;
use specup::{Assembler, DocumentBuilder, MarkdownEngine, Orchestrator, RunOptions};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

fn assembler() -> Assembler {
    Assembler::new(Arc::new(MarkdownEngine::default()))
}

fn config_for(dir: &Path, fragments: &[&str]) -> DocumentConfig {
    DocumentConfig::from_raw(RawDocumentConfig {
        spec_directory: dir.to_str().unwrap().to_string(),
        markdown_paths: Some(fragments.iter().map(|f| f.to_string()).collect()),
        ..RawDocumentConfig::default()
    })
    .unwrap()
}

/// Collect every `id="..."` attribute value of notice wrappers
fn notice_ids(html: &str) -> Vec<String> {
    html.split("<div id=\"")
        .skip(1)
        .filter_map(|rest| rest.split('"').next())
        .map(str::to_string)
        .collect()
}

#[tokio::test]
async fn test_notice_ids_are_unique_within_document() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("spec.md"),
        "::: notice note\none\n:::\n\n\
         ::: notice note\ntwo\n:::\n\n\
         ::: notice issue My Cool Note\nthree\n:::\n\n\
         ::: notice example My Cool Note\nfour\n:::\n",
    )
    .unwrap();

    let output = assembler()
        .render(&config_for(dir.path(), &["spec.md"]))
        .await
        .unwrap();

    assert_eq!(
        notice_ids(&output.html),
        vec!["note-1", "note-2", "my-cool-note", "my-cool-note-2"]
    );
}

#[tokio::test]
async fn test_repeated_renders_produce_identical_ids() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("spec.md"),
        "::: notice todo\na\n:::\n\n::: notice todo Fix Me\nb\n:::\n\n::: notice todo Fix Me\nc\n:::\n",
    )
    .unwrap();
    let assembler = assembler();
    let config = config_for(dir.path(), &["spec.md"]);

    let first = assembler.render(&config).await.unwrap();
    let second = assembler.render(&config).await.unwrap();

    assert_eq!(notice_ids(&first.html), vec!["todo-1", "fix-me", "fix-me-2"]);
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_unknown_notice_type_falls_through() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("spec.md"), "::: notice banana\nPeel\n:::\n").unwrap();

    let output = assembler()
        .render(&config_for(dir.path(), &["spec.md"]))
        .await
        .unwrap();

    assert!(!output.html.contains("class=\"notice banana\""));
    assert!(output.html.contains("<p>::: notice banana"));
}

#[tokio::test]
async fn test_fragment_order_is_preserved() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("a.md"), "# A").unwrap();
    std::fs::write(dir.path().join("b.md"), "# B").unwrap();

    let output = assembler()
        .render(&config_for(dir.path(), &["a.md", "b.md"]))
        .await
        .unwrap();

    let a = output.html.find(">A</h1>").unwrap();
    let b = output.html.find(">B</h1>").unwrap();
    assert!(a < b);
}

#[tokio::test]
async fn test_documents_do_not_share_notice_counters() {
    let with_notice = TempDir::new().unwrap();
    let without_notice = TempDir::new().unwrap();
    std::fs::write(with_notice.path().join("spec.md"), "::: notice note\nx\n:::\n").unwrap();
    std::fs::write(without_notice.path().join("spec.md"), "Plain text only.\n").unwrap();
    let assembler = assembler();

    let first = assembler
        .render(&config_for(with_notice.path(), &["spec.md"]))
        .await
        .unwrap();
    let second = assembler
        .render(&config_for(without_notice.path(), &["spec.md"]))
        .await
        .unwrap();
    let again = assembler
        .render(&config_for(with_notice.path(), &["spec.md"]))
        .await
        .unwrap();

    assert_eq!(notice_ids(&first.html), vec!["note-1"]);
    assert!(notice_ids(&second.html).is_empty());
    assert_eq!(notice_ids(&again.html), vec!["note-1"]);
}

#[tokio::test]
async fn test_end_to_end_single_run_from_config_file() {
    let root = TempDir::new().unwrap();
    let spec_dir = root.path().join("spec");
    std::fs::create_dir_all(&spec_dir).unwrap();
    std::fs::write(
        spec_dir.join("spec.md"),
        "# Spec\n\n## Usage\n\n::: notice warning Deprecated\nOld behaviour.\n:::\n",
    )
    .unwrap();

    let config_path = root.path().join("specs.json");
    std::fs::write(
        &config_path,
        format!(
            r#"{{ "specs": [{{ "spec_directory": "{}/", "markdown_paths": ["spec.md"], "title": "Spec" }}] }}"#,
            spec_dir.display()
        ),
    )
    .unwrap();

    let configs = document_config::load(&config_path).unwrap();
    let orchestrator = Orchestrator::new(
        DocumentBuilder::new(assembler(), Box::new(StandardShell), AssetBundle::empty()),
        RunOptions {
            single_run: true,
            ..RunOptions::default()
        },
    );

    let summary = orchestrator.run(&configs).await;
    assert!(summary.is_success());
    assert_eq!(summary.exit_code(), 0);

    let page = std::fs::read_to_string(spec_dir.join("index.html")).unwrap();
    assert_eq!(page.matches("id=\"deprecated\"").count(), 1);
    assert_eq!(page.matches("class=\"notice warning\"").count(), 1);
    assert!(page.contains("<a href=\"#usage\">Usage</a>"));
    assert!(page.contains("window.specConfig = {"));
}

#[tokio::test]
async fn test_single_run_reports_failure_exit_code() {
    let root = TempDir::new().unwrap();
    let orchestrator = Orchestrator::new(
        DocumentBuilder::new(assembler(), Box::new(StandardShell), AssetBundle::empty()),
        RunOptions {
            single_run: true,
            ..RunOptions::default()
        },
    );

    let summary = orchestrator
        .run(&[config_for(root.path(), &["missing.md"])])
        .await;

    assert_eq!(summary.failed, 1);
    assert_ne!(summary.exit_code(), 0);
}
