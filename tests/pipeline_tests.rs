//! Integration tests for the batch conversion pipeline.

use std::path::{Path, PathBuf};

use assert_fs::prelude::*;
use predicates::prelude::*;

use eml2pdf::config::Config;
use eml2pdf::error::{ConvertError, Result};
use eml2pdf::pipeline::{run_batch, BatchOptions, BatchSummary};
use eml2pdf::render::pdf::PdfRenderer;

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Writes a placeholder PDF so the batch driver can run without wkhtmltopdf.
struct StubRenderer;

impl PdfRenderer for StubRenderer {
    fn render(&self, _html: &Path, pdf: &Path) -> Result<()> {
        std::fs::write(pdf, b"%PDF-1.4 stub\n").map_err(ConvertError::from)
    }
}

/// Always fails, like an engine exiting non-zero.
struct FailingRenderer;

impl PdfRenderer for FailingRenderer {
    fn render(&self, _html: &Path, _pdf: &Path) -> Result<()> {
        Err(ConvertError::ToolFailed {
            tool: "wkhtmltopdf".to_string(),
            status: "exit status: 1".to_string(),
            detail: "simulated failure".to_string(),
        })
    }
}

/// Config with the fallback extractor pointed at a tool that cannot exist,
/// so both extraction strategies fail for unparseable messages.
fn config_without_extractor() -> Config {
    let mut config = Config::default();
    config.tools.mime_extractor = "definitely-not-a-real-tool-xyz".to_string();
    config
}

fn convert(
    input: &Path,
    output: &Path,
    config: &Config,
    renderer: &dyn PdfRenderer,
    keep_html: bool,
) -> eml2pdf::error::Result<BatchSummary> {
    let opts = BatchOptions {
        input: input.to_path_buf(),
        output: output.to_path_buf(),
        keep_html,
    };
    run_batch(config, &opts, renderer, &|_, _| {})
}

fn stage(input: &assert_fs::TempDir, names: &[&str]) {
    for name in names {
        std::fs::copy(fixture(name), input.path().join(name)).unwrap();
    }
}

// ─── Empty input: exit 0, nothing created ───────────────────────────

#[test]
fn test_empty_input_dir_reports_zero() {
    let input = assert_fs::TempDir::new().unwrap();
    let output = assert_fs::TempDir::new().unwrap();
    input.child("readme.txt").write_str("not a message").unwrap();

    let summary = convert(
        input.path(),
        output.path(),
        &config_without_extractor(),
        &StubRenderer,
        false,
    )
    .unwrap();

    assert_eq!(summary.scanned, 0);
    assert_eq!(summary.converted, 0);
    output.child("pdfs").assert(predicate::path::missing());
}

// ─── Missing input directory is fatal ───────────────────────────────

#[test]
fn test_missing_input_dir_is_error() {
    let output = assert_fs::TempDir::new().unwrap();
    let err = convert(
        Path::new("/nonexistent/input/dir"),
        output.path(),
        &config_without_extractor(),
        &StubRenderer,
        false,
    )
    .unwrap_err();
    assert!(matches!(err, ConvertError::InputDirNotFound(_)));
}

// ─── Output path derivation ─────────────────────────────────────────

#[test]
fn test_pdf_path_matches_basename() {
    let input = assert_fs::TempDir::new().unwrap();
    let output = assert_fs::TempDir::new().unwrap();
    std::fs::copy(fixture("simple.eml"), input.path().join("Invoice 2024.eml")).unwrap();

    let summary = convert(
        input.path(),
        output.path(),
        &config_without_extractor(),
        &StubRenderer,
        false,
    )
    .unwrap();

    assert_eq!(summary.converted, 1);
    output
        .child("pdfs")
        .child("Invoice 2024.pdf")
        .assert(predicate::path::exists());
}

// ─── Header block contains all four values ──────────────────────────

#[test]
fn test_document_header_block_values() {
    let input = assert_fs::TempDir::new().unwrap();
    let output = assert_fs::TempDir::new().unwrap();
    stage(&input, &["simple.eml"]);

    convert(
        input.path(),
        output.path(),
        &config_without_extractor(),
        &StubRenderer,
        true,
    )
    .unwrap();

    let html =
        std::fs::read_to_string(output.path().join("pdfs").join("simple.html")).unwrap();
    assert!(html.contains("Alice Archer &lt;alice@example.com&gt;"));
    assert!(html.contains("Bob Byrne &lt;bob@example.com&gt;"));
    assert!(html.contains("Quarterly report"));
    assert!(html.contains("04 Jan 2024"));
    assert!(html.contains("Revenue is up, costs are flat."));
}

// ─── Missing Subject shows the fixed placeholder ────────────────────

#[test]
fn test_missing_subject_placeholder() {
    let input = assert_fs::TempDir::new().unwrap();
    let output = assert_fs::TempDir::new().unwrap();
    stage(&input, &["no_subject.eml"]);

    convert(
        input.path(),
        output.path(),
        &config_without_extractor(),
        &StubRenderer,
        true,
    )
    .unwrap();

    let html =
        std::fs::read_to_string(output.path().join("pdfs").join("no_subject.html")).unwrap();
    assert!(html.contains("(no subject)"));
}

// ─── Encoded-words decoded in the header block ──────────────────────

#[test]
fn test_encoded_words_decoded() {
    let input = assert_fs::TempDir::new().unwrap();
    let output = assert_fs::TempDir::new().unwrap();
    stage(&input, &["encoded.eml"]);

    convert(
        input.path(),
        output.path(),
        &config_without_extractor(),
        &StubRenderer,
        true,
    )
    .unwrap();

    let html =
        std::fs::read_to_string(output.path().join("pdfs").join("encoded.html")).unwrap();
    assert!(html.contains("José García"), "got: {html}");
    assert!(html.contains("Café con leña"), "got: {html}");
}

// ─── Attachments land in the per-message folder ─────────────────────

#[test]
fn test_attachment_extracted_to_message_folder() {
    let input = assert_fs::TempDir::new().unwrap();
    let output = assert_fs::TempDir::new().unwrap();
    stage(&input, &["attachment.eml"]);

    let summary = convert(
        input.path(),
        output.path(),
        &config_without_extractor(),
        &StubRenderer,
        false,
    )
    .unwrap();

    assert_eq!(summary.converted, 1);
    assert_eq!(summary.attachments_extracted, 1);

    let notes = output
        .path()
        .join("attachments")
        .join("attachment")
        .join("notes.txt");
    assert_eq!(
        std::fs::read_to_string(&notes).unwrap(),
        "Notes for the project.\n"
    );
    output
        .child("pdfs")
        .child("attachment.pdf")
        .assert(predicate::path::exists());
}

// ─── Messages without attachments create no folder ──────────────────

#[test]
fn test_no_attachment_folder_for_plain_message() {
    let input = assert_fs::TempDir::new().unwrap();
    let output = assert_fs::TempDir::new().unwrap();
    stage(&input, &["simple.eml"]);

    convert(
        input.path(),
        output.path(),
        &config_without_extractor(),
        &StubRenderer,
        false,
    )
    .unwrap();

    output
        .child("attachments")
        .child("simple")
        .assert(predicate::path::missing());
}

// ─── Both extractors failing does not block the PDF ─────────────────

#[test]
fn test_extraction_failure_still_produces_pdf() {
    let input = assert_fs::TempDir::new().unwrap();
    let output = assert_fs::TempDir::new().unwrap();
    stage(&input, &["malformed.eml"]);

    let summary = convert(
        input.path(),
        output.path(),
        &config_without_extractor(),
        &StubRenderer,
        false,
    )
    .unwrap();

    assert_eq!(summary.converted, 1);
    output
        .child("pdfs")
        .child("malformed.pdf")
        .assert(predicate::path::exists());
}

// ─── Render failure is tallied, batch continues ─────────────────────

#[test]
fn test_render_failure_does_not_abort_batch() {
    let input = assert_fs::TempDir::new().unwrap();
    let output = assert_fs::TempDir::new().unwrap();
    stage(&input, &["simple.eml", "attachment.eml"]);

    let summary = convert(
        input.path(),
        output.path(),
        &config_without_extractor(),
        &FailingRenderer,
        false,
    )
    .unwrap();

    assert_eq!(summary.scanned, 2);
    assert_eq!(summary.converted, 0);
    assert_eq!(summary.render_failures, 2);
    // Attachments are still extracted even when rendering fails
    assert_eq!(summary.attachments_extracted, 1);
    output
        .child("pdfs")
        .child("simple.pdf")
        .assert(predicate::path::missing());
}

// ─── A whole mixed batch ────────────────────────────────────────────

#[test]
fn test_mixed_batch_counts() {
    let input = assert_fs::TempDir::new().unwrap();
    let output = assert_fs::TempDir::new().unwrap();
    stage(
        &input,
        &[
            "simple.eml",
            "no_subject.eml",
            "attachment.eml",
            "encoded.eml",
            "malformed.eml",
        ],
    );

    let summary = convert(
        input.path(),
        output.path(),
        &config_without_extractor(),
        &StubRenderer,
        false,
    )
    .unwrap();

    assert_eq!(summary.scanned, 5);
    assert_eq!(summary.converted, 5);
    assert_eq!(summary.render_failures, 0);
    assert_eq!(summary.attachments_extracted, 1);
    assert!(summary.pdf_bytes > 0);
}
