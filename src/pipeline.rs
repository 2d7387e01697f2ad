//! The per-message processing pipeline and batch driver.
//!
//! One message flows through: attachment extraction, header scan, HTML
//! assembly, PDF rendering. Every per-message failure is tallied and the
//! batch carries on; the working directory is removed whatever happens.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::config::Config;
use crate::error::{ConvertError, Result};
use crate::extract;
use crate::parser::{eml, header, mime};
use crate::render::html;
use crate::render::pdf::PdfRenderer;

/// Options for one batch run.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Directory scanned for `.eml` files.
    pub input: PathBuf,
    /// Root under which `pdfs/` and `attachments/` are created.
    pub output: PathBuf,
    /// Copy the intermediate HTML next to each PDF.
    pub keep_html: bool,
}

/// What happened to a single message.
#[derive(Debug)]
pub struct MessageOutcome {
    pub basename: String,
    /// The written PDF, or `None` when rendering failed.
    pub pdf: Option<PathBuf>,
    /// Number of attachments placed in the output folder.
    pub attachments: usize,
    /// `true` when both extraction strategies failed.
    pub attachments_failed: bool,
}

/// Aggregated results of a batch run.
#[derive(Debug, Default)]
pub struct BatchSummary {
    pub scanned: usize,
    pub converted: usize,
    pub render_failures: usize,
    pub attachments_extracted: usize,
    pub attachment_failures: usize,
    /// Total size of the PDFs written.
    pub pdf_bytes: u64,
    pub pdf_dir: PathBuf,
    pub attachments_dir: PathBuf,
}

/// Convert every `.eml` file in `opts.input`.
///
/// Per-message failures never abort the batch; the hard errors are a
/// missing input directory and an unwritable output root. The progress
/// callback receives `(current, total)`.
pub fn run_batch(
    config: &Config,
    opts: &BatchOptions,
    renderer: &dyn PdfRenderer,
    progress: &dyn Fn(usize, usize),
) -> Result<BatchSummary> {
    let messages = eml::discover_messages(&opts.input)?;

    let pdf_dir = opts.output.join("pdfs");
    let attachments_dir = opts.output.join("attachments");

    let mut summary = BatchSummary {
        scanned: messages.len(),
        pdf_dir: pdf_dir.clone(),
        attachments_dir: attachments_dir.clone(),
        ..Default::default()
    };

    if messages.is_empty() {
        return Ok(summary);
    }

    std::fs::create_dir_all(&pdf_dir).map_err(|e| ConvertError::io(&pdf_dir, e))?;

    let total = messages.len();
    for (i, msg_path) in messages.iter().enumerate() {
        progress(i, total);

        let outcome = process_message(
            config,
            msg_path,
            &pdf_dir,
            &attachments_dir,
            renderer,
            opts.keep_html,
        );

        if let Some(pdf) = &outcome.pdf {
            summary.converted += 1;
            summary.pdf_bytes += std::fs::metadata(pdf).map(|m| m.len()).unwrap_or(0);
        } else {
            summary.render_failures += 1;
        }
        summary.attachments_extracted += outcome.attachments;
        if outcome.attachments_failed {
            summary.attachment_failures += 1;
        }
    }
    progress(total, total);

    Ok(summary)
}

/// Run one message through the whole pipeline.
///
/// Never returns an error: each step either succeeds, falls back, or is
/// recorded in the outcome.
fn process_message(
    config: &Config,
    msg_path: &Path,
    pdf_dir: &Path,
    attachments_dir: &Path,
    renderer: &dyn PdfRenderer,
    keep_html: bool,
) -> MessageOutcome {
    let basename = eml::basename(msg_path);
    let mut outcome = MessageOutcome {
        basename: basename.clone(),
        pdf: None,
        attachments: 0,
        attachments_failed: false,
    };

    let raw = match eml::read_message(msg_path) {
        Ok(raw) => raw,
        Err(e) => {
            warn!(path = %msg_path.display(), error = %e, "Skipping unreadable message");
            return outcome;
        }
    };

    // All intermediate state lives here; dropped (and deleted) on every
    // exit path below.
    let workdir = match tempfile::tempdir() {
        Ok(dir) => dir,
        Err(e) => {
            warn!(error = %e, "Could not create working directory");
            return outcome;
        }
    };

    let parsed = mime::parse_message(&raw);

    match extract::extract_attachments(
        msg_path,
        parsed.as_ref(),
        workdir.path(),
        &config.tools.mime_extractor,
    ) {
        Ok(files) => {
            let dest = attachments_dir.join(&basename);
            match extract::move_into_output(&files, &dest) {
                Ok(moved) => outcome.attachments = moved.len(),
                Err(e) => {
                    outcome.attachments_failed = true;
                    warn!(message = %basename, error = %e, "Could not place attachments");
                }
            }
        }
        Err(e) => {
            outcome.attachments_failed = true;
            warn!(
                message = %basename,
                error = %e,
                "Attachment extraction failed, continuing without"
            );
        }
    }

    let headers = header::scan_header_block(&raw, &config.general.date_format);
    let document = html::assemble_document(&headers, parsed.as_ref().map(|p| &p.body), &raw);

    let html_path = workdir.path().join(format!("{basename}.html"));
    if let Err(e) = std::fs::write(&html_path, &document) {
        warn!(message = %basename, error = %e, "Could not write intermediate HTML");
        return outcome;
    }

    if keep_html {
        let kept = pdf_dir.join(format!("{basename}.html"));
        if let Err(e) = std::fs::copy(&html_path, &kept) {
            warn!(message = %basename, error = %e, "Could not keep intermediate HTML");
        }
    }

    let pdf_path = pdf_dir.join(format!("{basename}.pdf"));
    match renderer.render(&html_path, &pdf_path) {
        Ok(()) => {
            info!(message = %basename, pdf = %pdf_path.display(), "Converted");
            outcome.pdf = Some(pdf_path);
        }
        Err(e) => {
            warn!(message = %basename, error = %e, "PDF rendering failed");
        }
    }

    outcome
}
