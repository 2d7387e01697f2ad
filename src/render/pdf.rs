//! HTML-to-PDF rendering through an external engine.

use std::path::Path;
use std::process::Command;

use crate::config::Config;
use crate::error::{ConvertError, Result};

/// The seam between the pipeline and the PDF engine.
///
/// Production uses [`Wkhtmltopdf`]; tests substitute a stub so the batch
/// driver can be exercised without the binary installed.
pub trait PdfRenderer {
    /// Render `html` into `pdf`. The parent directory of `pdf` exists.
    fn render(&self, html: &Path, pdf: &Path) -> Result<()>;
}

/// Renders via the `wkhtmltopdf` command-line tool.
pub struct Wkhtmltopdf {
    program: String,
    page_size: String,
    margin: String,
}

impl Wkhtmltopdf {
    pub fn from_config(config: &Config) -> Self {
        Self {
            program: config.tools.pdf_engine.clone(),
            page_size: config.page.size.clone(),
            margin: config.page.margin.clone(),
        }
    }
}

impl PdfRenderer for Wkhtmltopdf {
    fn render(&self, html: &Path, pdf: &Path) -> Result<()> {
        let output = Command::new(&self.program)
            .arg("--quiet")
            .args(["--page-size", &self.page_size])
            .args(["--margin-top", &self.margin])
            .args(["--margin-bottom", &self.margin])
            .args(["--margin-left", &self.margin])
            .args(["--margin-right", &self.margin])
            .arg(html)
            .arg(pdf)
            .output()
            .map_err(|e| ConvertError::ToolSpawn {
                tool: self.program.clone(),
                source: e,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ConvertError::ToolFailed {
                tool: self.program.clone(),
                status: output.status.to_string(),
                detail: stderr.trim().to_string(),
            });
        }

        if !pdf.exists() {
            return Err(ConvertError::NoPdfOutput(pdf.to_path_buf()));
        }

        Ok(())
    }
}
