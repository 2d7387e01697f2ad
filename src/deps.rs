//! External tool checking and installation.
//!
//! The pipeline leans on two executables: the HTML-to-PDF engine
//! (required) and the fallback MIME extractor (optional). Missing tools
//! are installed through the host package manager when one is detected.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{info, warn};

use crate::config::Config;
use crate::error::{ConvertError, Result};

/// One external tool the pipeline may invoke.
#[derive(Debug, Clone)]
pub struct ToolSpec {
    /// Executable name or path, taken from the configuration.
    pub program: String,
    /// Package that provides it (tool and package names differ for munpack).
    pub package: &'static str,
    /// Required tools abort the run when missing; optional ones only warn.
    pub required: bool,
    /// Short human description for the `check` report.
    pub purpose: &'static str,
}

/// The tools a conversion run depends on.
pub fn tool_specs(config: &Config) -> Vec<ToolSpec> {
    vec![
        ToolSpec {
            program: config.tools.pdf_engine.clone(),
            package: "wkhtmltopdf",
            required: true,
            purpose: "HTML-to-PDF engine",
        },
        ToolSpec {
            program: config.tools.mime_extractor.clone(),
            package: "mpack",
            required: false,
            purpose: "fallback MIME extractor",
        },
    ]
}

/// `true` when `program` resolves to an executable.
pub fn is_available(program: &str) -> bool {
    resolve(program).is_some()
}

/// Resolve a bare name through `PATH`; explicit paths are checked directly.
pub fn resolve(program: &str) -> Option<PathBuf> {
    let p = Path::new(program);
    if p.components().count() > 1 {
        return p.is_file().then(|| p.to_path_buf());
    }

    let path_var = std::env::var_os("PATH")?;
    std::env::split_paths(&path_var)
        .map(|dir| dir.join(program))
        .find(|candidate| candidate.is_file())
}

/// A host package manager capable of installing missing tools.
#[derive(Debug, Clone, Copy)]
pub struct PackageManager {
    pub program: &'static str,
    install_args: &'static [&'static str],
}

const PACKAGE_MANAGERS: &[PackageManager] = &[
    PackageManager {
        program: "apt-get",
        install_args: &["install", "-y"],
    },
    PackageManager {
        program: "dnf",
        install_args: &["install", "-y"],
    },
    PackageManager {
        program: "pacman",
        install_args: &["-S", "--noconfirm"],
    },
    PackageManager {
        program: "brew",
        install_args: &["install"],
    },
];

/// Find the first supported package manager present on this host.
pub fn detect_package_manager() -> Option<PackageManager> {
    PACKAGE_MANAGERS
        .iter()
        .copied()
        .find(|pm| is_available(pm.program))
}

impl PackageManager {
    /// Install one package, inheriting stdout/stderr so the user sees
    /// the package manager's own output.
    pub fn install(&self, package: &str) -> Result<()> {
        info!(manager = self.program, package, "Installing missing tool");
        let status = Command::new(self.program)
            .args(self.install_args)
            .arg(package)
            .status()
            .map_err(|e| ConvertError::ToolSpawn {
                tool: self.program.to_string(),
                source: e,
            })?;

        if !status.success() {
            return Err(ConvertError::ToolFailed {
                tool: self.program.to_string(),
                status: status.to_string(),
                detail: format!("could not install '{package}'"),
            });
        }
        Ok(())
    }
}

/// Check every tool the pipeline uses, installing missing ones when allowed.
///
/// A required tool still missing after the install attempt aborts the run;
/// an optional one is logged and its fallback path stays disabled.
pub fn ensure_tools(config: &Config, allow_install: bool) -> Result<()> {
    let pm = detect_package_manager();

    for spec in tool_specs(config) {
        if is_available(&spec.program) {
            continue;
        }

        if allow_install {
            match pm {
                Some(pm) => {
                    if let Err(e) = pm.install(spec.package) {
                        warn!(tool = %spec.program, error = %e, "Install attempt failed");
                    }
                }
                None => {
                    warn!(
                        tool = %spec.program,
                        "No supported package manager found, cannot install"
                    );
                }
            }
        }

        if is_available(&spec.program) {
            continue;
        }

        if spec.required {
            return Err(ConvertError::ToolMissing {
                tool: spec.program.clone(),
                hint: format!("Install the '{}' package and retry.", spec.package),
            });
        }
        warn!(
            tool = %spec.program,
            purpose = spec.purpose,
            "Optional tool not found; its fallback path is disabled"
        );
    }

    Ok(())
}
