//! Application configuration.
//!
//! Configuration is loaded from a TOML file at:
//! 1. `$EML2PDF_CONFIG` (environment variable)
//! 2. `~/.config/eml2pdf/config.toml` (Linux/macOS)
//!    `%APPDATA%\eml2pdf\config.toml` (Windows)
//! 3. Built-in defaults

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General behavior settings.
    pub general: GeneralConfig,
    /// External tool overrides.
    pub tools: ToolsConfig,
    /// PDF page options.
    pub page: PageConfig,
}

/// General behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// `strftime` format string for the Date line in rendered documents.
    pub date_format: String,
    /// Override cache directory for logs.
    pub cache_dir: Option<PathBuf>,
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub log_level: String,
}

/// External tool overrides.
///
/// Each field names an executable; bare names are resolved via `PATH`,
/// absolute paths are used as-is.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// HTML-to-PDF engine.
    pub pdf_engine: String,
    /// Fallback MIME attachment extractor.
    pub mime_extractor: String,
}

/// PDF page options passed to the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PageConfig {
    /// Page size (e.g. "A4", "Letter").
    pub size: String,
    /// Uniform margin (e.g. "15mm").
    pub margin: String,
}

// ── Default implementations ─────────────────────────────────────

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            date_format: "%a, %d %b %Y %H:%M:%S %z".to_string(),
            cache_dir: None,
            log_level: "warn".to_string(),
        }
    }
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            pdf_engine: "wkhtmltopdf".to_string(),
            mime_extractor: "munpack".to_string(),
        }
    }
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            size: "A4".to_string(),
            margin: "15mm".to_string(),
        }
    }
}

// ── Load / save ─────────────────────────────────────────────────

/// Load configuration, searching standard locations.
///
/// Returns the default configuration if no file is found or on parse error.
pub fn load_config() -> Config {
    if let Some(path) = config_file_path() {
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(contents) => match toml::from_str::<Config>(&contents) {
                    Ok(cfg) => {
                        tracing::info!(path = %path.display(), "Loaded config");
                        return cfg;
                    }
                    Err(e) => {
                        tracing::warn!(
                            path = %path.display(),
                            error = %e,
                            "Failed to parse config, using defaults"
                        );
                    }
                },
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "Failed to read config file, using defaults"
                    );
                }
            }
        }
    }
    Config::default()
}

/// Determine the config file path (checking env var first, then standard dirs).
pub fn config_file_path() -> Option<PathBuf> {
    // 1. Environment variable override
    if let Ok(env_path) = std::env::var("EML2PDF_CONFIG") {
        return Some(PathBuf::from(env_path));
    }

    // 2. Standard config directory
    dirs::config_dir().map(|d| d.join("eml2pdf").join("config.toml"))
}

/// Return the cache directory for logs.
pub fn cache_dir(config: &Config) -> PathBuf {
    if let Some(ref dir) = config.general.cache_dir {
        return dir.clone();
    }
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("eml2pdf")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = Config::default();
        assert_eq!(cfg.general.log_level, "warn");
        assert_eq!(cfg.tools.pdf_engine, "wkhtmltopdf");
        assert_eq!(cfg.tools.mime_extractor, "munpack");
        assert_eq!(cfg.page.size, "A4");
    }

    #[test]
    fn test_serialize_deserialize_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).expect("serialize");
        let parsed: Config = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.tools.pdf_engine, cfg.tools.pdf_engine);
        assert_eq!(parsed.page.margin, cfg.page.margin);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let partial = r#"
[tools]
pdf_engine = "/opt/wkhtmltox/bin/wkhtmltopdf"

[page]
size = "Letter"
"#;
        let cfg: Config = toml::from_str(partial).expect("parse partial");
        assert_eq!(cfg.tools.pdf_engine, "/opt/wkhtmltox/bin/wkhtmltopdf");
        assert_eq!(cfg.page.size, "Letter");
        // Other fields use defaults
        assert_eq!(cfg.tools.mime_extractor, "munpack");
        assert_eq!(cfg.general.log_level, "warn");
    }
}
