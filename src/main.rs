//! CLI entry point for `eml2pdf`.

use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{CommandFactory, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

use eml2pdf::config::Config;
use eml2pdf::pipeline::{run_batch, BatchOptions, BatchSummary};
use eml2pdf::render::pdf::Wkhtmltopdf;
use eml2pdf::{config, deps};

#[derive(Parser)]
#[command(
    name = "eml2pdf",
    version,
    about = "Convert a folder of .eml files to PDF documents, extracting attachments"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Directory containing .eml files
    #[arg(value_name = "INPUT")]
    input: Option<PathBuf>,

    /// Destination directory (pdfs/ and attachments/ are created inside)
    #[arg(value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// Only check for external tools, never invoke the package manager
    #[arg(long, global = true)]
    no_install: bool,

    /// Keep the intermediate HTML page next to each PDF
    #[arg(long, global = true)]
    keep_html: bool,

    /// Print the final summary as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Verbose logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a directory of messages
    Convert {
        input: PathBuf,
        output: PathBuf,
    },
    /// Report which external tools are available
    Check,
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
    /// Generate a man page
    Manpage,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = config::load_config();

    // Configure logging: stderr + optional log file
    let log_level = match cli.verbose {
        0 => config.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    setup_logging(log_level, &config);

    match cli.command {
        Some(Commands::Convert { input, output }) => cmd_convert(
            &config,
            &input,
            &output,
            cli.no_install,
            cli.keep_html,
            cli.json,
        ),
        Some(Commands::Check) => cmd_check(&config),
        Some(Commands::Completions { shell }) => cmd_completions(shell),
        Some(Commands::Manpage) => cmd_manpage(),
        None => {
            let input = match cli.input {
                Some(p) => p,
                None => prompt_for_dir("Directory with .eml files")?,
            };
            let output = match cli.output {
                Some(p) => p,
                None => prompt_for_dir("Destination directory")?,
            };
            cmd_convert(
                &config,
                &input,
                &output,
                cli.no_install,
                cli.keep_html,
                cli.json,
            )
        }
    }
}

/// Set up tracing with stderr output and optional file logging.
fn setup_logging(level: &str, config: &Config) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    // Try to set up file logging
    let log_dir = config::cache_dir(config);
    if std::fs::create_dir_all(&log_dir).is_ok() {
        let file_appender = tracing_appender::rolling::never(&log_dir, "eml2pdf.log");
        let file_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(file_appender);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .with(file_layer)
            .init();
    } else {
        // Fall back to stderr only
        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .init();
    }
}

/// Ask for a directory on stdin.
fn prompt_for_dir(label: &str) -> anyhow::Result<PathBuf> {
    print!("{label}: ");
    std::io::stdout().flush()?;

    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    let trimmed = line.trim();
    if trimmed.is_empty() {
        anyhow::bail!("No directory given");
    }
    Ok(PathBuf::from(trimmed))
}

/// Convert every message in `input`, writing under `output`.
fn cmd_convert(
    config: &Config,
    input: &Path,
    output: &Path,
    no_install: bool,
    keep_html: bool,
    json: bool,
) -> anyhow::Result<()> {
    if !input.is_dir() {
        anyhow::bail!("Input directory not found: {}", input.display());
    }

    deps::ensure_tools(config, !no_install)?;

    let opts = BatchOptions {
        input: input.to_path_buf(),
        output: output.to_path_buf(),
        keep_html,
    };

    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} Converting [{bar:40.cyan/blue}] {pos}/{len}")
            .expect("valid template")
            .progress_chars("#>-"),
    );

    let start = Instant::now();
    let renderer = Wkhtmltopdf::from_config(config);
    let summary = run_batch(config, &opts, &renderer, &|current, total| {
        pb.set_length(total as u64);
        pb.set_position(current as u64);
    })?;
    pb.finish_and_clear();

    let elapsed = start.elapsed();

    if summary.scanned == 0 {
        println!("  No .eml files found in {}", input.display());
        return Ok(());
    }

    if json {
        print_summary_json(&summary, elapsed)?;
    } else {
        print_summary_table(&summary, elapsed);
    }

    Ok(())
}

/// Report availability of the external tools.
fn cmd_check(config: &Config) -> anyhow::Result<()> {
    println!();
    for spec in deps::tool_specs(config) {
        let status = match deps::resolve(&spec.program) {
            Some(path) => format!("ok ({})", path.display()),
            None if spec.required => "MISSING (required)".to_string(),
            None => "missing (optional)".to_string(),
        };
        println!("  {:<14} {:<26} {}", spec.program, spec.purpose, status);
    }
    match deps::detect_package_manager() {
        Some(pm) => println!("\n  Package manager: {}", pm.program),
        None => println!("\n  Package manager: none detected"),
    }
    println!();
    Ok(())
}

/// Generate shell completions and print to stdout.
fn cmd_completions(shell: clap_complete::Shell) -> anyhow::Result<()> {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "eml2pdf", &mut std::io::stdout());
    Ok(())
}

/// Generate a man page and print to stdout.
fn cmd_manpage() -> anyhow::Result<()> {
    let cmd = Cli::command();
    let man = clap_mangen::Man::new(cmd);
    let mut buf = Vec::new();
    man.render(&mut buf)?;
    std::io::Write::write_all(&mut std::io::stdout(), &buf)?;
    Ok(())
}

/// Print the batch summary in a human-readable table.
fn print_summary_table(summary: &BatchSummary, elapsed: std::time::Duration) {
    use humansize::{format_size, BINARY};

    println!();
    println!("  Conversion complete:");
    println!("  {:<25} {}", "Messages found", summary.scanned);
    println!("  {:<25} {}", "PDFs created", summary.converted);
    if summary.render_failures > 0 {
        println!("  {:<25} {}", "Render failures", summary.render_failures);
    }
    println!(
        "  {:<25} {}",
        "Attachments extracted", summary.attachments_extracted
    );
    if summary.attachment_failures > 0 {
        println!(
            "  {:<25} {}",
            "Attachment failures", summary.attachment_failures
        );
    }
    println!(
        "  {:<25} {}",
        "PDF output size",
        format_size(summary.pdf_bytes, BINARY)
    );
    println!("  {:<25} {:.2?}", "Elapsed", elapsed);
    println!("  {:<25} {}", "PDFs", summary.pdf_dir.display());
    println!(
        "  {:<25} {}",
        "Attachments",
        summary.attachments_dir.display()
    );
    println!();
}

/// Print the batch summary as JSON.
fn print_summary_json(summary: &BatchSummary, elapsed: std::time::Duration) -> anyhow::Result<()> {
    let output = serde_json::json!({
        "messages_found": summary.scanned,
        "pdfs_created": summary.converted,
        "render_failures": summary.render_failures,
        "attachments_extracted": summary.attachments_extracted,
        "attachment_failures": summary.attachment_failures,
        "pdf_bytes": summary.pdf_bytes,
        "elapsed_ms": elapsed.as_millis(),
        "pdf_dir": summary.pdf_dir.to_string_lossy(),
        "attachments_dir": summary.attachments_dir.to_string_lossy(),
    });

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
