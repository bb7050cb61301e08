// SPDX-License-Identifier: PMPL-1.0-or-later
//! Remediabot CLI - accessibility audit and remediation for PDF-derived HTML

use clap::{Parser, Subcommand, ValueEnum};
use remediabot::batch;
use remediabot::config::{default_config_path, load_config, write_default_config, Config};
use remediabot::report::OutputFormat;
use remediabot::Engine;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Accessibility audit and remediation for PDF-derived HTML
#[derive(Parser)]
#[command(name = "remediabot")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Audit an HTML file or every HTML file in a directory
    Audit {
        /// File or directory to audit
        path: PathBuf,

        /// Output format
        #[arg(long, default_value = "text")]
        format: FormatArg,

        /// Report file (stdout if not specified)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Configuration file
        #[arg(long, short)]
        config: Option<PathBuf>,

        /// Enable verbose logging
        #[arg(long, short)]
        verbose: bool,
    },

    /// Apply in-engine fixes to a file or directory and report what remains
    Remediate {
        /// HTML file or directory to remediate
        path: PathBuf,

        /// Where to write the remediated HTML (a directory when remediating
        /// a directory)
        #[arg(long, short)]
        output: PathBuf,

        /// Output format
        #[arg(long, default_value = "text")]
        format: FormatArg,

        /// Report file (stdout if not specified)
        #[arg(long)]
        report: Option<PathBuf>,

        /// Configuration file
        #[arg(long, short)]
        config: Option<PathBuf>,

        /// Enable verbose logging
        #[arg(long, short)]
        verbose: bool,
    },

    /// Write a configuration file with the defaults
    Init {
        /// Path of the configuration file
        #[arg(default_value = ".remediabot.yml")]
        path: PathBuf,
    },
}

/// Output format CLI argument
#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    /// Human-readable text
    Text,
    /// Structured JSON
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Text => OutputFormat::Text,
            FormatArg::Json => OutputFormat::Json,
        }
    }
}

fn init_logging(verbose: bool, config: &Config) {
    let filter = if verbose {
        EnvFilter::new("remediabot=debug")
    } else {
        EnvFilter::new(format!("remediabot={}", config.log.level))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load(path: Option<PathBuf>) -> anyhow::Result<Config> {
    let path = path.unwrap_or_else(default_config_path);
    Ok(load_config(&path)?)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Audit { path, format, output, config, verbose } => {
            let config = load(config)?;
            init_logging(verbose, &config);
            let engine = Engine::new(config);

            let report = if path.is_dir() {
                batch::audit_directory(&engine, &path).into_report(&path)
            } else {
                let file = batch::audit_file(&engine, &path)?;
                let mut report = remediabot::report::AuditReport::new(file.issues)
                    .with_html_path(&path.display().to_string());
                report.summary = file.summary;
                report
            };

            write_output(&report.render(format.into()), output.as_deref())?;

            if report.has_critical() {
                std::process::exit(1);
            }
        }

        Commands::Remediate { path, output, format, report, config, verbose } => {
            let config = load(config)?;
            init_logging(verbose, &config);
            let engine = Engine::new(config);

            let remediation = if path.is_dir() {
                batch::remediate_directory(&engine, &path, &output).into_report(&path, &output)
            } else {
                let html = std::fs::read_to_string(&path)?;
                let result = engine.remediate(&html)?;
                std::fs::write(&output, &result.html)?;
                info!("Remediated HTML written to {}", output.display());

                result
                    .report
                    .with_html_path(&path.display().to_string())
                    .with_remediated_html_path(&output.display().to_string())
            };
            write_output(&remediation.render(format.into()), report.as_deref())?;
        }

        Commands::Init { path } => {
            write_default_config(&path)?;
            eprintln!("Default configuration written to {}", path.display());
        }
    }

    Ok(())
}

/// Write output to file or stdout
fn write_output(content: &str, path: Option<&Path>) -> anyhow::Result<()> {
    match path {
        Some(p) => {
            std::fs::write(p, content)?;
            eprintln!("Report written to {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
