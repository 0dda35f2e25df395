// SPDX-License-Identifier: PMPL-1.0-or-later
//! wcagbot CLI - accessibility audit of an HTML document

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use wcagbot::config::{self, Config};
use wcagbot::report::{generate_report, OutputFormat};
use wcagbot::suppression::{JsonFileStore, SuppressionPersistence};
use wcagbot::{Auditor, Document, IssueKind};

/// Default directory for persisted suppression lists
const DEFAULT_STORE_DIR: &str = ".wcagbot/suppressions";

/// Accessibility audits for rendered HTML
#[derive(Parser)]
#[command(name = "wcagbot")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Audit an HTML file
    Check {
        /// HTML file to audit
        file: PathBuf,

        /// Output format
        #[arg(long, default_value = "text")]
        format: FormatArg,

        /// Only check contrast on interactive elements
        #[arg(long)]
        interactive_only: bool,

        /// Rules to skip
        #[arg(long, value_enum)]
        skip: Vec<RuleArg>,

        /// Config file (TOML or YAML)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Apply suppressions persisted for this host
        #[arg(long)]
        host: Option<String>,

        /// Output file (stdout if not specified)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Enable verbose logging
        #[arg(long, short)]
        verbose: bool,
    },

    /// Manage persisted suppressions for a host
    Suppress {
        /// Host the suppressions apply to
        host: String,

        /// Selector paths to add (or remove with --remove)
        paths: Vec<String>,

        /// Remove the given paths instead of adding them
        #[arg(long)]
        remove: bool,

        /// Config file (TOML or YAML)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Enable verbose logging
        #[arg(long, short)]
        verbose: bool,
    },
}

/// Rule CLI argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum RuleArg {
    Alt,
    Labels,
    Contrast,
}

impl From<RuleArg> for IssueKind {
    fn from(arg: RuleArg) -> Self {
        match arg {
            RuleArg::Alt => IssueKind::MissingAltText,
            RuleArg::Labels => IssueKind::MissingLabel,
            RuleArg::Contrast => IssueKind::LowContrast,
        }
    }
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

fn init_logging(verbose: bool, level: &str) {
    let filter = if verbose {
        EnvFilter::new("wcagbot=debug")
    } else {
        EnvFilter::new(format!("wcagbot={}", level))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn load(path: Option<&Path>) -> anyhow::Result<Config> {
    let path = path
        .map(Path::to_path_buf)
        .unwrap_or_else(config::default_config_path);
    config::load_config(&path).with_context(|| format!("loading {}", path.display()))
}

fn store_for(config: &Config) -> JsonFileStore {
    let dir = config
        .suppression
        .store_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_STORE_DIR));
    JsonFileStore::new(dir)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check {
            file,
            format,
            interactive_only,
            skip,
            config,
            host,
            output,
            verbose,
        } => {
            let mut config = load(config.as_deref())?;
            init_logging(verbose, &config.log.level);

            config.audit.interactive_only |= interactive_only;
            for rule in skip {
                match IssueKind::from(rule) {
                    IssueKind::MissingAltText => config.audit.check_alt_text = false,
                    IssueKind::MissingLabel => config.audit.check_labels = false,
                    IssueKind::LowContrast => config.audit.check_contrast = false,
                }
            }

            let html = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("reading {}", file.display()))?;
            let document = Document::from_html(&html);
            let mut auditor = Auditor::from_config(document, &config);

            match host.as_deref() {
                Some(host) => {
                    let store = store_for(&config);
                    auditor.run_scan_with(&store, host).await;
                }
                None => {
                    auditor.run_scan();
                }
            }

            let report = auditor
                .last_report()
                .context("scan produced no report")?;
            let rendered = generate_report(report, auditor.suppression(), format.into());
            write_output(&rendered, output.as_deref())?;

            let active = auditor.active_issues().len();
            info!(active, "Audit finished");
            if active > 0 {
                std::process::exit(1);
            }
        }

        Commands::Suppress {
            host,
            paths,
            remove,
            config,
            verbose,
        } => {
            let config = load(config.as_deref())?;
            init_logging(verbose, &config.log.level);

            let store = store_for(&config);
            let mut current = store.load(&host).await?;
            if remove {
                current.retain(|p| !paths.contains(p));
            } else {
                for path in paths {
                    if !current.contains(&path) {
                        current.push(path);
                    }
                }
            }
            if !current.is_empty() || remove {
                store.save(&host, &current).await?;
                debug!(host, count = current.len(), "Updated suppressions");
            }

            for path in &current {
                println!("{}", path);
            }
        }
    }

    Ok(())
}

/// Write output to file or stdout
fn write_output(content: &str, path: Option<&Path>) -> anyhow::Result<()> {
    match path {
        Some(p) => {
            std::fs::write(p, content)
                .with_context(|| format!("writing {}", p.display()))?;
            eprintln!("Report written to {}", p.display());
        }
        None => println!("{}", content),
    }
    Ok(())
}
