// SPDX-License-Identifier: PMPL-1.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! seobot CLI - SEO audit and remediation

use clap::{Parser, Subcommand};
use seobot::batch::{self, BatchOptions};
use seobot::config::{self, Config};
use seobot::report::{self, OutputFormat};
use seobot::{
    parse_fix_keys, rules_for_tier, BackupSink, FixKey, Fixer, FsBackupStore, FsStore, Scanner,
    Tier,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

/// Exit code when strict mode finds a document that is not fully compliant
const EXIT_NOT_COMPLIANT: u8 = 2;

/// seobot: SEO audit and remediation
///
/// Audits HTML and template files against tiered SEO rules (A, AA, AAA)
/// and applies safe automatic fixes.
#[derive(Parser)]
#[command(name = "seobot")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// File or directory to scan (defaults to current directory)
    #[arg(short, long, default_value = ".")]
    path: PathBuf,

    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Output format (pretty, json)
    #[arg(long, default_value = "pretty")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Audit documents for SEO compliance
    Audit {
        /// Compliance level to check (A, AA, AAA)
        #[arg(long)]
        level: Option<Tier>,

        /// Exit with status 2 when any document is not fully compliant
        #[arg(long)]
        strict: bool,
    },

    /// Apply automatic fixes
    Fix {
        /// Comma-separated issues to fix (defaults to every fixable issue)
        #[arg(long, value_delimiter = ',')]
        issues: Vec<String>,

        /// Back up each file before modifying it
        #[arg(long)]
        backup: bool,

        /// Show what would change without writing anything
        #[arg(long)]
        dry_run: bool,
    },

    /// List the rules checked at a level
    Rules {
        /// Compliance level (A, AA, AAA)
        #[arg(long)]
        level: Option<Tier>,
    },

    /// Initialize configuration file
    Init {
        /// Output format (yaml, toml)
        #[arg(long, default_value = "yaml")]
        format: String,
    },

    /// Show current configuration
    Show,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(&cli.log_level);

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(config::default_config_path);

    let config = match config::load_config(&config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Some(Command::Init { format }) => handle_init(&config_path, &format),
        Some(Command::Show) => handle_show(&config),
        Some(Command::Rules { level }) => {
            handle_rules(level.unwrap_or(config.compliance.default_level), cli.format)
        }
        Some(Command::Audit { level, strict }) => {
            handle_audit(&cli.path, &config, level, strict, cli.format).await
        }
        Some(Command::Fix {
            issues,
            backup,
            dry_run,
        }) => handle_fix(&cli.path, &config, &issues, backup, dry_run, cli.format).await,
        None => handle_audit(&cli.path, &config, None, false, cli.format).await,
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_target(true)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();
}

fn handle_init(config_path: &Path, format: &str) -> ExitCode {
    let path = if format == "toml" {
        config_path.with_extension("toml")
    } else {
        config_path.to_path_buf()
    };

    match config::write_default_config(&path) {
        Ok(()) => {
            println!("Created configuration file: {}", path.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error creating config: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn handle_show(config: &Config) -> ExitCode {
    println!("\nCurrent Configuration:");
    println!("======================\n");

    println!("Scan:");
    println!("  Extensions: {}", config.scan.extensions.join(", "));
    println!("  Exclude: {}", config.scan.exclude.join(", "));
    println!();

    println!("Compliance:");
    println!("  Default level: {}", config.compliance.default_level);
    println!("  Strict: {}", config.compliance.strict);
    println!();

    println!("Fixes:");
    println!("  Create backups: {}", config.fixes.create_backups);
    println!("  Backup path: {}", config.fixes.backup_path.display());
    println!("  Language: {}", config.fixes.language);
    println!("  Alt text: {}", config.fixes.alt_text);
    println!("  Site URL: {}", config.fixes.site_url);
    println!();

    println!("General:");
    println!("  Concurrency: {}", config.concurrency);

    ExitCode::SUCCESS
}

fn handle_rules(level: Tier, format: OutputFormat) -> ExitCode {
    match report::render_rules(&rules_for_tier(level), format) {
        Ok(output) => {
            print!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error rendering rules: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Discover documents under `path` using the scan settings
fn discover(path: &Path, config: &Config) -> seobot::Result<Vec<PathBuf>> {
    Ok(Scanner::new(&config.scan)?.scan(path))
}

async fn handle_audit(
    path: &Path,
    config: &Config,
    level: Option<Tier>,
    strict: bool,
    format: OutputFormat,
) -> ExitCode {
    let level = level.unwrap_or(config.compliance.default_level);
    let strict = strict || config.compliance.strict;

    let paths = match discover(path, config) {
        Ok(paths) => paths,
        Err(e) => {
            eprintln!("Error scanning {}: {}", path.display(), e);
            return ExitCode::FAILURE;
        }
    };

    info!("Auditing {} documents at level {}", paths.len(), level);

    let records =
        match batch::audit_documents(Arc::new(FsStore), paths, level, config.concurrency).await {
            Ok(records) => records,
            Err(e) => {
                eprintln!("Audit failed: {}", e);
                return ExitCode::FAILURE;
            }
        };

    match report::render_audit(&records, format) {
        Ok(output) => println!("{}", output),
        Err(e) => {
            eprintln!("Error rendering report: {}", e);
            return ExitCode::FAILURE;
        }
    }

    let all_compliant = records
        .iter()
        .all(|r| r.report.as_ref().is_some_and(|report| report.verdict.is_compliant()));

    if strict && !all_compliant {
        ExitCode::from(EXIT_NOT_COMPLIANT)
    } else {
        ExitCode::SUCCESS
    }
}

async fn handle_fix(
    path: &Path,
    config: &Config,
    issues: &[String],
    backup: bool,
    dry_run: bool,
    format: OutputFormat,
) -> ExitCode {
    // unknown issues are rejected before any document is touched
    let keys = if issues.is_empty() {
        FixKey::ALL.to_vec()
    } else {
        match parse_fix_keys(issues) {
            Ok(keys) => keys,
            Err(e) => {
                eprintln!("Error: {}", e);
                return ExitCode::FAILURE;
            }
        }
    };

    let paths = match discover(path, config) {
        Ok(paths) => paths,
        Err(e) => {
            eprintln!("Error scanning {}: {}", path.display(), e);
            return ExitCode::FAILURE;
        }
    };

    let backups: Option<Arc<dyn BackupSink>> = if backup || config.fixes.create_backups {
        Some(Arc::new(FsBackupStore::new(config.fixes.backup_dir(path))))
    } else {
        None
    };

    info!(
        documents = paths.len(),
        issues = %keys.iter().map(|k| k.as_str()).collect::<Vec<_>>().join(","),
        dry_run,
        "Applying fixes"
    );

    let records = match batch::fix_documents(
        Arc::new(FsStore),
        backups,
        paths,
        keys,
        Arc::new(Fixer::new(config.fixes.fix_options())),
        BatchOptions {
            concurrency: config.concurrency,
            dry_run,
        },
    )
    .await
    {
        Ok(records) => records,
        Err(e) => {
            eprintln!("Fix failed: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match report::render_fixes(&records, format) {
        Ok(output) => print!("{}", output),
        Err(e) => {
            eprintln!("Error rendering report: {}", e);
            return ExitCode::FAILURE;
        }
    }

    if batch::failed_paths(&records).is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
