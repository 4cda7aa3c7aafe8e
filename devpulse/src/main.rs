//! devpulse - productivity and AI-adoption metrics CLI
//!
//! Loads raw commit and Copilot usage rows into a local store and prints
//! time-bucketed metrics computed from them.
//!
//! Uses XDG Base Directory specification for file locations:
//! - Database: $XDG_DATA_HOME/devpulse/data.db (~/.local/share/devpulse/data.db)
//! - Config: $XDG_CONFIG_HOME/devpulse/config.toml (~/.config/devpulse/config.toml)
//! - Logs: $XDG_STATE_HOME/devpulse/ (~/.local/state/devpulse/)

mod output;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand, ValueEnum};
use devpulse_core::metrics::{generate_report, queries};
use devpulse_core::{
    CodeLinesNormalization, Config, Database, DateRange, MetricsFilter, Period,
    ProductivityMetric, RawCommitRecord, RawCopilotChatRecord, RawCopilotUsageRecord,
};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "devpulse")]
#[command(about = "Productivity and AI-adoption metrics from commit and Copilot usage data")]
#[command(version)]
struct Args {
    /// Database path (default: $XDG_DATA_HOME/devpulse/data.db)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Load raw rows from JSON files into the store
    Import {
        /// Owner the rows belong to
        #[arg(long)]
        owner: String,

        /// JSON array of commit rows
        #[arg(long)]
        commits: Option<PathBuf>,

        /// JSON array of Copilot code-completion rows
        #[arg(long)]
        usage: Option<PathBuf>,

        /// JSON array of Copilot chat rows
        #[arg(long)]
        chat: Option<PathBuf>,
    },

    /// Code lines or commit counts per period
    Productivity {
        #[command(flatten)]
        filter: FilterArgs,

        /// Bucket size: day, week, month, quarter, year (default: from config)
        #[arg(short, long)]
        period: Option<Period>,

        /// Metric: code-lines or commits
        #[arg(short, long, default_value = "code-lines")]
        metric: ProductivityMetric,

        /// Denominator of the code-lines Copilot percentage (default: from config)
        #[arg(long, value_enum)]
        normalization: Option<NormalizationArg>,
    },

    /// Copilot acceptance per language
    Languages {
        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Copilot acceptance per period
    Usage {
        #[command(flatten)]
        filter: FilterArgs,

        /// Bucket size (default: from config)
        #[arg(short, long)]
        period: Option<Period>,
    },

    /// Daily code-completion and chat users
    Users {
        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Periodic report: weekly and monthly productivity plus recent usage
    Report {
        /// Owner to report on
        #[arg(long)]
        owner: String,

        /// Last day covered by the report (default: today)
        #[arg(long)]
        as_of: Option<NaiveDate>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Totals grouped by arbitrary dimensions
    Breakdown {
        #[command(flatten)]
        filter: FilterArgs,

        /// Comma-separated dimensions (commits: author, language, repository;
        /// usage: ide, language, model)
        #[arg(long, value_delimiter = ',', required = true)]
        by: Vec<String>,

        /// Which rows to group
        #[arg(long, value_enum, default_value_t = Source::Commits)]
        source: Source,
    },
}

/// Owner, window and output flags shared by the query commands
#[derive(clap::Args)]
struct FilterArgs {
    /// Owner to query
    #[arg(long)]
    owner: String,

    /// First day of the window (YYYY-MM-DD, inclusive)
    #[arg(long)]
    from: Option<NaiveDate>,

    /// Last day of the window (YYYY-MM-DD, inclusive)
    #[arg(long)]
    to: Option<NaiveDate>,

    /// Only include these languages (repeatable)
    #[arg(short, long = "language")]
    languages: Vec<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

impl FilterArgs {
    fn metrics_filter(&self) -> Result<MetricsFilter> {
        if let (Some(from), Some(to)) = (self.from, self.to) {
            if from > to {
                anyhow::bail!("--from {} is after --to {}", from, to);
            }
        }

        let mut filter = MetricsFilter::new().with_languages(self.languages.iter().cloned());
        if self.from.is_some() || self.to.is_some() {
            filter = filter.with_range(DateRange::bounded(self.from, self.to));
        }
        Ok(filter)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum NormalizationArg {
    GrandTotal,
    PerBucket,
}

impl From<NormalizationArg> for CodeLinesNormalization {
    fn from(arg: NormalizationArg) -> Self {
        match arg {
            NormalizationArg::GrandTotal => CodeLinesNormalization::GrandTotal,
            NormalizationArg::PerBucket => CodeLinesNormalization::PerBucket,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Source {
    Commits,
    Usage,
}

fn main() -> Result<()> {
    let args = Args::parse();

    Config::ensure_xdg_env();

    // Load configuration
    let config = Config::load().context("failed to load configuration")?;

    // Initialize logging
    let _log_guard =
        devpulse_core::logging::init(&config.logging).context("failed to initialize logging")?;

    // Open database
    let db_path = args.db.clone().unwrap_or_else(Config::database_path);
    let db = Database::open(&db_path)
        .with_context(|| format!("failed to open database at {}", db_path.display()))?;
    db.migrate().context("failed to run database migrations")?;
    tracing::debug!(path = %db_path.display(), "database ready");

    match args.command {
        Command::Import {
            owner,
            commits,
            usage,
            chat,
        } => cmd_import(&db, &owner, commits.as_deref(), usage.as_deref(), chat.as_deref()),
        Command::Productivity {
            filter,
            period,
            metric,
            normalization,
        } => {
            let period = period.unwrap_or(config.metrics.default_period);
            let normalization = normalization
                .map(CodeLinesNormalization::from)
                .unwrap_or(config.metrics.code_lines_normalization);
            cmd_productivity(&db, &filter, period, metric, normalization)
        }
        Command::Languages { filter } => cmd_languages(&db, &filter),
        Command::Usage { filter, period } => {
            cmd_usage(&db, &filter, period.unwrap_or(config.metrics.default_period))
        }
        Command::Users { filter } => cmd_users(&db, &filter),
        Command::Report {
            owner,
            as_of,
            format,
        } => cmd_report(&db, &config, &owner, as_of, format),
        Command::Breakdown {
            filter,
            by,
            source,
        } => cmd_breakdown(&db, &filter, &by, source),
    }
}

// ============================================
// Import
// ============================================

fn read_rows<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))
}

/// Fill in missing owners and refuse rows that belong to someone else.
fn assign_owner<'a>(owner: &str, owners: impl Iterator<Item = &'a mut String>) -> Result<()> {
    for row_owner in owners {
        if row_owner.is_empty() {
            *row_owner = owner.to_string();
        } else if row_owner.as_str() != owner {
            anyhow::bail!(
                "row belongs to owner '{}' but --owner is '{}'",
                row_owner,
                owner
            );
        }
    }
    Ok(())
}

fn cmd_import(
    db: &Database,
    owner: &str,
    commits: Option<&Path>,
    usage: Option<&Path>,
    chat: Option<&Path>,
) -> Result<()> {
    if commits.is_none() && usage.is_none() && chat.is_none() {
        anyhow::bail!("nothing to import: pass --commits, --usage or --chat");
    }

    if let Some(path) = commits {
        let mut rows: Vec<RawCommitRecord> = read_rows(path)?;
        assign_owner(owner, rows.iter_mut().map(|r| &mut r.owner_id))?;
        let inserted = db.insert_commits(&rows).context("failed to store commit rows")?;
        tracing::info!(
            owner,
            path = %path.display(),
            rows = rows.len(),
            inserted,
            "imported commit rows"
        );
        println!(
            "Commit rows:  {} inserted, {} skipped as duplicates",
            inserted,
            rows.len() - inserted
        );
    }

    if let Some(path) = usage {
        let mut rows: Vec<RawCopilotUsageRecord> = read_rows(path)?;
        assign_owner(owner, rows.iter_mut().map(|r| &mut r.owner_id))?;
        db.insert_copilot_usage(&rows)
            .context("failed to store copilot usage rows")?;
        tracing::info!(owner, path = %path.display(), rows = rows.len(), "imported usage rows");
        println!("Usage rows:   {} stored", rows.len());
    }

    if let Some(path) = chat {
        let mut rows: Vec<RawCopilotChatRecord> = read_rows(path)?;
        assign_owner(owner, rows.iter_mut().map(|r| &mut r.owner_id))?;
        db.insert_copilot_chat(&rows)
            .context("failed to store copilot chat rows")?;
        tracing::info!(owner, path = %path.display(), rows = rows.len(), "imported chat rows");
        println!("Chat rows:    {} stored", rows.len());
    }

    println!("Import complete for {}", owner);
    Ok(())
}

// ============================================
// Queries
// ============================================

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn cmd_productivity(
    db: &Database,
    args: &FilterArgs,
    period: Period,
    metric: ProductivityMetric,
    normalization: CodeLinesNormalization,
) -> Result<()> {
    let metrics = queries::calculated_metrics(
        db,
        &args.owner,
        period,
        metric,
        normalization,
        &args.metrics_filter()?,
    )?;

    match args.format {
        OutputFormat::Json => print_json(&metrics),
        OutputFormat::Text => {
            output::print_productivity(&metrics);
            Ok(())
        }
    }
}

fn cmd_languages(db: &Database, args: &FilterArgs) -> Result<()> {
    let breakdown = queries::language_breakdown(db, &args.owner, &args.metrics_filter()?)?;

    match args.format {
        OutputFormat::Json => print_json(&breakdown),
        OutputFormat::Text => {
            output::print_languages(&breakdown);
            Ok(())
        }
    }
}

fn cmd_usage(db: &Database, args: &FilterArgs, period: Period) -> Result<()> {
    let breakdown = queries::period_breakdown(db, &args.owner, period, &args.metrics_filter()?)?;

    match args.format {
        OutputFormat::Json => print_json(&breakdown),
        OutputFormat::Text => {
            output::print_usage(period, &breakdown);
            Ok(())
        }
    }
}

fn cmd_users(db: &Database, args: &FilterArgs) -> Result<()> {
    let users = queries::users_metrics(db, &args.owner, &args.metrics_filter()?)?;

    match args.format {
        OutputFormat::Json => print_json(&users),
        OutputFormat::Text => {
            output::print_users(&users);
            Ok(())
        }
    }
}

fn cmd_report(
    db: &Database,
    config: &Config,
    owner: &str,
    as_of: Option<NaiveDate>,
    format: OutputFormat,
) -> Result<()> {
    let as_of = as_of.unwrap_or_else(|| Local::now().date_naive());
    let report = generate_report(
        db,
        owner,
        as_of,
        &config.report,
        config.metrics.code_lines_normalization,
    )
    .context("failed to generate report")?;

    match format {
        OutputFormat::Json => print_json(&report),
        OutputFormat::Text => {
            output::print_report(&report);
            Ok(())
        }
    }
}

fn cmd_breakdown(db: &Database, args: &FilterArgs, by: &[String], source: Source) -> Result<()> {
    let dimensions: Vec<&str> = by.iter().map(|d| d.trim()).collect();
    let filter = args.metrics_filter()?;

    match source {
        Source::Commits => {
            let totals = queries::productivity_grouped_by(db, &args.owner, &dimensions, &filter)?;
            match args.format {
                OutputFormat::Json => print_json(&totals),
                OutputFormat::Text => {
                    output::print_grouped_totals(&dimensions, &totals);
                    Ok(())
                }
            }
        }
        Source::Usage => {
            let ratios = queries::ai_lines_grouped_by(db, &args.owner, &dimensions, &filter)?;
            match args.format {
                OutputFormat::Json => print_json(&ratios),
                OutputFormat::Text => {
                    output::print_grouped_ratios(&dimensions, &ratios);
                    Ok(())
                }
            }
        }
    }
}
