use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{info, warn};

mod aggregate;
mod charts;
mod chatbot;
mod config;
mod error;
mod export;
#[cfg(test)]
mod fixtures;
mod loader;
mod models;
mod overview;
mod pivot;
mod report;
mod session;

use aggregate::{filter_rows, Filter};
use config::Config;
use error::DashboardError;
use models::Column;
use session::Session;

#[derive(Parser)]
#[command(name = "suppression-dashboard")]
#[command(about = "Weekly brand-protection suppression dashboard", long_about = None)]
struct Cli {
    /// YAML settings file; missing or malformed files are ignored
    #[arg(long, global = true, default_value = config::DEFAULT_CONFIG_PATH)]
    config: PathBuf,
    /// Log filter used when RUST_LOG is unset
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum ReportFormat {
    Markdown,
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
enum Table {
    Brand,
    Marketplace,
    Weekly,
}

impl Table {
    fn default_file_name(self) -> &'static str {
        match self {
            Table::Brand => "brand_wise_data.csv",
            Table::Marketplace => "marketplace_data.csv",
            Table::Weekly => "weekly_data.csv",
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Render the weekly report
    Report {
        #[arg(long)]
        input: PathBuf,
        #[arg(long, value_enum, default_value_t = ReportFormat::Markdown)]
        format: ReportFormat,
        /// Defaults to stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Export one summary table as CSV
    Export {
        #[arg(long)]
        input: PathBuf,
        #[arg(long, value_enum)]
        table: Table,
        /// Defaults to the table's file name inside `export_dir`
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Export raw event rows matching the given filters as CSV
    Rows {
        #[arg(long)]
        input: PathBuf,
        #[arg(long = "week")]
        weeks: Vec<i64>,
        #[arg(long = "brand")]
        brands: Vec<String>,
        #[arg(long = "marketplace")]
        marketplaces: Vec<String>,
        /// Defaults to stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Print headline statistics for the whole file
    Stats {
        #[arg(long)]
        input: PathBuf,
    },
    /// Emit chart data series as JSON
    Charts {
        #[arg(long)]
        input: PathBuf,
        /// Defaults to stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Ask the dashboard chatbot a question
    Ask {
        #[arg(long)]
        input: PathBuf,
        #[arg(required = true)]
        query: Vec<String>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| cli.log_level.parse().unwrap_or_default()),
        )
        .init();

    let config = Config::load(&cli.config);

    match cli.command {
        Commands::Report { input, format, out } => {
            let session = load_session(&input)?;
            let contents = match format {
                ReportFormat::Markdown => report::build_report(
                    config.title.as_deref(),
                    &input.display().to_string(),
                    session.dashboard(),
                ),
                ReportFormat::Json => serde_json::to_string_pretty(session.dashboard())?,
            };
            let mut writer = open_output(out.as_deref())?;
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
            if let Some(path) = out {
                println!("Report written to {}.", path.display());
            }
        }
        Commands::Export { input, table, out } => {
            let session = load_session(&input)?;
            let dashboard = session.dashboard();
            let path = out.unwrap_or_else(|| config.export_path(table.default_file_name()));
            let writer = open_output(Some(&path))?;
            match table {
                Table::Brand => export::write_pivot_csv(writer, &dashboard.brand_pivot)?,
                Table::Marketplace => {
                    export::write_pivot_csv(writer, &dashboard.marketplace_pivot)?
                }
                Table::Weekly => export::write_weekly_csv(writer, &dashboard.weekly_summary)?,
            }
            println!("Exported to {}.", path.display());
        }
        Commands::Rows {
            input,
            weeks,
            brands,
            marketplaces,
            out,
        } => {
            let session = load_session(&input)?;
            let filter = Filter::new()
                .with(Column::Week, weeks)
                .with(Column::ProtectedBrandName, brands.iter().map(String::as_str))
                .with(Column::MarketplaceId, marketplaces.iter().map(String::as_str));
            if filter.is_empty() {
                info!("no filters given, exporting every row");
            }
            let rows = filter_rows(&session.dataset().records, &filter);
            if rows.is_empty() {
                let err = DashboardError::EmptyResult("the selected filters".to_string());
                warn!(error = %err, "nothing to export");
                println!("{err}");
                return Ok(());
            }
            let written = export::write_rows_csv(open_output(out.as_deref())?, rows)?;
            info!(rows = written, "exported filtered rows");
        }
        Commands::Stats { input } => {
            let session = load_session(&input)?;
            let stats = &session.dashboard().stats;
            println!("Total suppressions: {}", report::thousands(stats.total_suppressions));
            println!("Event rows: {}", stats.event_rows);
            println!("Brands: {}", stats.total_brands);
            println!("Marketplaces: {}", stats.total_marketplaces);
            if let (Some(first), Some(last)) = (stats.first_action_date, stats.last_action_date) {
                println!("Action dates: {first} to {last}");
            }
            match session.dashboard().latest_week() {
                Some(week) => println!(
                    "Weeks in window: {:?} (latest {week})",
                    session.dashboard().window.ascending()
                ),
                None => println!("No weeks found."),
            }
        }
        Commands::Charts { input, out } => {
            let session = load_session(&input)?;
            let charts = charts::dashboard_charts(session.dashboard());
            let mut writer = open_output(out.as_deref())?;
            serde_json::to_writer_pretty(&mut writer, &charts)?;
            writeln!(writer)?;
            writer.flush()?;
        }
        Commands::Ask { input, query } => {
            let session = load_session(&input)?;
            println!("{}", session.chatbot().answer(&query.join(" ")));
        }
    }

    Ok(())
}

fn load_session(input: &Path) -> anyhow::Result<Session> {
    Session::load(input).with_context(|| format!("failed to load {}", input.display()))
}

fn open_output(path: Option<&Path>) -> anyhow::Result<Box<dyn Write>> {
    match path {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            let file = File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Box::new(BufWriter::new(file)))
        }
        None => Ok(Box::new(std::io::stdout().lock())),
    }
}
