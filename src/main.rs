use anyhow::Context;
use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use tracing::{info, warn};

use kiddos_pipeline::config::Config;
use kiddos_pipeline::pipeline::JoinStrategy;
use kiddos_pipeline::query::{rank_for_issue, rank_overall, TrendTable};
use kiddos_pipeline::{logging, metrics, Pipeline, PipelineError, Table, TitleRecord};

#[derive(Parser)]
#[command(name = "kiddos")]
#[command(about = "Materializes the kids' content-rating table for the discovery dashboard")]
#[command(version = "0.1.0")]
struct Cli {
    /// Directory holding app_data.tsv and score_data/ (overrides config)
    #[arg(long, global = true)]
    data_root: Option<PathBuf>,

    /// Cache file stem (overrides config)
    #[arg(long, global = true)]
    stem: Option<String>,

    /// How issue scores are attached to titles (overrides config)
    #[arg(long, global = true, value_enum)]
    strategy: Option<JoinStrategy>,

    /// Print a Prometheus snapshot of pipeline metrics after the run
    #[arg(long, global = true)]
    metrics: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build or load the analytic table and report what happened
    Materialize {
        /// Rebuild even when a fresh cache file exists
        #[arg(long)]
        no_cache: bool,
    },
    /// Print the freshness key for the current inputs
    Key,
    /// Write the table as JSON lines
    Export {
        /// Output file (stdout when omitted)
        #[arg(long, short)]
        output: Option<PathBuf>,
        #[arg(long)]
        no_cache: bool,
    },
    /// List the best titles overall or for one social issue
    Top {
        #[arg(long)]
        issue: Option<String>,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Show trending social issues with their closest title
    Trending {
        #[arg(long, default_value_t = 5)]
        limit: usize,
    },
}

/// Materialize the table, falling back to the in-memory result when the
/// cache file could not be written.
fn load_table(pipeline: &Pipeline, stem: &str, allow_cache: bool) -> anyhow::Result<Table> {
    match pipeline.materialize(stem, allow_cache) {
        Ok(materialized) => Ok(materialized.table),
        Err(e @ PipelineError::CacheWrite { .. }) => {
            warn!("{}", e);
            e.into_table().context("cache write error without a table")
        }
        Err(e) => Err(e).context("materialization failed"),
    }
}

fn print_title(rank: usize, row: &TitleRecord, issue_column: Option<&str>) {
    let issue = issue_column
        .and_then(|c| row.issue_score(c))
        .map(|v| format!("  distance {:.3}", v))
        .unwrap_or_default();
    println!(
        "{:>3}. {} ({})  avg {:.1}  {}{}",
        rank, row.title, row.original_release_year, row.avg_score, row.age_child, issue
    );
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load()?;
    if let Some(root) = cli.data_root {
        config.data_root = root;
    }
    if let Some(stem) = cli.stem {
        config.stem = stem;
    }
    if let Some(strategy) = cli.strategy {
        config.join_strategy = strategy;
    }

    let _guard = logging::init_logging(&config.log_dir);
    if cli.metrics {
        metrics::init_metrics();
    }

    let span = tracing::info_span!("kiddos", data_root = %config.data_root.display(), stem = %config.stem);
    let _enter = span.enter();

    let pipeline = Pipeline::new(config.pipeline_config());

    match cli.command {
        Commands::Materialize { no_cache } => {
            match pipeline.materialize(&config.stem, !no_cache) {
                Ok(m) => {
                    info!(rows = m.table.len(), from_cache = m.from_cache, "Materialization finished");
                    println!("\n📊 Materialized {}:", config.stem);
                    println!("   Rows: {}", m.table.len());
                    println!("   Issue columns: {}", m.table.issue_columns.len());
                    println!("   Freshness key: {}", m.key);
                    println!("   From cache: {}", m.from_cache);
                    println!("   Cache file: {}", m.location.display());
                }
                Err(e @ PipelineError::CacheWrite { .. }) => {
                    warn!("{}", e);
                    let rows = e.into_table().map_or(0, |t| t.len());
                    println!("\n⚠️  Built {} rows but the cache file was not updated", rows);
                }
                Err(e) => return Err(e).context("materialization failed"),
            }
        }
        Commands::Key => {
            println!("{}", pipeline.freshness_key()?);
        }
        Commands::Export { output, no_cache } => {
            let table = load_table(&pipeline, &config.stem, !no_cache)?;
            let sink: Box<dyn Write> = match &output {
                Some(path) => Box::new(
                    File::create(path).with_context(|| format!("creating {}", path.display()))?,
                ),
                None => Box::new(io::stdout().lock()),
            };
            let mut writer = BufWriter::new(sink);
            for row in &table.rows {
                serde_json::to_writer(&mut writer, row)?;
                writer.write_all(b"\n")?;
            }
            writer.flush()?;
            info!(rows = table.len(), "Exported table");
        }
        Commands::Top { issue, limit } => {
            let table = load_table(&pipeline, &config.stem, true)?;
            match issue {
                Some(issue) => {
                    let column = kiddos_pipeline::pipeline::processing::issue_column(&issue);
                    let ranked = rank_for_issue(&table, &issue, limit);
                    if ranked.is_empty() {
                        println!("No titles scored for '{}'", issue);
                    }
                    for (i, row) in ranked.iter().enumerate() {
                        print_title(i + 1, row, Some(&column));
                    }
                }
                None => {
                    for (i, row) in rank_overall(&table).iter().take(limit).enumerate() {
                        print_title(i + 1, row, None);
                    }
                }
            }
        }
        Commands::Trending { limit } => {
            let trends = TrendTable::load(&config.trend_path())
                .with_context(|| format!("loading {}", config.trend_path().display()))?;
            let table = load_table(&pipeline, &config.stem, true)?;
            for (issue, interest) in trends.trending_issues().into_iter().take(limit) {
                println!("\n🔥 {} (relative interest {:.0})", issue, interest);
                match rank_for_issue(&table, issue, 1).first() {
                    Some(row) => print_title(1, row, None),
                    None => println!("     no matching titles"),
                }
            }
        }
    }

    if cli.metrics {
        if let Some(snapshot) = metrics::render() {
            eprintln!("\n{}", snapshot);
        }
    }

    Ok(())
}
