mod error;
mod extract;
mod fetch;
mod report;
mod settings;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use rayon::prelude::*;
use tracing::info;

use error::ExtractError;
use extract::Extractor;
use fetch::Fetcher;
use report::Report;
use settings::Settings;

#[derive(Parser)]
#[command(name = "mint_scout", about = "Find the contract address behind an NFT mint page")]
struct Cli {
    /// Config file (default: ./mint_scout.toml if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[arg(short, long, global = true, value_enum, default_value = "json")]
    format: Format,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Json,
    Table,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a mint page and rank the contract addresses on it
    Url { url: String },
    /// Rank addresses in local HTML files ("-" reads stdin)
    File {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Fetch and rank every URL listed in a file (one per line)
    Batch {
        list: PathBuf,
        /// Max URLs to process (default: all)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Show the active recognition rules and denylist
    Rules,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref())?;
    let extractor = Extractor::from_settings(&settings).context("Invalid recognition rules")?;

    let code = match cli.command {
        Commands::Url { url } => {
            let report = if url.trim().is_empty() {
                Report::from(ExtractError::InputMissing)
            } else {
                let fetcher = Fetcher::new(&settings)?;
                info!("Fetching {}", url);
                fetch::fetch_and_extract(&fetcher, &extractor, &url).await
            };
            emit(cli.format, &url, &report);
            exit_code(&[report])
        }
        Commands::File { paths } => {
            let docs = fetch::LocalDocuments::new(&paths);
            let reports: Vec<(String, Report)> = paths
                .par_iter()
                .map(|p| {
                    let report: Report = match docs.read(p) {
                        Ok(html) => extractor.extract(&html).into(),
                        Err(e) => e.into(),
                    };
                    (p.display().to_string(), report)
                })
                .collect();

            let many = reports.len() > 1;
            for (source, report) in &reports {
                match cli.format {
                    Format::Json if many => report::print_json_line(source, report),
                    _ => emit(cli.format, source, report),
                }
            }
            let reports: Vec<Report> = reports.into_iter().map(|(_, r)| r).collect();
            exit_code(&reports)
        }
        Commands::Batch { list, limit } => {
            let text = std::fs::read_to_string(&list)
                .with_context(|| format!("Failed to read URL list {}", list.display()))?;
            let mut urls = fetch::parse_url_list(&text);
            if let Some(n) = limit {
                urls.truncate(n);
            }
            if urls.is_empty() {
                println!("No URLs in {}.", list.display());
                return Ok(ExitCode::SUCCESS);
            }

            info!("Batch: {} URLs, concurrency {}", urls.len(), settings.concurrency);
            let format = cli.format;
            let stats = fetch::run_batch(
                Arc::new(Fetcher::new(&settings)?),
                Arc::new(extractor),
                urls,
                settings.concurrency,
                |url, report| match format {
                    Format::Json => report::print_json_line(url, report),
                    Format::Table => report::print_table(url, report),
                },
            )
            .await?;
            eprintln!(
                "Done: {} pages ({} with address, {} without, {} errors).",
                stats.total, stats.found, stats.empty, stats.errors
            );
            if stats.errors > 0 {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            }
        }
        Commands::Rules => {
            println!("{:>3} | {:<8} | {:<22} | Pattern", "#", "Kind", "Name");
            println!("{}", "-".repeat(100));
            for (i, rule) in extractor.patterns().rules().iter().enumerate() {
                println!(
                    "{:>3} | {:<8} | {:<22} | {}",
                    i + 1,
                    rule.kind,
                    rule.name,
                    rule.pattern()
                );
            }
            println!("\nDenylist ({}):", extractor.denylist().len());
            if extractor.denylist().is_empty() {
                println!("  (empty)");
            }
            for addr in extractor.denylist().sorted() {
                println!("  {}", addr);
            }
            ExitCode::SUCCESS
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        eprintln!("Done in {:.1}s", elapsed.as_secs_f64());
    }

    Ok(code)
}

fn emit(format: Format, source: &str, report: &Report) {
    match format {
        Format::Json => report::print_json(report),
        Format::Table => report::print_table(source, report),
    }
}

fn exit_code(reports: &[Report]) -> ExitCode {
    if reports.iter().all(Report::is_success) {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
