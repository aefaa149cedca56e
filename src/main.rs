use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::info;

use cybershield::config::{model_files_present, Config};
use cybershield::output::terminal;
use cybershield::pipeline::batch;
use cybershield::verdict::ScanReport;

/// CyberShield: scam and phishing detection for links, messages and screenshots.
///
/// Each scan runs a fixed order of checks: local addresses and trusted
/// brands first, then keyword traps, then the trained models. Missing
/// models never stop a scan; the verdict just gets less confident.
#[derive(Parser)]
#[command(name = "cybershield", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a single URL
    Url {
        /// The URL to check (scheme optional)
        url: String,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Scan a text message (SMS, chat, email body)
    Text {
        /// The message text
        text: String,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Extract text from a screenshot and scan it
    Image {
        /// Path to the image file
        path: PathBuf,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the 12 URL features the classifier sees
    Features {
        /// The URL to extract features from
        url: String,
    },

    /// Scan every URL in a file (one per line, `#` comments allowed)
    Batch {
        /// Path to the URL list
        file: PathBuf,

        /// Number of URLs to scan in parallel (default: 8)
        #[arg(long, default_value = "8")]
        concurrency: u32,

        /// Print the reports as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show which models and lookups are active
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("cybershield=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Url { url, json } => {
            let scanner = Config::load()?.build_scanner()?;
            let report = scanner.scan_url(&url).await?;
            print_report(&report, json)?;
        }

        Commands::Text { text, json } => {
            let scanner = Config::load()?.build_scanner()?;
            let report = scanner.scan_text(&text).await?;
            print_report(&report, json)?;
        }

        Commands::Image { path, json } => {
            let image = std::fs::read(&path)
                .with_context(|| format!("failed to read image {}", path.display()))?;
            let scanner = Config::load()?.build_scanner()?;
            let report = scanner.scan_image(&image).await?;
            print_report(&report, json)?;
        }

        Commands::Features { url } => {
            let features = cybershield::features::extract(url.trim());
            terminal::display_features(&url, &features);
        }

        Commands::Batch {
            file,
            concurrency,
            json,
        } => {
            let contents = std::fs::read_to_string(&file)
                .with_context(|| format!("failed to read URL list {}", file.display()))?;
            let urls = batch::parse_url_list(&contents);
            if urls.is_empty() {
                println!("No URLs found in {}.", file.display());
                return Ok(());
            }

            let scanner = Config::load()?.build_scanner()?;
            info!(count = urls.len(), concurrency, "Starting batch scan");
            let items = batch::scan_urls(&scanner, urls, concurrency as usize, !json).await;

            if json {
                let reports: Vec<serde_json::Value> = items
                    .iter()
                    .map(|item| match &item.report {
                        Ok(report) => serde_json::to_value(report),
                        Err(e) => Ok(serde_json::json!({
                            "input": item.url,
                            "error": e.to_string(),
                        })),
                    })
                    .collect::<Result<_, _>>()?;
                println!("{}", serde_json::to_string_pretty(&reports)?);
            } else {
                terminal::display_batch(&items);
            }
        }

        Commands::Status => {
            let config = Config::load()?;
            let scanner = config.build_scanner()?;
            terminal::display_status(&scanner.status());

            println!("  Model directory: {}", config.model_dir.display());
            if !model_files_present(&config.model_dir) {
                println!(
                    "  {}",
                    format!(
                        "Place url_model.onnx and text_model.json in {} for full accuracy.",
                        config.model_dir.display()
                    )
                    .dimmed()
                );
            }
        }
    }

    Ok(())
}

fn print_report(report: &ScanReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        terminal::display_report(report);
    }
    Ok(())
}
