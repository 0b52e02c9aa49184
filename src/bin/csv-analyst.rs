use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use csv_analyst::{Analyst, Config, GeminiGateway, LogFormat};

#[derive(Parser)]
#[command(name = "csv-analyst")]
#[command(about = "Answer a natural-language question about a CSV dataset")]
struct Args {
    #[arg(help = "Path to the CSV file to analyze")]
    csv: PathBuf,

    #[arg(help = "Natural-language question about the dataset")]
    question: String,

    #[arg(long, help = "Path to configuration file (TOML)")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let config = match Config::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match config.logging.format {
        LogFormat::Json => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init(),
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }

    let csv_text = match std::fs::read_to_string(&args.csv) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("Cannot read {}: {}", args.csv.display(), e);
            std::process::exit(1);
        }
    };

    let gateway = match GeminiGateway::new(config.gateway.clone()) {
        Ok(gateway) => gateway,
        Err(e) => {
            eprintln!("Gateway error: {}", e);
            std::process::exit(1);
        }
    };

    info!(csv = %args.csv.display(), "Starting analysis");

    let analyst = Analyst::new(Arc::new(gateway));
    let response = analyst.analyze(&csv_text, &args.question).await;

    match serde_json::to_string_pretty(&response) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Failed to serialize response: {}", e);
            std::process::exit(1);
        }
    }
}
