#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{info, warn};
use std::path::{Path, PathBuf};
use velociroute::config::Config;
use velociroute::log_init;
use velociroute::server::schema::{RouteRequest, RouteResponse};
use velociroute::server::{self, build_aggregator};

#[derive(Debug, Parser)]
#[command(name = "velociroute", version, about = "Road condition classification service")]
struct Cli {
    /// YAML configuration; defaults are used when the file does not exist.
    #[arg(long, global = true, default_value = "config.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP service
    Serve {
        #[arg(long)]
        bind: Option<String>,
    },
    /// Classify one image and print the result
    Image { url: String },
    /// Classify a route described by a JSON file
    Route { file: PathBuf },
}

#[actix_web::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let (config, loaded) = load_config(&cli.config)?;
    log_init(&config.logging.filter);

    if !loaded {
        warn!(
            "Config {} not found, using defaults",
            cli.config.display()
        );
    }

    match cli.command.unwrap_or(Command::Serve { bind: None }) {
        Command::Serve { bind } => server::run(config, bind).await,
        Command::Image { url } => {
            let aggregator = build_aggregator(&config)?;
            let result = aggregator.point_classifier().classify_image(&url).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }
        Command::Route { file } => {
            let contents = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read route {}", file.display()))?;
            let request: RouteRequest = serde_json::from_str(&contents)
                .with_context(|| format!("Invalid route {}", file.display()))?;
            let points = request.into_points()?;
            info!("Loaded {} route points from {}", points.len(), file.display());

            let aggregator = build_aggregator(&config)?;
            let report = aggregator.aggregate(&points).await?;
            println!(
                "{}",
                serde_json::to_string_pretty(&RouteResponse::from(report))?
            );
            Ok(())
        }
    }
}

fn load_config(path: &Path) -> Result<(Config, bool)> {
    if path.exists() {
        Ok((Config::load(path)?, true))
    } else {
        Ok((Config::default(), false))
    }
}
