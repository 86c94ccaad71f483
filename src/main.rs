//! coach - workout plan storage, block plan transformation and client sync

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::sync::Mutex;
use tracing_subscriber::EnvFilter;

use coach::config::Config;
use coach::db::Database;
use coach::plan::transform_value;
use coach::server::{self, DEFAULT_PORT, TEST_PORT};
use coach::tools::{Tools, ingest, stdio};

#[derive(Parser)]
#[command(name = "coach")]
#[command(author, version, about = "Workout plans for a planning agent, synced to a workout client")]
struct Cli {
    #[command(flatten)]
    config: Config,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP sync API
    Serve {
        /// Port to listen on (overrides --test)
        #[arg(short, long, env = "COACH_PORT")]
        port: Option<u16>,

        /// Use the test port instead of the default one
        #[arg(long)]
        test: bool,

        /// Address to bind
        #[arg(long, default_value = "0.0.0.0")]
        bind: String,
    },

    /// Serve the planning tools over stdin/stdout
    Tools,

    /// Transform and store a file of block plans keyed by date
    Ingest {
        /// JSON file: {"YYYY-MM-DD": block_plan, ...}
        file: PathBuf,
    },

    /// Print the canonical plan for one block plan file
    Transform {
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // stdout carries the tool protocol, logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.config;

    match cli.command {
        Commands::Serve { port, test, bind } => {
            config.validate_limits()?;
            let port = port.unwrap_or(if test { TEST_PORT } else { DEFAULT_PORT });
            let db = Database::open(&config.db_path_str())?;
            tracing::info!(db = %config.db_path.display(), "database ready");
            server::run_serve(Arc::new(Mutex::new(db)), &bind, port).await?;
        }

        Commands::Tools => {
            let tools = Tools::open(&config)?;
            stdio::run_stdio(tools).await?;
        }

        Commands::Ingest { file } => {
            let tools = Tools::open(&config)?;
            let plans = ingest::read_plan_file(&file)?;
            println!("Ingesting {} plans into {}", plans.len(), config.db_path.display());

            let (mut ok, mut failed) = (0, 0);
            for (date, result) in ingest::ingest_block_plans(&tools, &plans) {
                match result {
                    Ok(saved) => {
                        let count = saved.plan["exercises"].as_array().map_or(0, Vec::len);
                        println!("  {} | {} exercises", date, count);
                        ok += 1;
                    }
                    Err(e) => {
                        println!("  {} | error: {}", date, e);
                        failed += 1;
                    }
                }
            }
            println!("{:-<40}", "");
            println!("Done: {} saved, {} errors", ok, failed);
        }

        Commands::Transform { file } => {
            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let block_plan: serde_json::Value = serde_json::from_str(&text)?;
            let plan = transform_value(&block_plan);
            println!("{}", serde_json::to_string_pretty(&plan)?);
        }
    }

    Ok(())
}
