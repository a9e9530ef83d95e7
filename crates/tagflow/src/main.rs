//! Tagflow CLI - automatic image tagging via an isolated classification worker.
//!
//! The CLI is the host side of the pipeline: it spawns the worker, loads the
//! configured model, submits each image file, and prints the labels the
//! drained queue published.
//!
//! # Usage
//!
//! ```bash
//! # Tag images with the configured model
//! tagflow tag photo1.jpg photo2.png
//!
//! # Override the model and artifact base
//! tagflow tag --model mobilenet-ssd --base https://models.example.com photo.jpg
//!
//! # View configuration
//! tagflow config show
//! ```

use clap::{Parser, Subcommand};

mod cli;
mod logging;

/// Tagflow - automatic image tagging via an isolated classification worker.
#[derive(Parser, Debug)]
#[command(name = "tagflow")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Classify images and print their tags
    Tag(cli::tag::TagArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging isn't initialized yet, so config warnings go to eprintln.
    let config = match tagflow_core::Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `tagflow config path`."
            );
            tagflow_core::Config::default()
        }
    };
    logging::init(&config, cli.verbose, cli.json_logs);

    tracing::debug!("Tagflow v{}", tagflow_core::VERSION);

    match cli.command {
        Commands::Tag(args) => cli::tag::execute(args, config).await,
        Commands::Config(args) => cli::config::execute(args).await,
    }
}
