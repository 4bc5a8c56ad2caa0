///
/// This module implements the CLI interface for pebblo-reader: command parsing,
/// wiring the safe reader together, and printing the loaded documents.
///
/// All reader and classifier logic lives in the [`pebblo-reader-core`] crate.
/// This module is strictly CLI glue.
///
/// ## How To Use
/// - For command-line users: `pebblo-reader load --config app.yaml data.txt`.
/// - For programmatic/integration use: call [`run`] with a constructed [`Cli`].
///
/// [`pebblo-reader-core`]: ../../pebblo-reader-core/
use crate::load_config::load_config;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pebblo_reader_core::client::HttpPebbloClient;
use pebblo_reader_core::safe_reader::PebbloSafeReader;
use pebblo_reader_core::text_reader::TextFileReader;
use std::path::PathBuf;

/// CLI for pebblo-reader: load documents while reporting them to a Pebblo classifier.
#[derive(Parser)]
#[clap(
    name = "pebblo-reader",
    version,
    about = "Load documents through a reader that reports each load to a Pebblo classifier"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load a text file and print its documents as JSON
    Load {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
        /// File to load
        path: PathBuf,
    },
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Load { config, path } => {
            let config = load_config(config)?;
            tracing::info!(command = "load", path = %path.display(), "Starting load");

            let client = HttpPebbloClient::new(&config.pebblo)
                .context("Failed to construct Pebblo client")?;
            let reader = PebbloSafeReader::connect(TextFileReader, client, config.reader)
                .await
                .context("Invalid safe reader configuration")?;

            let docs = reader
                .load(&path)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to load {}: {e}", path.display()))?;
            tracing::info!(command = "load", docs = docs.len(), "Load complete");

            println!("{}", serde_json::to_string_pretty(&docs)?);
            Ok(())
        }
    }
}
