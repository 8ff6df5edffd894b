//! qdrant-migrate CLI
//!
//! CLI tool for migrating vectors from Pinecone to Qdrant.
//! Pedantic lints relaxed for CLI ergonomics.

// CLI tool - relax pedantic lints for ergonomics
#![allow(clippy::pedantic)]

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use qdrant_migrate::connectors::create_reader;
use qdrant_migrate::{migrate, EnvCredentials, MigrationConfig};

#[derive(Parser)]
#[command(name = "qdrant-migrate")]
#[command(version)]
#[command(about = "Migrate vectors from Pinecone to Qdrant", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run migration from config file
    Run {
        /// Configuration file path
        #[arg(short, long, value_name = "FILE")]
        config: PathBuf,

        /// Dry run mode (don't write to destination)
        #[arg(long)]
        dry_run: bool,

        /// Batch size override
        #[arg(long)]
        batch_size: Option<usize>,

        /// Compare destination point count after the run
        #[arg(long)]
        verify: bool,

        /// Write fetched records to a JSON file
        #[arg(long, value_name = "FILE")]
        dump: Option<PathBuf>,
    },

    /// Validate configuration file
    Validate {
        /// Configuration file path
        #[arg(short, long, value_name = "FILE")]
        config: PathBuf,
    },

    /// Show schema of the source index
    Schema {
        /// Configuration file path
        #[arg(short, long, value_name = "FILE")]
        config: PathBuf,
    },

    /// Generate example configuration
    Init {
        /// Output file path
        #[arg(short, long, default_value = "migration.yaml")]
        output: PathBuf,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Run {
            config,
            dry_run,
            batch_size,
            verify,
            dump,
        } => {
            run_migration(&config, dry_run, batch_size, verify, dump).await?;
        }
        Commands::Validate { config } => {
            validate_config(&config)?;
        }
        Commands::Schema { config } => {
            show_schema(&config).await?;
        }
        Commands::Init { output } => {
            generate_config(&output)?;
        }
    }

    Ok(())
}

async fn run_migration(
    config_path: &Path,
    dry_run: bool,
    batch_size: Option<usize>,
    verify: bool,
    dump: Option<PathBuf>,
) -> anyhow::Result<()> {
    info!("Loading configuration from {:?}", config_path);

    let mut config = MigrationConfig::from_file(config_path)?;

    if dry_run {
        config.options.dry_run = true;
    }
    if verify {
        config.options.verify = true;
    }
    if let Some(bs) = batch_size {
        config.options.batch_size = bs;
    }
    if dump.is_some() {
        config.options.dump_path = dump;
    }

    let credentials = EnvCredentials::new();
    let stats = migrate(&config, &credentials).await?;

    println!("\n✅ Migration Complete!");
    println!("   Requested:  {}", stats.requested);
    println!("   Fetched:    {}", stats.fetched);
    println!("   Missing:    {}", stats.missing);
    println!("   Written:    {}", stats.written);
    println!("   Batches:    {}", stats.batches);
    if let Some(count) = stats.destination_count {
        println!("   In Qdrant:  {}", count);
    }
    if let Some(path) = &stats.dump_path {
        println!("   Dump:       {}", path.display());
    }
    println!("   Duration:   {:.2}s", stats.duration_secs);
    println!("   Throughput: {:.0} vectors/sec", stats.throughput());

    Ok(())
}

fn validate_config(config_path: &Path) -> anyhow::Result<()> {
    info!("Validating configuration from {:?}", config_path);

    let config = MigrationConfig::from_file(config_path)?;
    config.validate()?;
    let ids = config.ids.load()?;

    println!("✅ Configuration is valid!");
    println!("   Source index: {}", config.source.index_name());
    println!("   Collection:   {}", config.collection_name());
    println!("   Metric:       {}", config.destination.metric().as_qdrant());
    println!("   Ids:          {}", ids.len());
    println!("   Batch size:   {}", config.options.batch_size);

    Ok(())
}

async fn show_schema(config_path: &Path) -> anyhow::Result<()> {
    info!("Loading configuration from {:?}", config_path);

    let config = MigrationConfig::from_file(config_path)?;
    let credentials = EnvCredentials::new();
    let mut reader = create_reader(&config.source, &credentials)?;
    let descriptor = reader.open(config.source.index_name()).await?;

    println!("\n📊 Source Schema:");
    println!("   Type:       {}", reader.source_type());
    println!("   Index:      {}", descriptor.name);
    println!("   Dimension:  {}", descriptor.dimension);
    println!("   Metric:     {}", descriptor.metric.as_qdrant());

    Ok(())
}

fn generate_config(output: &Path) -> anyhow::Result<()> {
    std::fs::write(output, TEMPLATE)?;
    println!("✅ Generated configuration: {:?}", output);
    println!(
        "   Edit the file and run: qdrant-migrate run --config {:?}",
        output
    );

    Ok(())
}

const TEMPLATE: &str = r#"# qdrant-migrate configuration
# Credentials come from PINECONE_API_KEY, PINECONE_ENVIRONMENT and, in cloud
# mode, QDRANT_URL and QDRANT_API_KEY. Missing values are prompted for.
source:
  type: pinecone
  index: your-index-name
  # namespace: optional-namespace

destination:
  type: qdrant
  mode: local  # local (url below, no key) or cloud
  url: http://localhost:6333
  # collection: defaults to the source index name
  metric: cosine  # cosine, euclid, dot, or manhattan

ids:
  list: ["1", "2", "3", "4", "5"]
  # file: ids.txt
  # range: {start: 1, end: 10000}

options:
  batch_size: 1000  # at most 1000 per Pinecone fetch
  dry_run: false
  verify: false
  # dump_path: fetched_vectors.json
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_is_valid_config() {
        let config = MigrationConfig::from_yaml(TEMPLATE).unwrap();
        config.validate().unwrap();
        assert_eq!(config.collection_name(), "your-index-name");
    }

    #[test]
    fn test_cli_parses_run() {
        let cli = Cli::try_parse_from([
            "qdrant-migrate",
            "run",
            "--config",
            "m.yaml",
            "--batch-size",
            "200",
            "--dry-run",
        ])
        .unwrap();

        match cli.command {
            Commands::Run {
                batch_size,
                dry_run,
                ..
            } => {
                assert_eq!(batch_size, Some(200));
                assert!(dry_run);
            }
            _ => panic!("expected run"),
        }
    }
}
