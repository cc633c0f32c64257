use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use veilsync_core::{KeyMaterial, SyncEngine, SyncSettings};

/// VeilSync CLI - encrypted mirroring of vector collections to a cloud cluster
#[derive(Parser)]
#[command(name = "veilsync")]
#[command(about = "Encrypted vector-collection mirroring", long_about = None)]
struct Cli {
    /// Settings file (TOML); VEILSYNC_* environment variables are used when
    /// no file is given
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Probe both cluster endpoints
    Status,

    /// Diff collections between the local and cloud clusters
    Diff,

    /// Mirror local collections to the cloud cluster
    Sync {
        /// Single collection to sync (defaults to the mirroring policy set)
        collection: Option<String>,
    },

    /// Verify integrity tags of cloud-stored points
    Verify {
        /// Single collection to verify
        collection: Option<String>,
    },

    /// List cloud collections
    Collections,

    /// Show the active key pair's public parameters
    KeyInfo,

    /// Generate a new sync key pair and print it for configuration
    Keygen,
}

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("setting default subscriber failed");

    let cli = Cli::parse();

    // Keygen needs no settings and must work before any are configured.
    if let Commands::Keygen = cli.command {
        let keys = KeyMaterial::generate();
        println!("sync_key = \"{}\"", keys.secret_key_base64());
        println!("# public key: {}", keys.public_key_base64());
        println!("# fingerprint: {}", keys.fingerprint());
        return Ok(());
    }

    let settings = match &cli.config {
        Some(path) => SyncSettings::load(path)?,
        None => SyncSettings::from_env(),
    };
    let engine = SyncEngine::from_settings(&settings)?;

    match cli.command {
        Commands::Status => {
            print_json(&engine.status().await)?;
        }
        Commands::Diff => {
            print_json(&engine.diff().await?)?;
        }
        Commands::Sync { collection } => {
            let report = engine.sync(collection.as_deref()).await?;
            info!(
                "Synced {} of {} points ({} failed)",
                report.total_synced, report.total_points, report.total_failed
            );
            print_json(&report)?;
        }
        Commands::Verify { collection } => {
            let report = engine.verify(collection.as_deref()).await?;
            info!(
                "Verified {} points: {} intact, {} corrupted, {} missing tags",
                report.total_points,
                report.total_intact,
                report.total_corrupted,
                report.total_missing
            );
            print_json(&report)?;
        }
        Commands::Collections => {
            print_json(&engine.list_cloud_collections().await?)?;
        }
        Commands::KeyInfo => {
            print_json(&engine.key_info()?)?;
        }
        Commands::Keygen => unreachable!("handled above"),
    }

    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
