//! blobctl - command-line access to a blobstore directory
//!
//! Subcommands:
//! - `blobctl put <file>` - Store a file under a generated id
//! - `blobctl put <file> --name <name>` - Store a file under a name
//! - `blobctl get <key>` - Stream content to stdout or `--output`
//! - `blobctl hash <key>` - Print the content digest
//!
//! Keys are written `id:<hex>` or `name:<name>`; a bare string is a name.
//! Every command prints the operation result as JSON.

use anyhow::Result;
use blobstore::ContentKey;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

mod commands;

#[derive(Parser)]
#[command(name = "blobctl")]
#[command(about = "Store, read and hash content in a blobstore directory")]
#[command(version)]
struct Cli {
    /// Store directory (overrides config and BLOBSTORE_PATH)
    #[arg(short, long, global = true)]
    dir: Option<PathBuf>,

    /// TOML config file with a [blobstore] section
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Store a file as a new object
    Put {
        /// File to read
        file: PathBuf,

        /// Store under this name instead of a generated id
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Stream an object's content
    Get {
        key: ContentKey,

        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Read an object fully into memory and report its length
    Bytes { key: ContentKey },

    /// Print the BLAKE3 digest of an object's content
    Hash { key: ContentKey },

    /// Check whether an object exists
    Exists { key: ContentKey },

    /// Replace an existing object's content with a file
    Update { key: ContentKey, file: PathBuf },

    /// Delete an object
    Rm { key: ContentKey },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays clean for JSON and content
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("interrupted, cancelling");
                cancel.cancel();
            }
        });
    }

    let stores = commands::Stores::open(cli.config.as_deref(), cli.dir)?;

    match cli.command {
        Commands::Put { file, name } => {
            commands::put(&stores, &file, name, &cancel).await?;
        }
        Commands::Get { key, output } => {
            commands::get(&stores, &key, output.as_deref(), &cancel).await?;
        }
        Commands::Bytes { key } => {
            commands::bytes(&stores, &key, &cancel).await?;
        }
        Commands::Hash { key } => {
            commands::hash(&stores, &key, &cancel).await?;
        }
        Commands::Exists { key } => {
            commands::exists(&stores, &key, &cancel).await?;
        }
        Commands::Update { key, file } => {
            commands::update(&stores, &key, &file, &cancel).await?;
        }
        Commands::Rm { key } => {
            commands::rm(&stores, &key, &cancel).await?;
        }
    }

    Ok(())
}
