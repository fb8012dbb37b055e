use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};
use drivesync_cli::{commands, DownloadFlags};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Mirror the configured remote folder into RootFolder
    #[command(alias = "d")]
    Download {
        /// Settings file (JSON)
        config: Utf8PathBuf,
        #[arg(short, long)]
        threads: Option<usize>,
        #[arg(long)]
        limit_mb: Option<u64>,
        #[arg(long, help = "Reject downloads whose MD5 differs from the remote checksum")]
        verify: bool,
        #[arg(long, help = "Save the checksum file after every N downloads")]
        checkpoint_every: Option<usize>,
    },
    /// Upload TargetFile into the RootId folder
    #[command(alias = "u")]
    Upload {
        /// Settings file (JSON)
        config: Utf8PathBuf,
        #[arg(long, help = "Upload this file instead of TargetFile")]
        file: Option<Utf8PathBuf>,
        #[arg(long, help = "Upload into this folder id instead of RootId")]
        folder: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Download {
            config,
            threads,
            limit_mb,
            verify,
            checkpoint_every,
        } => {
            let flags = DownloadFlags {
                threads,
                limit_mb,
                verify,
                checkpoint_every,
            };
            commands::cmd_download(config, flags).await?;
        }
        Commands::Upload {
            config,
            file,
            folder,
        } => {
            commands::cmd_upload(config, file, folder).await?;
        }
    }

    Ok(())
}
