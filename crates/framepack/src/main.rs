//! Framepack CLI - pack a directory of images into one video container and back.
//!
//! Every image becomes one frame on a shared canvas; a compressed metadata
//! attachment records original names and sizes so unpacking can restore
//! each file exactly where the codec allows.
//!
//! # Usage
//!
//! ```bash
//! # Pack a directory (writes output.mkv)
//! framepack pack ./photos/
//!
//! # Bit-exact, alpha-preserving container
//! framepack pack ./photos/ --lossless -o photos.mkv
//!
//! # Restore the images
//! framepack unpack photos.mkv ./restored/
//!
//! # Check the restored set against the originals
//! framepack verify ./photos/ ./restored/
//! ```

use clap::{Parser, Subcommand};

mod cli;
mod logging;

/// Framepack - pack image collections into a lossless video container.
#[derive(Parser, Debug)]
#[command(name = "framepack")]
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
    /// Pack a directory of images into a video container
    Pack(cli::pack::PackArgs),

    /// Restore the images stored in a container
    Unpack(cli::unpack::UnpackArgs),

    /// Compare original images with restored ones
    Verify(cli::verify::VerifyArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging isn't initialized yet, so config warnings go through eprintln.
    let config = match framepack_core::Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `framepack config path`."
            );
            framepack_core::Config::default()
        }
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("Framepack v{}", framepack_core::VERSION);

    match cli.command {
        Commands::Pack(args) => cli::pack::execute(args).await,
        Commands::Unpack(args) => cli::unpack::execute(args).await,
        Commands::Verify(args) => cli::verify::execute(args).await,
        Commands::Config(args) => cli::config::execute(args).await,
    }
}
