use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::audit::AuditCommand;

#[derive(Parser, Debug)]
#[command(name = "dairy", version, about = "Dairy cooperative admin backend")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP API.
    Serve {
        /// Configuration file. Defaults apply when it does not exist.
        #[arg(long, short, default_value = "dairy.yaml", env = "DAIRY_CONFIG")]
        config: PathBuf,
    },

    /// Generate a session signing keypair.
    Keygen {
        /// Write `private.key` and `public.key` into this directory instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Inspect a JSON Lines audit log.
    Audit {
        #[command(subcommand)]
        cmd: AuditCommand,
    },
}

fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.cmd {
        Command::Serve { config } => {
            let config = commands::serve::load_config(&config)?;
            init_tracing(&config.logging.level);
            commands::serve::run(config).await?
        }

        Command::Keygen { output } => {
            init_tracing("warn");
            commands::keys::generate(output)?
        }

        Command::Audit { cmd } => {
            init_tracing("warn");
            commands::audit::run(cmd).await?
        }
    }

    Ok(())
}
