use anyhow::Result;
use clap::{Parser, Subcommand};
use notekeeper::{gateway, Config, Notebook};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Multi-user note-taking service.
#[derive(Parser, Debug)]
#[command(name = "notekeeper", version, about)]
struct Cli {
    /// Path to config.toml (defaults to the platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP gateway
    Serve {
        /// Bind address (overrides gateway.host)
        #[arg(long)]
        host: Option<String>,
        /// Port (overrides gateway.port)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Create the database and schema
    Init,
    /// Print user and entry counts
    Status,
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("notekeeper=info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve { host, port } => {
            let host = host.unwrap_or_else(|| config.gateway.host.clone());
            let port = port.unwrap_or(config.gateway.port);
            let notebook = Arc::new(Notebook::open(&config)?);
            gateway::run_gateway(&host, port, notebook).await
        }
        Commands::Init => {
            Notebook::open(&config)?;
            println!("Database ready at {}", config.database_path.display());
            Ok(())
        }
        Commands::Status => {
            let notebook = Notebook::open(&config)?;
            println!("Database: {}", config.database_path.display());
            println!("Users:    {}", notebook.credentials().user_count()?);
            println!("Entries:  {}", notebook.entries().entry_count()?);
            Ok(())
        }
    }
}
