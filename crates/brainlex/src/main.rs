//! # Brainlex CLI (`brainlex`)
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `brainlex serve` | Start the HTTP server and UI |
//! | `brainlex check ...` | Try a set of credentials and list hierarchy models |
//! | `brainlex init ...` | Create the expected tables on a development database |
//!
//! ## Examples
//!
//! ```bash
//! brainlex serve --bind 0.0.0.0:8000
//! brainlex check --host db.local --port 5432 --username reader --password pw --database atlas
//! ```

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use brainlex::connection::ConnectParams;
use brainlex::{check, config, server};

/// Brainlex: search and browse cognitive concepts and brain structures.
#[derive(Parser)]
#[command(name = "brainlex", version, about)]
struct Cli {
    /// Path to configuration file (TOML). Defaults apply if it does not exist.
    #[arg(long, global = true, default_value = "./config/brainlex.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server.
    ///
    /// The server starts disconnected; credentials are entered in the UI.
    Serve {
        /// Override `[server].bind`.
        #[arg(long)]
        bind: Option<String>,
    },

    /// Connect with the given credentials and report what the database offers.
    Check(CredentialArgs),

    /// Create the expected tables (idempotent).
    Init(CredentialArgs),
}

#[derive(Args)]
struct CredentialArgs {
    #[arg(long, default_value = "localhost")]
    host: String,
    #[arg(long, default_value_t = 5432)]
    port: u16,
    #[arg(long)]
    username: String,
    #[arg(long)]
    password: String,
    #[arg(long)]
    database: String,
}

impl From<CredentialArgs> for ConnectParams {
    fn from(a: CredentialArgs) -> Self {
        ConnectParams {
            host: a.host,
            port: a.port,
            username: a.username,
            password: a.password,
            database: a.database,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut cfg = config::load_or_default(&cli.config)?;

    let filter =
        EnvFilter::try_new(&cfg.server.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Serve { bind } => {
            if let Some(bind) = bind {
                cfg.server.bind = bind;
            }
            server::run_server(&cfg).await?;
        }
        Commands::Check(args) => {
            check::run_check(&cfg, &args.into()).await?;
        }
        Commands::Init(args) => {
            check::run_init(&cfg, &args.into()).await?;
        }
    }

    Ok(())
}
