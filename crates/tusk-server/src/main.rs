use std::net::SocketAddr;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;

use tusk_db::DbConfig;
use tusk_service::{LocalService, UserService, DEFAULT_BCRYPT_COST, OWNER_EMAIL};
use tusk_store::StoreConfig;

#[derive(Parser)]
#[command(name = "tusk-server", about = "Task submission and review server")]
struct Cli {
    /// Address to bind
    #[arg(long, env = "TUSK_BIND", default_value = "0.0.0.0")]
    bind: String,

    #[arg(long, env = "TUSK_PORT", default_value_t = 8080)]
    port: u16,

    /// Largest accepted request body, in bytes
    #[arg(
        long,
        env = "TUSK_MAX_UPLOAD_BYTES",
        default_value_t = tusk_server::DEFAULT_MAX_UPLOAD_BYTES
    )]
    max_upload_bytes: usize,

    /// bcrypt work factor for new password hashes
    #[arg(long, env = "TUSK_BCRYPT_COST", default_value_t = DEFAULT_BCRYPT_COST)]
    bcrypt_cost: u32,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the owner account if it does not exist, then exit
    BootstrapOwner,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new("tusk_server=info,tower_http=info")
            }),
        )
        .init();

    let cli = Cli::parse();

    let db = tusk_db::open_database(&DbConfig::from_env()).await?;
    let store = tusk_store::create_store(&StoreConfig::from_env())?;
    let service = LocalService::new(db, store).with_bcrypt_cost(cli.bcrypt_cost);

    let created = service.bootstrap_owner().await?;
    if created {
        tracing::info!("created owner account {OWNER_EMAIL}");
    } else {
        tracing::debug!("owner account already present");
    }

    match cli.command {
        Some(Commands::BootstrapOwner) => {
            if created {
                eprintln!("Created owner account {OWNER_EMAIL}");
            } else {
                eprintln!("Owner account {OWNER_EMAIL} already exists");
            }
        }
        None => {
            let addr = SocketAddr::new(cli.bind.parse()?, cli.port);
            let listener = TcpListener::bind(addr).await?;
            tracing::info!("tusk-server listening on http://{addr}");

            tusk_server::serve(listener, service, cli.max_upload_bytes).await?;
        }
    }

    Ok(())
}
