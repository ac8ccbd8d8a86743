use anyhow::Context;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing::info;

use crate::auth::{generate_jwt, Claims};
use crate::config::{self, AppConfig};
use crate::database::DatabaseManager;
use crate::state::AppState;
use crate::store::{DocumentStore, MemoryDocumentStore, PgDocumentStore};

#[derive(Parser)]
#[command(name = "product-api")]
#[command(about = "Product catalogue API server")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the HTTP server")]
    Serve {
        #[arg(long, help = "Port to listen on (overrides SERVER_PORT)")]
        port: Option<u16>,
        #[arg(long, help = "Keep products in memory instead of Postgres")]
        memory: bool,
    },

    #[command(about = "Create the products table if missing")]
    Migrate,

    #[command(about = "Mint a bearer token for local use")]
    Token {
        #[arg(long, help = "User id to put in the token")]
        user: String,
        #[arg(long, help = "Grant admin rights")]
        admin: bool,
    },
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = config::config();

    match cli.command {
        Commands::Serve { port, memory } => serve(config, port, memory).await,
        Commands::Migrate => {
            let pool = DatabaseManager::connect(&config.database).await?;
            DatabaseManager::migrate(&pool).await?;
            Ok(())
        }
        Commands::Token { user, admin } => {
            let claims = Claims::new(user, admin, config.security.jwt_expiry_hours);
            let token = generate_jwt(&claims, &config.security.jwt_secret)?;
            println!("{}", token);
            Ok(())
        }
    }
}

async fn serve(config: &AppConfig, port: Option<u16>, memory: bool) -> anyhow::Result<()> {
    info!("Starting Product API in {:?} mode", config.environment);

    if config.security.jwt_secret.is_empty() {
        anyhow::bail!("SECURITY_JWT_SECRET must be set outside development");
    }

    let store: Arc<dyn DocumentStore> = if memory {
        info!("Using in-memory product store");
        Arc::new(MemoryDocumentStore::new())
    } else {
        let pool = DatabaseManager::connect(&config.database).await?;
        DatabaseManager::migrate(&pool).await?;
        Arc::new(PgDocumentStore::new(pool))
    };

    let app = crate::app(AppState::new(store, config), config);

    let bind_addr = format!("{}:{}", config.server.host, port.unwrap_or(config.server.port));
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    info!("Product API listening on http://{}", bind_addr);
    axum::serve(listener, app).await?;
    Ok(())
}
