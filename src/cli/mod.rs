use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use crate::auth::{generate_jwt, Claims};
use crate::config::AppConfig;
use crate::database::connect_store;
use crate::middleware::AuthGate;
use crate::server::{app, ApiServer};

#[derive(Parser)]
#[command(name = "fries-rest")]
#[command(about = "REST API for game entity records backed by MongoDB")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the HTTP server (default)")]
    Serve {
        #[arg(long, help = "Listen port, overrides FRIES_REST_PORT")]
        port: Option<u16>,
        #[arg(long, help = "Listen host, overrides FRIES_REST_HOST")]
        host: Option<String>,
    },

    #[command(about = "Mint a signed token with the configured client secret")]
    Token {
        #[arg(long, help = "Subject claim")]
        subject: String,
        #[arg(long, default_value_t = 24, help = "Hours until the token expires")]
        hours: i64,
    },
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let command = cli.command.unwrap_or(Commands::Serve { port: None, host: None });

    match command {
        Commands::Serve { port, host } => {
            let mut config = AppConfig::from_env().context("invalid configuration")?;
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(host) = host {
                config.server.host = host;
            }
            serve(config).await
        }
        Commands::Token { subject, hours } => {
            let secret = std::env::var("FRIES_REST_CLIENT_SECRET")
                .context("FRIES_REST_CLIENT_SECRET must be set to mint tokens")?;
            let token = generate_jwt(&Claims::new(subject, hours), &secret)?;
            println!("{}", token);
            Ok(())
        }
    }
}

/// Serve until Ctrl-C, then shut down gracefully and release the store
pub async fn serve(config: AppConfig) -> anyhow::Result<()> {
    let gate = AuthGate::from_config(&config)?;
    let store = connect_store(&config.database)
        .await
        .context("failed to connect to the document store")?;

    let mut server = ApiServer::start(
        app(store.clone(), gate, config.server.max_body_bytes),
        &config.listen_addr(),
    )
    .await?;

    tokio::signal::ctrl_c().await.context("failed to listen for shutdown signal")?;
    info!("Shutdown signal received");

    server.stop().await?;
    store.close().await;
    Ok(())
}
