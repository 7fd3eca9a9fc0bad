use std::net::SocketAddr;

use dotenvy::dotenv;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use ecell_website::config::Config;
use ecell_website::database;
use ecell_website::state::AppState;

#[tokio::main]
async fn main() {
    dotenv().ok();

    // 1. Logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("ecell_website=info,tower_http=info")),
        )
        .init();

    // 2. Config and database
    let config = Config::load();
    if config.jwt_secret.is_none() {
        warn!("AUTH_JWT_SECRET not set: every request confirms its access token with the auth service");
    }
    if config.admin_emails.is_empty() {
        info!("ADMIN_EMAILS not set, admins must be flagged in the database");
    }

    info!("Connecting to database: {}", config.database_url);
    let pool = match database::connect(&config.database_url).await {
        Ok(p) => p,
        Err(e) => {
            error!("Could not open database {}: {}", config.database_url, e);
            std::process::exit(1);
        }
    };

    // 3. Router
    let host = config.host.clone();
    let port = config.port;
    let app = ecell_website::build_router(AppState::new(pool, config));

    // 4. Serve, falling back to the next port when the configured one is taken
    let listener = match bind(&host, port).await {
        Ok(l) => l,
        Err(e) => {
            warn!(
                "Could not bind {}:{}: {}. Trying {}:{}",
                host,
                port,
                e,
                host,
                port.saturating_add(1)
            );
            match bind(&host, port.saturating_add(1)).await {
                Ok(l) => l,
                Err(e) => {
                    error!("Could not bind fallback port: {}", e);
                    std::process::exit(1);
                }
            }
        }
    };

    match listener.local_addr() {
        Ok(addr) => info!("Server running on http://{}", addr),
        Err(e) => warn!("Server running, local address unknown: {}", e),
    }

    if let Err(e) = axum::serve(listener, app).await {
        error!("Server error: {}", e);
    }
}

async fn bind(host: &str, port: u16) -> std::io::Result<tokio::net::TcpListener> {
    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;
    tokio::net::TcpListener::bind(addr).await
}
