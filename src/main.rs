//! Entry point: load config, wire dependencies, and run the server.

use std::sync::Arc;

use authgate::auth::JwtSecret;
use authgate::config::Config;
use authgate::db::{MemoryUserStore, PgUserStore, UserStore};
use authgate::{auth_route_table, create_app, AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::from_env().map_err(|e| anyhow::anyhow!("config: {}", e))?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))?;
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let store: Arc<dyn UserStore> = match &config.database_url {
        Some(url) => Arc::new(PgUserStore::connect(url).await?),
        None => {
            tracing::warn!("DATABASE_URL not set; users are kept in memory");
            Arc::new(MemoryUserStore::new())
        }
    };
    let jwt_secret = JwtSecret::new(config.jwt_secret.clone(), config.jwt_ttl_hours);
    let state = AppState::new(store, jwt_secret);

    let routes = auth_route_table()?;
    for binding in routes.bindings() {
        tracing::info!(
            method = %binding.method(),
            path = binding.path(),
            stages = ?binding.stages(),
            "route registered"
        );
    }

    let app = create_app(state, &routes);

    tracing::info!(addr = %config.server_addr, "listening");
    let listener = tokio::net::TcpListener::bind(config.server_addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
