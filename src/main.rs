//! OpenSASE Orders - order lifecycle service

use anyhow::Result;
use opensase_orders::{api::{self, AppState}, Config, MemoryOrderStore, OrderManager, OrderStore, PgOrderStore};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry().with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into())).with(tracing_subscriber::fmt::layer()).init();
    let config = Config::from_env()?;

    let store: Arc<dyn OrderStore> = match &config.database_url {
        Some(url) => {
            let db = PgPoolOptions::new().max_connections(config.max_connections).connect(url).await?;
            sqlx::migrate!("./migrations").run(&db).await?;
            Arc::new(PgOrderStore::new(db))
        }
        None => {
            tracing::warn!("DATABASE_URL not set; orders are kept in memory only");
            Arc::new(MemoryOrderStore::new())
        }
    };
    let orders = OrderManager::new(store).with_policy(config.transition_policy);
    let app = api::router(AppState { orders });

    tracing::info!(policy = ?config.transition_policy, "🚀 Order service listening on 0.0.0.0:{}", config.port);
    axum::serve(tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?, app).await?;
    Ok(())
}
