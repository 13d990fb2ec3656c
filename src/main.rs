use anyhow::Context;
use cookie::Key;
use revisits::{app, Config, RedisVisits, VisitCounter};
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config = Config::from_env()?;

    let counter = match RedisVisits::connect(&config.redis_url()).await {
        Ok(store) => {
            tracing::info!(
                "connected to redis at {}:{}",
                config.redis_host,
                config.redis_port
            );
            VisitCounter::store_backed(Arc::new(store))
        }
        Err(err) => {
            tracing::warn!("could not connect to redis, counting in memory only: {err}");
            VisitCounter::fallback_only()
        }
    };

    let app = app(Arc::new(counter), Key::generate());

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("fail to bind {}", config.bind_addr))?;
    tracing::info!("listening on {}", config.bind_addr);
    axum::serve(listener, app.into_make_service())
        .await
        .context("server error")?;

    Ok(())
}
