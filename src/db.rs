use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;
use tracing::{info, warn};

const RETRY_INTERVAL: Duration = Duration::from_secs(1);

/// Block until the database accepts connections, retrying on a fixed interval.
pub async fn connect_waiting(database_url: &str) -> anyhow::Result<PgPool> {
    info!("waiting for database...");
    loop {
        match PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
        {
            Ok(pool) => {
                info!("database available");
                return Ok(pool);
            }
            Err(e) => {
                warn!(error = %e, "database unavailable, waiting 1 second");
                tokio::time::sleep(RETRY_INTERVAL).await;
            }
        }
    }
}

pub async fn run_migrations(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("run migrations")
}
