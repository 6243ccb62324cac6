mod app;
mod attrs;
mod auth;
mod config;
mod db;
mod error;
mod recipes;
mod state;
mod storage;

use crate::auth::repo::User;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "recipebox=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let state = state::AppState::init().await?;

    if let Err(e) = db::run_migrations(&state.db).await {
        tracing::warn!(error = %e, "migrations folder not found or migration failed; continuing");
    }

    if let (Some(email), Some(password)) = (
        state.config.admin_email.clone(),
        state.config.admin_password.clone(),
    ) {
        match User::ensure_superuser(&state.db, &email, &password).await {
            Ok(true) => tracing::info!(%email, "superuser created"),
            Ok(false) => {}
            Err(e) => tracing::warn!(error = %e, "superuser bootstrap failed"),
        }
    }

    let app = app::build_app(state);
    app::serve(app).await
}
