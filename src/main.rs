use std::sync::{Arc, Mutex};

use rusqlite::Connection;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use terminbot::config::AppConfig;
use terminbot::db::{self, queries};
use terminbot::handlers;
use terminbot::models::{Lang, NluMode};
use terminbot::services::datetime::{Clock, SystemClock};
use terminbot::services::nlu::Recognizers;
use terminbot::services::password::hash_password;
use terminbot::services::session::SessionStore;
use terminbot::state::AppState;

fn seed_admin(conn: &Connection, config: &AppConfig) -> anyhow::Result<()> {
    let username = config.admin_seed_username.trim();
    let password = config.admin_seed_password.as_str();
    if username.is_empty() || password.is_empty() {
        return Ok(());
    }
    if queries::get_admin_by_username(conn, username)?.is_some() {
        return Ok(());
    }
    queries::insert_admin(conn, username, &hash_password(password))?;
    tracing::info!(username = %username, "seeded admin user");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let conn = db::init_db(&config.database_url)?;
    seed_admin(&conn, &config)?;

    if config.clu.is_configured() {
        tracing::info!(endpoint = %config.clu.endpoint, "CLU recognizer configured");
    } else {
        tracing::info!("CLU not configured, cloud mode falls back to patterns");
    }

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let state = Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        recognizers: Recognizers::new(config.clu.clone(), clock.clone()),
        sessions: SessionStore::new(
            Lang::parse(&config.default_language),
            NluMode::parse(&config.default_nlu_mode),
        ),
        clock,
        config: config.clone(),
    });

    let app = handlers::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
