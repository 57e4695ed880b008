pub mod health;
pub mod webchat;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/webchat/send", post(webchat::send))
        .with_state(state)
}
