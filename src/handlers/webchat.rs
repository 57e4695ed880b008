use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::services::conversation::{self, SuggestedAction};
use crate::services::i18n;
use crate::state::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebChatRequest {
    pub conversation_id: Option<String>,
    pub user_id: Option<String>,
    pub locale: Option<String>,
    #[serde(default)]
    pub text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebChatResponse {
    pub conversation_id: String,
    pub replies: Vec<String>,
    pub actions: Vec<SuggestedAction>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub async fn send(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<WebChatRequest>,
) -> Result<Json<WebChatResponse>, AppError> {
    let text = payload.text.trim();
    if text.is_empty() {
        return Err(AppError::BadRequest("text must not be empty".to_string()));
    }

    let conversation_id = non_blank(payload.conversation_id)
        .unwrap_or_else(|| uuid::Uuid::new_v4().simple().to_string());
    let user_id = non_blank(payload.user_id).unwrap_or_else(|| {
        let short: String = conversation_id.chars().take(8).collect();
        format!("web-{short}")
    });

    tracing::info!(conversation_id = %conversation_id, user_id = %user_id, "incoming web chat message");

    let reply = match conversation::process_message(&state, &user_id, text, payload.locale.as_deref()).await {
        Ok(reply) => reply,
        Err(e) => {
            tracing::error!(user_id = %user_id, error = %e, "failed to process message");
            let lang = state.sessions.lang(&user_id);
            conversation::TurnReply {
                messages: vec![i18n::text(lang, "generic_error")],
                actions: vec![],
            }
        }
    };

    Ok(Json(WebChatResponse {
        conversation_id,
        replies: reply.messages,
        actions: reply.actions,
    }))
}
