use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::NaiveDate;
use tower::ServiceExt;

use terminbot::config::{AppConfig, CluConfig};
use terminbot::db::{self, queries};
use terminbot::handlers;
use terminbot::models::{Intent, Lang, NluMode};
use terminbot::services::conversation::{process_message, TurnReply};
use terminbot::services::datetime::{to_iso_time, Clock, FixedClock};
use terminbot::services::i18n;
use terminbot::services::nlu::{IntentRecognizer, Recognizers};
use terminbot::services::session::SessionStore;
use terminbot::state::AppState;

// ── Helpers ──

fn test_config() -> AppConfig {
    AppConfig {
        port: 3978,
        database_url: ":memory:".to_string(),
        default_language: "hr".to_string(),
        default_nlu_mode: "local".to_string(),
        clu: CluConfig::default(),
        admin_seed_username: String::new(),
        admin_seed_password: String::new(),
    }
}

fn test_state() -> Arc<AppState> {
    let config = test_config();
    let conn = db::init_db(":memory:").unwrap();
    // A Wednesday.
    let clock: Arc<dyn Clock> = Arc::new(FixedClock(NaiveDate::from_ymd_opt(2025, 9, 17).unwrap()));
    Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        recognizers: Recognizers::new(config.clu.clone(), clock.clone()),
        sessions: SessionStore::new(Lang::Hr, NluMode::Local),
        clock,
        config,
    })
}

async fn say(state: &Arc<AppState>, user: &str, text: &str) -> TurnReply {
    process_message(state, user, text, None).await.unwrap()
}

/// Books through the full dialog and returns the booking code.
async fn book(state: &Arc<AppState>, user: &str, text: &str) -> String {
    let summary = say(state, user, text).await;
    assert!(
        summary.messages.last().unwrap().starts_with("Molim potvrdi rezervaciju"),
        "{:?}",
        summary.messages
    );

    let done = say(state, user, "da").await;
    assert_eq!(done.messages.len(), 2, "{:?}", done.messages);
    done.messages[0].lines().next().unwrap().trim().to_string()
}

fn chat_request(body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/webchat/send")
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(res: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

// ── Booking ──

#[tokio::test]
async fn test_full_booking_from_one_message() {
    let state = test_state();

    let code = book(&state, "u1", "rezerviraj 17.09. u 14:00 na Ivan, IT, 091234567").await;
    assert_eq!(code.len(), 9);

    let conn = state.db.lock().unwrap();
    let appt = queries::find_by_code(&conn, &code).unwrap().unwrap();
    assert_eq!(appt.user_id, "u1");
    assert_eq!(appt.user_name.as_deref(), Some("Ivan"));
    assert_eq!(appt.contact.as_deref(), Some("091234567"));
    assert_eq!(appt.service_type.as_deref(), Some("it"));
    assert_eq!(appt.day_iso, "2025-09-17");
    assert_eq!(appt.time_iso, "14:00");
    assert!(queries::load_dialog(&conn, "u1").unwrap().is_none());
}

#[tokio::test]
async fn test_booking_confirmation_text() {
    let state = test_state();
    say(&state, "u1", "rezerviraj 17.09. u 14:00 na Ivan, IT, 091234567").await;

    let done = say(&state, "u1", "da").await;
    assert!(done.messages[1].starts_with("Rezervacija potvrđena za 17.09. u 14:00 na ime Ivan."));
    assert!(done.messages[1].contains("Kontakt: 091234567"));
}

#[tokio::test]
async fn test_dialog_collects_missing_slots() {
    let state = test_state();

    let reply = say(&state, "u1", "rezerviraj").await;
    assert!(reply.messages[0].starts_with("Koji tip problema imate?"));

    let reply = say(&state, "u1", "vodoinstalater").await;
    assert_eq!(reply.messages, vec![i18n::text(Lang::Hr, "prompt_date")]);

    let reply = say(&state, "u1", "18.09.").await;
    assert_eq!(reply.messages, vec![i18n::text(Lang::Hr, "prompt_time")]);

    let reply = say(&state, "u1", "9:30").await;
    assert_eq!(reply.messages, vec![i18n::text(Lang::Hr, "prompt_name")]);

    let reply = say(&state, "u1", "Marko").await;
    assert_eq!(reply.messages, vec![i18n::text(Lang::Hr, "prompt_contact")]);

    let reply = say(&state, "u1", "marko@example.com").await;
    assert!(reply.messages[0].starts_with("Molim potvrdi rezervaciju"));

    let reply = say(&state, "u1", "da").await;
    assert_eq!(reply.messages.len(), 2);

    let conn = state.db.lock().unwrap();
    let appts = queries::list_for_user(&conn, "u1").unwrap();
    assert_eq!(appts.len(), 1);
    assert_eq!(appts[0].service_type.as_deref(), Some("vodo"));
    assert_eq!(appts[0].time_iso, "09:30");
}

#[tokio::test]
async fn test_declined_summary_saves_nothing() {
    let state = test_state();
    say(&state, "u1", "rezerviraj 17.09. u 14:00 na Ivan, IT, 091234567").await;

    let reply = say(&state, "u1", "ne").await;
    assert_eq!(reply.messages, vec![i18n::text(Lang::Hr, "aborted")]);

    let conn = state.db.lock().unwrap();
    assert!(queries::list_for_user(&conn, "u1").unwrap().is_empty());
}

#[test]
fn test_hour_out_of_range_is_rejected() {
    assert_eq!(to_iso_time("25:00"), None);
    assert_eq!(to_iso_time("14:00").as_deref(), Some("14:00"));
}

#[tokio::test]
async fn test_sunday_booking_is_rejected() {
    let state = test_state();

    // 21.09.2025 is a Sunday.
    let reply = say(&state, "u1", "rezerviraj 21.09. u 08:00 na Ivan, IT, 091234567").await;
    assert_eq!(
        reply.messages.last().unwrap(),
        &i18n::text(Lang::Hr, "confirm_closed_day")
    );

    let conn = state.db.lock().unwrap();
    assert!(queries::list_for_user(&conn, "u1").unwrap().is_empty());
    assert!(queries::load_dialog(&conn, "u1").unwrap().is_none());
}

#[tokio::test]
async fn test_slot_capacity_is_two() {
    let state = test_state();

    book(&state, "u1", "rezerviraj 17.09. u 14:00 na Ana, IT, 091234561").await;
    book(&state, "u2", "rezerviraj 17.09. u 14:00 na Ivo, IT, 091234562").await;

    let reply = say(&state, "u3", "rezerviraj 17.09. u 14:00 na Eva, IT, 091234563").await;
    assert_eq!(
        reply.messages.last().unwrap(),
        "Nažalost, slot 17.09. u 14:00 je popunjen (max 2). Odaberite drugi termin."
    );

    let conn = state.db.lock().unwrap();
    assert_eq!(queries::count_in_slot(&conn, "2025-09-17", "14:00", None).unwrap(), 2);
}

// ── Cancel and change by code ──

#[tokio::test]
async fn test_cancel_by_code_confirm_and_decline() {
    let state = test_state();
    let code = book(&state, "u1", "rezerviraj 17.09. u 14:00 na Ivan, IT, 091234567").await;

    let spaced = code.to_lowercase().replace('-', "");
    let reply = say(&state, "u1", &format!("otkaži rezervaciju {spaced}")).await;
    assert!(reply.messages[0].contains("17.09. u 14:00"));

    let reply = say(&state, "u1", "ne").await;
    assert_eq!(reply.messages, vec![i18n::text(Lang::Hr, "aborted")]);
    {
        let conn = state.db.lock().unwrap();
        assert!(queries::find_by_code(&conn, &code).unwrap().is_some());
    }

    say(&state, "u1", &format!("otkaži rezervaciju {code}")).await;
    let reply = say(&state, "u1", "da").await;
    assert_eq!(
        reply.messages,
        vec!["Rezervacija za 17.09. u 14:00 je otkazana.".to_string()]
    );

    let conn = state.db.lock().unwrap();
    assert!(queries::find_by_code(&conn, &code).unwrap().is_none());
}

#[tokio::test]
async fn test_change_by_code_into_full_slot_is_refused() {
    let state = test_state();
    book(&state, "u1", "rezerviraj 18.09. u 10:00 na Ana, IT, 091234561").await;
    book(&state, "u2", "rezerviraj 18.09. u 10:00 na Ivo, IT, 091234562").await;
    let code = book(&state, "u3", "rezerviraj 18.09. u 12:00 na Eva, IT, 091234563").await;

    say(&state, "u3", &format!("change booking {code} to 18.09. at 10:00")).await;
    let reply = say(&state, "u3", "yes").await;
    assert!(reply.messages[0].contains("popunjen"), "{:?}", reply.messages);

    let conn = state.db.lock().unwrap();
    let appt = queries::find_by_code(&conn, &code).unwrap().unwrap();
    assert_eq!(appt.time_iso, "12:00");
}

// ── Recognizers ──

#[tokio::test]
async fn test_unconfigured_cloud_returns_none() {
    let state = test_state();
    let result = state
        .recognizers
        .cloud
        .recognize("rezerviraj 17.09. u 14:00", Lang::Hr)
        .await;
    assert_eq!(result.intent, Intent::None);
    assert_eq!(result.confidence, 0.0);
}

#[tokio::test]
async fn test_cloud_mode_without_config_still_books() {
    let state = test_state();
    say(&state, "u1", "nlu: clu").await;
    assert_eq!(state.sessions.mode("u1"), NluMode::Clu);

    let reply = say(&state, "u1", "rezerviraj 17.09. u 14:00 na Ivan, IT, 091234567").await;
    assert!(reply.messages.last().unwrap().starts_with("Molim potvrdi rezervaciju"));
}

// ── HTTP ──

#[tokio::test]
async fn test_health() {
    let app = handlers::router(test_state());
    let res = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&body[..], b"ok");
}

#[tokio::test]
async fn test_webchat_blank_text_is_bad_request() {
    let app = handlers::router(test_state());
    let res = app
        .oneshot(chat_request(serde_json::json!({ "userId": "u1", "text": "   " })))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_webchat_menu_with_locale() {
    let state = test_state();
    let app = handlers::router(state.clone());
    let res = app
        .oneshot(chat_request(serde_json::json!({
            "conversationId": "abcdef1234567890",
            "locale": "en-US",
            "text": "hello there"
        })))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let json = json_body(res).await;
    assert_eq!(json["conversationId"], "abcdef1234567890");
    assert_eq!(json["replies"][0], i18n::text(Lang::En, "menu_prompt"));
    assert_eq!(json["actions"].as_array().unwrap().len(), 4);
    assert_eq!(json["actions"][0]["title"], i18n::text(Lang::En, "action_book"));
    assert_eq!(state.sessions.lang("web-abcdef12"), Lang::En);
}

#[tokio::test]
async fn test_webchat_generates_conversation_id() {
    let app = handlers::router(test_state());
    let res = app
        .oneshot(chat_request(serde_json::json!({ "text": "usluge" })))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let json = json_body(res).await;
    let id = json["conversationId"].as_str().unwrap();
    assert_eq!(id.len(), 32);
    assert!(json["replies"][0].as_str().unwrap().starts_with("Dostupne usluge:"));
}
