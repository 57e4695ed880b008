use std::sync::{Arc, LazyLock};

use regex::Regex;
use rusqlite::Connection;
use serde::Serialize;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{
    Appointment, DialogSession, Intent, IntentResult, Lang, NluMode, PendingAction, PendingKind,
    ReservationState,
};
use crate::services::admin::{self, check_calendar, AdminContext};
use crate::services::booking_code::normalize_code;
use crate::services::business_rules::{localize_service, service_list, MAX_PER_SLOT};
use crate::services::datetime::{pretty_date, reference_year, to_iso_date, to_iso_time};
use crate::services::dialog::{is_no, is_yes, DialogTurn, ReservationDialog};
use crate::services::i18n;
use crate::services::password::verify_password;
use crate::services::scheduling::check_slot_conflicts;
use crate::state::AppState;

static CANCEL_BY_CODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(otkaži\s+(rezervaciju|booking)|cancel\s+(reservation|booking))\s+([a-z0-9\-–—\u{2011}]{6,20})$")
        .expect("valid cancel regex")
});
static CHANGE_BY_CODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(promijeni\s+(rezervaciju|booking)|change\s+(reservation|booking))\s+[a-z0-9\-–—\u{2011}]{6,20}\s+")
        .expect("valid change regex")
});
static CHANGE_ARGS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:promijeni\s+(?:rezervaciju|booking)|change\s+(?:reservation|booking))\s+([a-z0-9\-–—\u{2011}]{6,20})\s+(?:u|to)\s+(.+)$")
        .expect("valid change args regex")
});
static TAIL_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{1,2}[./-]\d{1,2}\.?)").expect("valid date regex"));
static TAIL_TIME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{1,2}:\d{1,2})\b").expect("valid time regex"));
static LEGACY_CHANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^promijeni\s+rezervaciju\s+za\s+(\S+)\s+u\s+(\S+)\s+u\s+(\S+)(?:\s+u\s+(\S+))?$")
        .expect("valid legacy change regex")
});
static LEGACY_CANCEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^otkaži\s+rezervaciju\s+za\s+(\S+)\s+u\s+(\S+)$").expect("valid legacy cancel regex")
});

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SuggestedAction {
    pub title: String,
    pub value: String,
}

/// Everything the bot says back for one inbound message.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TurnReply {
    pub messages: Vec<String>,
    pub actions: Vec<SuggestedAction>,
}

impl TurnReply {
    fn text(message: String) -> Self {
        Self {
            messages: vec![message],
            actions: vec![],
        }
    }

    fn lines(messages: Vec<String>) -> Self {
        Self {
            messages,
            actions: vec![],
        }
    }
}

impl From<DialogTurn> for TurnReply {
    fn from(turn: DialogTurn) -> Self {
        TurnReply::lines(turn.messages)
    }
}

/// What a route sees of the current message and the user's state.
struct Turn<'a> {
    state: &'a AppState,
    conn: &'a Connection,
    user_id: &'a str,
    text: &'a str,
    lower: String,
    lang: Lang,
    is_admin: bool,
    pending: Option<PendingAction>,
    dialog: Option<DialogSession>,
    nlu: Option<IntentResult>,
}

impl<'a> Turn<'a> {
    fn load(
        state: &'a AppState,
        conn: &'a Connection,
        user_id: &'a str,
        text: &'a str,
        nlu: Option<IntentResult>,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            state,
            conn,
            user_id,
            text,
            lower: text.to_lowercase(),
            lang: state.sessions.lang(user_id),
            is_admin: state.sessions.is_admin(user_id),
            pending: state.sessions.pending(user_id),
            dialog: queries::load_dialog(conn, user_id)?,
            nlu,
        })
    }

    fn t(&self, key: &str) -> String {
        i18n::text(self.lang, key)
    }

    fn intent(&self) -> Intent {
        self.nlu.as_ref().map(|r| r.intent).unwrap_or(Intent::None)
    }

    fn reservation_dialog(&self) -> ReservationDialog<'_> {
        ReservationDialog::new(self.conn, self.state.clock.as_ref(), self.user_id, self.lang)
    }

    fn year(&self) -> i32 {
        reference_year(self.state.clock.as_ref())
    }
}

struct Route {
    name: &'static str,
    matches: fn(&Turn) -> bool,
    run: fn(&Turn) -> anyhow::Result<TurnReply>,
}

// Both tables are evaluated top to bottom; first match wins. The first runs
// before intent recognition, the second after it.
const BEFORE_NLU: &[Route] = &[
    Route { name: "pending_confirmation", matches: |t| t.pending.is_some(), run: pending_confirmation },
    Route { name: "reset", matches: |t| matches!(t.lower.as_str(), "cancel" | "prekini"), run: reset },
    Route { name: "admin_login", matches: |t| t.lower.starts_with("admin login"), run: admin_login },
    Route { name: "admin_logout", matches: |t| t.lower == "admin logout", run: admin_logout },
    Route { name: "dialog", matches: |t| t.dialog.is_some(), run: resume_dialog },
    Route { name: "nlu_mode", matches: |t| t.lower.starts_with("nlu:"), run: set_nlu_mode },
    Route { name: "language", matches: |t| t.lower.starts_with("language:"), run: set_language },
    Route { name: "nlu_status", matches: |t| matches!(t.lower.as_str(), "nlu?" | "nlu status"), run: nlu_status },
];

const AFTER_NLU: &[Route] = &[
    Route { name: "book", matches: |t| t.intent() == Intent::BookAppointment, run: book_from_intent },
    Route { name: "show_by_date", matches: has_date_to_show, run: show_by_date },
    Route { name: "show_all", matches: |t| t.intent() == Intent::ShowAll, run: show_all },
    Route { name: "help", matches: |t| matches!(t.lower.as_str(), "help" | "pomoć" | "menu" | "izbornik"), run: help },
    Route { name: "intro", matches: |t| t.lower == "/help", run: intro },
    Route {
        name: "services",
        matches: |t| matches!(t.lower.as_str(), "usluge" | "services" | "service list" | "lista usluga"),
        run: services,
    },
    Route {
        name: "last",
        matches: |t| matches!(t.lower.as_str(), "moje zadnje" | "zadnja rezervacija" | "my last"),
        run: last_reservation,
    },
    Route { name: "admin", matches: |t| t.is_admin && t.lower.starts_with("admin "), run: admin_command },
    Route { name: "cancel_by_code", matches: |t| CANCEL_BY_CODE.is_match(&t.lower), run: cancel_by_code },
    Route { name: "change_by_code", matches: |t| CHANGE_BY_CODE.is_match(&t.lower), run: change_by_code },
    Route { name: "show_phrase", matches: |t| t.lower.contains("prikaži rezervacije"), run: show_all },
    Route { name: "check_slot", matches: has_slot_to_check, run: check_slot },
    Route {
        name: "legacy_change",
        matches: |t| t.lower.starts_with("promijeni rezervaciju za"),
        run: legacy_change,
    },
    Route {
        name: "legacy_cancel",
        matches: |t| t.lower.starts_with("otkaži rezervaciju za"),
        run: legacy_cancel,
    },
    Route {
        name: "book_phrase",
        matches: |t| t.lower.starts_with("rezerviraj") || t.lower.starts_with("book"),
        run: book_unseeded,
    },
];

fn first_match<'r>(routes: &'r [Route], turn: &Turn) -> Option<&'r Route> {
    routes.iter().find(|r| (r.matches)(turn))
}

fn lock_db(state: &AppState) -> anyhow::Result<std::sync::MutexGuard<'_, Connection>> {
    state
        .db
        .lock()
        .map_err(|_| anyhow::anyhow!("database lock poisoned"))
}

/// Routes one inbound message. `locale` only seeds the user's language when
/// nothing is stored for them yet.
pub async fn process_message(
    state: &Arc<AppState>,
    user_id: &str,
    text: &str,
    locale: Option<&str>,
) -> anyhow::Result<TurnReply> {
    let text = text.trim();

    if let Some(locale) = locale.filter(|l| !l.trim().is_empty()) {
        if !state.sessions.has_lang(user_id) {
            state.sessions.set_lang(user_id, Lang::parse(locale));
        }
    }

    {
        let conn = lock_db(state)?;
        let turn = Turn::load(state, &conn, user_id, text, None)?;
        if let Some(route) = first_match(BEFORE_NLU, &turn) {
            tracing::info!(user_id = %user_id, route = route.name, "routing message");
            return (route.run)(&turn);
        }
    }

    let mode = state.sessions.mode(user_id);
    let lang = state.sessions.lang(user_id);
    let nlu = state.recognizers.recognize(mode, text, lang).await;
    tracing::info!(
        user_id = %user_id,
        mode = mode.as_str(),
        lang = lang.as_str(),
        intent = nlu.intent.as_str(),
        confidence = nlu.confidence,
        "recognized intent"
    );

    let conn = lock_db(state)?;
    let turn = Turn::load(state, &conn, user_id, text, Some(nlu))?;
    match first_match(AFTER_NLU, &turn) {
        Some(route) => {
            tracing::info!(user_id = %user_id, route = route.name, "routing message");
            (route.run)(&turn)
        }
        None => Ok(menu(turn.lang)),
    }
}

/// The fallback reply: a prompt plus the four main actions.
pub fn menu(lang: Lang) -> TurnReply {
    let action = |key: &str| SuggestedAction {
        title: i18n::text(lang, key),
        value: i18n::text(lang, &format!("{key}_value")),
    };
    TurnReply {
        messages: vec![i18n::text(lang, "menu_prompt")],
        actions: vec![
            action("action_book"),
            action("action_show"),
            action("action_services"),
            action("action_help"),
        ],
    }
}

fn user_line(lang: Lang, appt: &Appointment) -> String {
    let service = appt
        .service_type
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(|s| format!(" ({})", localize_service(s, lang)))
        .unwrap_or_default();

    i18n::format(
        lang,
        "list_line",
        &[
            &pretty_date(&appt.day_iso),
            &appt.time_iso,
            &appt.user_name.as_deref().unwrap_or_default(),
            &service,
            &appt.booking_code,
        ],
    )
}

fn is_conflict(err: &anyhow::Error) -> bool {
    matches!(err.downcast_ref::<AppError>(), Some(AppError::Conflict(_)))
}

// ── Before recognition ──

fn pending_confirmation(t: &Turn) -> anyhow::Result<TurnReply> {
    if is_no(t.text) {
        t.state.sessions.take_pending(t.user_id);
        return Ok(TurnReply::text(t.t("aborted")));
    }
    if !is_yes(t.text) {
        return Ok(TurnReply::text(t.t("pending_yes_no")));
    }
    let Some(action) = t.state.sessions.take_pending(t.user_id) else {
        return Ok(menu(t.lang));
    };

    let Some(appt) = queries::find_by_code(t.conn, &action.code)? else {
        return Ok(TurnReply::text(t.t("code_not_found")));
    };

    match action.kind {
        PendingKind::Cancel => {
            queries::delete_appointment(t.conn, appt.id)?;
            tracing::info!(user_id = %t.user_id, code = %appt.booking_code, "appointment cancelled");
            Ok(TurnReply::text(i18n::format(
                t.lang,
                "cancelled",
                &[&pretty_date(&appt.day_iso), &appt.time_iso],
            )))
        }
        PendingKind::Change => {
            let (Some(day_iso), Some(time_iso)) = (action.new_day_iso, action.new_time_iso) else {
                return Ok(TurnReply::text(t.t("change_parse_failed")));
            };
            move_appointment(t, &appt, &day_iso, &time_iso)
        }
    }
}

/// Re-checks the target slot, then moves `appt` there.
fn move_appointment(
    t: &Turn,
    appt: &Appointment,
    day_iso: &str,
    time_iso: &str,
) -> anyhow::Result<TurnReply> {
    if let Some(msg) = check_calendar(t.lang, day_iso, time_iso) {
        return Ok(TurnReply::text(msg));
    }
    let service = appt.service_type.as_deref();
    if let Some(conflict) =
        check_slot_conflicts(t.conn, &appt.user_id, day_iso, time_iso, service, Some(appt.id))?
    {
        return Ok(TurnReply::text(conflict.message(t.lang, day_iso, time_iso, service)));
    }

    match queries::update_appointment_slot(t.conn, appt.id, day_iso, time_iso) {
        Ok(_) => {
            tracing::info!(
                user_id = %t.user_id,
                code = %appt.booking_code,
                day = %day_iso,
                time = %time_iso,
                "appointment moved"
            );
            Ok(TurnReply::text(i18n::format(
                t.lang,
                "changed_to",
                &[&pretty_date(day_iso), &time_iso],
            )))
        }
        Err(e) if is_conflict(&e) => Ok(TurnReply::text(t.t("slot_just_taken"))),
        Err(e) => Err(e),
    }
}

fn reset(t: &Turn) -> anyhow::Result<TurnReply> {
    queries::clear_dialog(t.conn, t.user_id)?;
    Ok(TurnReply::text(t.t("conversation_reset")))
}

fn admin_login(t: &Turn) -> anyhow::Result<TurnReply> {
    let parts: Vec<&str> = t.text.split_whitespace().collect();
    if parts.len() < 4 {
        return Ok(TurnReply::text(t.t("admin_login_usage")));
    }
    let username = parts[2];
    let password = parts[3..].join(" ");

    let verified = queries::get_admin_by_username(t.conn, username)?
        .is_some_and(|admin| verify_password(&password, &admin.password_hash));
    if !verified {
        tracing::warn!(user_id = %t.user_id, username = %username, "admin login failed");
        return Ok(TurnReply::text(t.t("admin_login_failed")));
    }

    t.state.sessions.login_admin(t.user_id, username);
    tracing::info!(user_id = %t.user_id, username = %username, "admin logged in");
    Ok(TurnReply::text(t.t("admin_login_ok")))
}

fn admin_logout(t: &Turn) -> anyhow::Result<TurnReply> {
    t.state.sessions.logout_admin(t.user_id);
    Ok(TurnReply::text(t.t("admin_logout")))
}

fn resume_dialog(t: &Turn) -> anyhow::Result<TurnReply> {
    let Some(session) = t.dialog.clone() else {
        return Ok(menu(t.lang));
    };
    Ok(t.reservation_dialog().resume(session, t.text)?.into())
}

fn set_nlu_mode(t: &Turn) -> anyhow::Result<TurnReply> {
    let (mode, key) = if t.lower.contains("clu") {
        (NluMode::Clu, "nlu_set_clu")
    } else if t.lower.contains("local") {
        (NluMode::Local, "nlu_set_local")
    } else {
        (NluMode::Regex, "nlu_set_regex")
    };
    t.state.sessions.set_mode(t.user_id, mode);
    Ok(TurnReply::text(t.t(key)))
}

fn set_language(t: &Turn) -> anyhow::Result<TurnReply> {
    let value = t.lower.trim_start_matches("language:");
    let lang = if value.contains("en") { Lang::En } else { Lang::Hr };
    t.state.sessions.set_lang(t.user_id, lang);
    Ok(TurnReply::text(i18n::text(lang, "lang_set")))
}

fn nlu_status(t: &Turn) -> anyhow::Result<TurnReply> {
    let key = match t.state.sessions.mode(t.user_id) {
        NluMode::Clu => "nlu_is_clu",
        NluMode::Local => "nlu_is_local",
        NluMode::Regex => "nlu_is_regex",
    };
    Ok(TurnReply::text(t.t(key)))
}

// ── After recognition ──

fn book_from_intent(t: &Turn) -> anyhow::Result<TurnReply> {
    let seed = t
        .nlu
        .as_ref()
        .map(|r| ReservationState::from(&r.entities))
        .unwrap_or_default();
    Ok(t.reservation_dialog().begin(seed)?.into())
}

fn book_unseeded(t: &Turn) -> anyhow::Result<TurnReply> {
    Ok(t.reservation_dialog().begin(ReservationState::default())?.into())
}

fn has_date_to_show(t: &Turn) -> bool {
    t.intent() == Intent::ShowByDate
        && t
            .nlu
            .as_ref()
            .and_then(|r| r.entities.date.as_deref())
            .is_some_and(|d| !d.trim().is_empty())
}

fn show_by_date(t: &Turn) -> anyhow::Result<TurnReply> {
    let date = t
        .nlu
        .as_ref()
        .and_then(|r| r.entities.date.as_deref())
        .unwrap_or_default();
    let Some(day_iso) = to_iso_date(date, t.year()) else {
        return Ok(TurnReply::text(t.t("unknown_date")));
    };

    let appts = queries::list_for_user_on_day(t.conn, t.user_id, &day_iso)?;
    if appts.is_empty() {
        return Ok(TurnReply::text(i18n::format(
            t.lang,
            "no_reservations_for_day",
            &[&pretty_date(&day_iso)],
        )));
    }
    Ok(TurnReply::lines(appts.iter().map(|a| user_line(t.lang, a)).collect()))
}

fn show_all(t: &Turn) -> anyhow::Result<TurnReply> {
    let appts = queries::list_for_user(t.conn, t.user_id)?;
    if appts.is_empty() {
        return Ok(TurnReply::text(t.t("no_reservations")));
    }
    Ok(TurnReply::lines(appts.iter().map(|a| user_line(t.lang, a)).collect()))
}

fn help(t: &Turn) -> anyhow::Result<TurnReply> {
    Ok(TurnReply::text(t.t("help")))
}

fn intro(t: &Turn) -> anyhow::Result<TurnReply> {
    let mut reply = menu(t.lang);
    reply.messages.insert(0, t.t("intro"));
    Ok(reply)
}

fn services(t: &Turn) -> anyhow::Result<TurnReply> {
    Ok(TurnReply::text(i18n::format(
        t.lang,
        "services_list",
        &[&service_list(t.lang)],
    )))
}

fn last_reservation(t: &Turn) -> anyhow::Result<TurnReply> {
    match queries::last_for_user(t.conn, t.user_id)? {
        Some(appt) => Ok(TurnReply::text(user_line(t.lang, &appt))),
        None => Ok(TurnReply::text(t.t("no_reservations"))),
    }
}

fn admin_command(t: &Turn) -> anyhow::Result<TurnReply> {
    let ctx = AdminContext {
        conn: t.conn,
        clock: t.state.clock.as_ref(),
        lang: t.lang,
    };
    Ok(admin::dispatch(&ctx, t.text)?
        .map(TurnReply::lines)
        .unwrap_or_else(|| menu(t.lang)))
}

fn cancel_by_code(t: &Turn) -> anyhow::Result<TurnReply> {
    let code = t.text.split_whitespace().last().unwrap_or_default();
    if normalize_code(code).is_empty() {
        return Ok(TurnReply::text(t.t("cancel_code_missing")));
    }
    let Some(appt) = queries::find_by_code(t.conn, code)? else {
        return Ok(TurnReply::text(t.t("code_not_found")));
    };

    t.state.sessions.set_pending(
        t.user_id,
        PendingAction {
            kind: PendingKind::Cancel,
            code: code.to_string(),
            new_day_iso: None,
            new_time_iso: None,
        },
    );
    Ok(TurnReply::text(i18n::format(
        t.lang,
        "cancel_confirm_prompt",
        &[&pretty_date(&appt.day_iso), &appt.time_iso],
    )))
}

/// Reads `<day> ... <time>` out of the tail of a change request. The day is
/// the first date-like token; the time is the last `H:mm` after `-`/`h`
/// separators are turned into colons.
fn parse_change_tail(tail: &str, year: i32) -> Option<(String, String)> {
    let date = TAIL_DATE.captures(tail)?.get(1)?.as_str();
    let day_iso = to_iso_date(date, year)?;

    let colons = tail.replace(['-', 'h', 'H'], ":");
    let time = TAIL_TIME
        .captures_iter(&colons)
        .last()?
        .get(1)?
        .as_str()
        .to_string();
    let time_iso = to_iso_time(&time)?;
    Some((day_iso, time_iso))
}

fn change_by_code(t: &Turn) -> anyhow::Result<TurnReply> {
    let Some(caps) = CHANGE_ARGS.captures(t.text) else {
        return Ok(TurnReply::text(t.t("change_usage")));
    };
    let code = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
    let tail = caps.get(2).map(|m| m.as_str()).unwrap_or_default();

    let Some((day_iso, time_iso)) = parse_change_tail(tail, t.year()) else {
        return Ok(TurnReply::text(t.t("change_parse_failed")));
    };
    if let Some(msg) = check_calendar(t.lang, &day_iso, &time_iso) {
        return Ok(TurnReply::text(msg));
    }
    if queries::find_by_code(t.conn, code)?.is_none() {
        return Ok(TurnReply::text(t.t("code_not_found")));
    }

    let reply = i18n::format(
        t.lang,
        "change_confirm_prompt",
        &[&code, &pretty_date(&day_iso), &time_iso],
    );
    t.state.sessions.set_pending(
        t.user_id,
        PendingAction {
            kind: PendingKind::Change,
            code: code.to_string(),
            new_day_iso: Some(day_iso),
            new_time_iso: Some(time_iso),
        },
    );
    Ok(TurnReply::text(reply))
}

fn has_slot_to_check(t: &Turn) -> bool {
    t.intent() == Intent::CheckSlot
        && t.nlu.as_ref().is_some_and(|r| {
            r.entities.date.as_deref().is_some_and(|d| !d.trim().is_empty())
                && r.entities.time.as_deref().is_some_and(|d| !d.trim().is_empty())
        })
}

fn check_slot(t: &Turn) -> anyhow::Result<TurnReply> {
    let entities = t.nlu.as_ref().map(|r| r.entities.clone()).unwrap_or_default();
    let day_iso = entities.date.as_deref().and_then(|d| to_iso_date(d, t.year()));
    let time_iso = entities.time.as_deref().and_then(to_iso_time);
    let (Some(day_iso), Some(time_iso)) = (day_iso, time_iso) else {
        return Ok(TurnReply::text(t.t("slot_check_bad")));
    };

    let taken = queries::count_in_slot(t.conn, &day_iso, &time_iso, None)?;
    let key = if taken >= MAX_PER_SLOT {
        "slot_check_full"
    } else {
        "slot_check_free"
    };
    Ok(TurnReply::text(i18n::format(
        t.lang,
        key,
        &[&pretty_date(&day_iso), &time_iso, &taken, &MAX_PER_SLOT],
    )))
}

/// `promijeni rezervaciju za <day> u <time> u <new day> [u <new time>]`,
/// applied without a confirmation step. The time is kept when no new one is
/// given.
fn legacy_change(t: &Turn) -> anyhow::Result<TurnReply> {
    let Some(caps) = LEGACY_CHANGE.captures(&t.lower) else {
        return Ok(TurnReply::text(t.t("change_usage")));
    };
    let group = |i: usize| caps.get(i).map(|m| m.as_str());
    let year = t.year();

    let old_day = group(1).and_then(|d| to_iso_date(d, year));
    let old_time = group(2).and_then(to_iso_time);
    let new_day = group(3).and_then(|d| to_iso_date(d, year));
    let (Some(old_day), Some(old_time), Some(new_day)) = (old_day, old_time, new_day) else {
        return Ok(TurnReply::text(t.t("change_parse_failed")));
    };
    let new_time = match group(4) {
        Some(raw) => match to_iso_time(raw) {
            Some(time) => time,
            None => return Ok(TurnReply::text(t.t("change_parse_failed"))),
        },
        None => old_time.clone(),
    };

    match queries::find_for_user_slot(t.conn, t.user_id, &old_day, &old_time)? {
        Some(appt) => move_appointment(t, &appt, &new_day, &new_time),
        None => Ok(TurnReply::text(t.t("no_reservations"))),
    }
}

/// `otkaži rezervaciju za <day> u <time>`, applied without confirmation.
fn legacy_cancel(t: &Turn) -> anyhow::Result<TurnReply> {
    let found = match LEGACY_CANCEL.captures(&t.lower) {
        Some(caps) => {
            let year = t.year();
            let day = caps.get(1).and_then(|m| to_iso_date(m.as_str(), year));
            let time = caps.get(2).and_then(|m| to_iso_time(m.as_str()));
            match (day, time) {
                (Some(day), Some(time)) => queries::find_for_user_slot(t.conn, t.user_id, &day, &time)?,
                _ => None,
            }
        }
        None => None,
    };

    let Some(appt) = found else {
        return Ok(TurnReply::text(t.t("no_reservations")));
    };
    queries::delete_appointment(t.conn, appt.id)?;
    tracing::info!(user_id = %t.user_id, code = %appt.booking_code, "appointment cancelled");
    Ok(TurnReply::text(i18n::format(
        t.lang,
        "cancelled",
        &[&pretty_date(&appt.day_iso), &appt.time_iso],
    )))
}
