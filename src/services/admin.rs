use std::sync::LazyLock;

use regex::Regex;
use rusqlite::Connection;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Appointment, Lang};
use crate::services::business_rules::{hours_display, is_business_day, is_within_business_hours, localize_service, normalize_service};
use crate::services::datetime::{parse_iso_date, parse_iso_time, pretty_date, reference_year, to_iso_date, to_iso_time, Clock};
use crate::services::i18n;
use crate::services::scheduling::check_slot_conflicts;

static DAY_MONTH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{1,2})[.\-/](\d{1,2})\.?\b").expect("valid day regex"));
static CHANGE_ARGS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^([a-z0-9\-–—\u{2011}]{6,20})\s+(\d{1,2}[./-]\d{1,2}\.?)\s+(?:(?:u|at)\s+)?(\d{1,2}[:.h]\d{1,2})$")
        .expect("valid change regex")
});

/// Everything an admin command needs for one turn.
pub struct AdminContext<'a> {
    pub conn: &'a Connection,
    pub clock: &'a dyn Clock,
    pub lang: Lang,
}

type Handler = fn(&AdminContext, &str) -> anyhow::Result<Vec<String>>;

enum Matcher {
    Exact(&'static str),
    Prefix(&'static str),
}

struct AdminCommand {
    matcher: Matcher,
    handler: Handler,
}

// Evaluated top to bottom; first match wins.
const COMMANDS: &[AdminCommand] = &[
    AdminCommand { matcher: Matcher::Exact("admin help"), handler: help },
    AdminCommand { matcher: Matcher::Exact("admin list all"), handler: list_all },
    AdminCommand { matcher: Matcher::Prefix("admin list day"), handler: list_day },
    AdminCommand { matcher: Matcher::Prefix("admin list range"), handler: list_range },
    AdminCommand { matcher: Matcher::Prefix("admin list service"), handler: list_service },
    AdminCommand { matcher: Matcher::Prefix("admin list user"), handler: list_user },
    AdminCommand { matcher: Matcher::Prefix("admin cancel"), handler: cancel },
    AdminCommand { matcher: Matcher::Prefix("admin change"), handler: change },
];

/// Runs the first admin command matching `text`. `None` when nothing
/// matches; the caller has already checked the user is logged in.
pub fn dispatch(ctx: &AdminContext, text: &str) -> anyhow::Result<Option<Vec<String>>> {
    let text = text.trim();
    let lower = text.to_lowercase();

    for cmd in COMMANDS {
        let tail = match cmd.matcher {
            Matcher::Exact(s) if lower == s => "",
            Matcher::Prefix(p) if lower.starts_with(p) => text.get(p.len()..).unwrap_or("").trim(),
            _ => continue,
        };
        return (cmd.handler)(ctx, tail).map(Some);
    }
    Ok(None)
}

pub fn admin_line(lang: Lang, appt: &Appointment) -> String {
    let service = appt
        .service_type
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(|s| format!(" ({})", localize_service(s, lang)))
        .unwrap_or_default();
    let contact = appt
        .contact
        .as_deref()
        .filter(|c| !c.trim().is_empty())
        .map(|c| i18n::format(lang, "contact_suffix", &[&c]))
        .unwrap_or_default();

    i18n::format(
        lang,
        "admin_list_line",
        &[
            &pretty_date(&appt.day_iso),
            &appt.time_iso,
            &appt.user_name.as_deref().unwrap_or_default(),
            &appt.user_id,
            &service,
            &appt.booking_code,
            &contact,
        ],
    )
}

fn lines(ctx: &AdminContext, appts: &[Appointment]) -> Vec<String> {
    appts.iter().map(|a| admin_line(ctx.lang, a)).collect()
}

fn help(ctx: &AdminContext, _tail: &str) -> anyhow::Result<Vec<String>> {
    Ok(vec![i18n::text(ctx.lang, "admin_help")])
}

fn list_all(ctx: &AdminContext, _tail: &str) -> anyhow::Result<Vec<String>> {
    let all = queries::list_all(ctx.conn)?;
    if all.is_empty() {
        return Ok(vec![i18n::text(ctx.lang, "admin_no_reservations")]);
    }
    Ok(lines(ctx, &all))
}

fn list_day(ctx: &AdminContext, tail: &str) -> anyhow::Result<Vec<String>> {
    let Some(day_iso) = to_iso_date(tail, reference_year(ctx.clock)) else {
        return Ok(vec![i18n::text(ctx.lang, "admin_bad_day")]);
    };
    let appts = queries::list_on_day(ctx.conn, &day_iso)?;
    if appts.is_empty() {
        return Ok(vec![i18n::format(
            ctx.lang,
            "admin_no_reservations_for_day",
            &[&pretty_date(&day_iso)],
        )]);
    }
    Ok(lines(ctx, &appts))
}

/// Two day-month pairs in any order, e.g. `17.09.-20.09.` or `20/9 17/9`.
fn list_range(ctx: &AdminContext, tail: &str) -> anyhow::Result<Vec<String>> {
    let year = reference_year(ctx.clock);
    let days: Vec<Option<String>> = DAY_MONTH
        .captures_iter(tail)
        .take(2)
        .map(|c| to_iso_date(&format!("{}.{}.", &c[1], &c[2]), year))
        .collect();

    let (mut from, mut to) = match days.as_slice() {
        [Some(a), Some(b)] => (a.clone(), b.clone()),
        _ => return Ok(vec![i18n::text(ctx.lang, "admin_bad_range")]),
    };
    if from > to {
        std::mem::swap(&mut from, &mut to);
    }

    let appts = queries::list_in_range(ctx.conn, &from, &to)?;
    if appts.is_empty() {
        return Ok(vec![i18n::format(
            ctx.lang,
            "admin_no_reservations_in_range",
            &[&pretty_date(&from), &pretty_date(&to)],
        )]);
    }
    Ok(lines(ctx, &appts))
}

fn list_service(ctx: &AdminContext, tail: &str) -> anyhow::Result<Vec<String>> {
    let Some(key) = normalize_service(tail) else {
        return Ok(vec![i18n::text(ctx.lang, "admin_bad_service")]);
    };
    let appts = queries::list_by_service(ctx.conn, key)?;
    if appts.is_empty() {
        return Ok(vec![i18n::text(ctx.lang, "admin_no_reservations_for_service")]);
    }
    Ok(lines(ctx, &appts))
}

fn list_user(ctx: &AdminContext, tail: &str) -> anyhow::Result<Vec<String>> {
    if tail.is_empty() {
        return Ok(vec![i18n::text(ctx.lang, "admin_user_usage")]);
    }
    let appts = queries::list_by_user_or_name(ctx.conn, tail)?;
    if appts.is_empty() {
        return Ok(vec![i18n::text(ctx.lang, "admin_no_results")]);
    }
    Ok(lines(ctx, &appts))
}

/// `admin cancel <code>` or `admin cancel <day> <time> <user id or name>`.
fn cancel(ctx: &AdminContext, tail: &str) -> anyhow::Result<Vec<String>> {
    let parts: Vec<&str> = tail.splitn(3, char::is_whitespace).filter(|p| !p.is_empty()).collect();

    let appt = match parts.as_slice() {
        [code] => match queries::find_by_code(ctx.conn, code)? {
            Some(appt) => appt,
            None => return Ok(vec![i18n::text(ctx.lang, "code_not_found")]),
        },
        [day, time, who] => {
            let Some(day_iso) = to_iso_date(day, reference_year(ctx.clock)) else {
                return Ok(vec![i18n::text(ctx.lang, "admin_bad_date")]);
            };
            let Some(time_iso) = to_iso_time(time) else {
                return Ok(vec![i18n::text(ctx.lang, "admin_bad_time")]);
            };
            match find_in_slot(ctx, &day_iso, &time_iso, who.trim())? {
                Ok(appt) => appt,
                Err(key) => return Ok(vec![i18n::text(ctx.lang, key)]),
            }
        }
        _ => return Ok(vec![i18n::text(ctx.lang, "admin_cancel_usage")]),
    };

    queries::delete_appointment(ctx.conn, appt.id)?;
    tracing::info!(code = %appt.booking_code, user_id = %appt.user_id, "admin cancelled appointment");

    Ok(vec![i18n::format(
        ctx.lang,
        "admin_cancelled",
        &[
            &pretty_date(&appt.day_iso),
            &appt.time_iso,
            &appt.user_name.as_deref().unwrap_or_default(),
            &appt.user_id,
        ],
    )])
}

/// Exact user id first, then a unique case-insensitive name match. The
/// inner `Err` carries the message key to show.
fn find_in_slot(
    ctx: &AdminContext,
    day_iso: &str,
    time_iso: &str,
    who: &str,
) -> anyhow::Result<Result<Appointment, &'static str>> {
    if let Some(appt) = queries::find_for_user_slot(ctx.conn, who, day_iso, time_iso)? {
        return Ok(Ok(appt));
    }

    let needle = who.to_lowercase();
    let mut matches: Vec<Appointment> = queries::list_in_slot(ctx.conn, day_iso, time_iso)?
        .into_iter()
        .filter(|a| {
            a.user_name
                .as_deref()
                .map(|n| n.trim().to_lowercase() == needle)
                .unwrap_or(false)
        })
        .collect();

    match matches.len() {
        0 => Ok(Err("admin_not_found")),
        1 => Ok(Ok(matches.remove(0))),
        _ => Ok(Err("admin_ambiguous_name")),
    }
}

/// `admin change <code> <dd.MM.> [u|at] <HH:mm>`
fn change(ctx: &AdminContext, tail: &str) -> anyhow::Result<Vec<String>> {
    let Some(caps) = CHANGE_ARGS.captures(tail) else {
        return Ok(vec![i18n::text(ctx.lang, "admin_change_usage")]);
    };

    let Some(appt) = queries::find_by_code(ctx.conn, &caps[1])? else {
        return Ok(vec![i18n::text(ctx.lang, "code_not_found")]);
    };
    let Some(day_iso) = to_iso_date(&caps[2], reference_year(ctx.clock)) else {
        return Ok(vec![i18n::text(ctx.lang, "admin_bad_date")]);
    };
    let Some(time_iso) = to_iso_time(&caps[3]) else {
        return Ok(vec![i18n::text(ctx.lang, "admin_bad_time")]);
    };

    if let Some(msg) = check_calendar(ctx.lang, &day_iso, &time_iso) {
        return Ok(vec![msg]);
    }

    if let Some(conflict) = check_slot_conflicts(
        ctx.conn,
        &appt.user_id,
        &day_iso,
        &time_iso,
        appt.service_type.as_deref(),
        Some(appt.id),
    )? {
        return Ok(vec![conflict.message(
            ctx.lang,
            &day_iso,
            &time_iso,
            appt.service_type.as_deref(),
        )]);
    }

    if let Err(e) = queries::update_appointment_slot(ctx.conn, appt.id, &day_iso, &time_iso) {
        if matches!(e.downcast_ref::<AppError>(), Some(AppError::Conflict(_))) {
            return Ok(vec![i18n::text(ctx.lang, "slot_just_taken")]);
        }
        return Err(e);
    }
    tracing::info!(code = %appt.booking_code, day = %day_iso, time = %time_iso, "admin moved appointment");

    Ok(vec![i18n::format(
        ctx.lang,
        "admin_changed",
        &[&appt.booking_code, &pretty_date(&day_iso), &time_iso],
    )])
}

/// Business day and hours for a move. `None` when the slot is allowed.
pub(crate) fn check_calendar(lang: Lang, day_iso: &str, time_iso: &str) -> Option<String> {
    if !parse_iso_date(day_iso).map(is_business_day).unwrap_or(false) {
        return Some(i18n::format(lang, "date_closed", &[&pretty_date(day_iso)]));
    }
    if !parse_iso_time(time_iso)
        .map(is_within_business_hours)
        .unwrap_or(false)
    {
        let (open, close) = hours_display();
        return Some(i18n::format(
            lang,
            "time_outside_hours",
            &[&time_iso, &open, &close],
        ));
    }
    None
}
