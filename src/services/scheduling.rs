use chrono::{Duration, NaiveDateTime};
use rusqlite::Connection;

use crate::db::queries;
use crate::models::Lang;
use crate::services::business_rules::{default_duration_minutes, localize_service, MAX_PER_SLOT};
use crate::services::datetime::pretty_date;
use crate::services::i18n;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotConflict {
    /// The same user already holds this exact day and time.
    TakenForUser,
    Full { taken: i64 },
    Overlap { duration_minutes: i64 },
}

impl SlotConflict {
    pub fn message(&self, lang: Lang, day_iso: &str, time_iso: &str, service_key: Option<&str>) -> String {
        let day = pretty_date(day_iso);
        match self {
            SlotConflict::TakenForUser => {
                i18n::format(lang, "slot_taken_for_user", &[&day, &time_iso])
            }
            SlotConflict::Full { .. } => {
                i18n::format(lang, "slot_full", &[&day, &time_iso, &MAX_PER_SLOT])
            }
            SlotConflict::Overlap { duration_minutes } => {
                let service = localize_service(service_key.unwrap_or_default(), lang);
                i18n::format(
                    lang,
                    "slot_overlap",
                    &[&day, &time_iso, duration_minutes, &service],
                )
            }
        }
    }
}

fn slot_start(day_iso: &str, time_iso: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(&format!("{day_iso} {time_iso}"), "%Y-%m-%d %H:%M").ok()
}

/// Checks a candidate `(day, time)` in order: the user's own duplicate,
/// slot capacity, then overlap with other appointments that day.
///
/// Appointments starting at exactly the same time are governed by capacity
/// and skipped in the overlap test. `exclude_id` leaves out the appointment
/// being moved.
pub fn check_slot_conflicts(
    conn: &Connection,
    user_id: &str,
    day_iso: &str,
    time_iso: &str,
    service_key: Option<&str>,
    exclude_id: Option<i64>,
) -> anyhow::Result<Option<SlotConflict>> {
    if queries::exists_for_user_slot(conn, user_id, day_iso, time_iso, exclude_id)? {
        return Ok(Some(SlotConflict::TakenForUser));
    }

    let taken = queries::count_in_slot(conn, day_iso, time_iso, exclude_id)?;
    if taken >= MAX_PER_SLOT {
        return Ok(Some(SlotConflict::Full { taken }));
    }

    let Some(start) = slot_start(day_iso, time_iso) else {
        anyhow::bail!("invalid slot {day_iso} {time_iso}");
    };
    let duration_minutes = default_duration_minutes(service_key);
    let end = start + Duration::minutes(duration_minutes);

    for other in queries::list_on_day(conn, day_iso)? {
        if Some(other.id) == exclude_id || other.time_iso == time_iso {
            continue;
        }
        let Some(other_start) = slot_start(&other.day_iso, &other.time_iso) else {
            continue;
        };
        let other_end =
            other_start + Duration::minutes(default_duration_minutes(other.service_type.as_deref()));

        // Half-open intervals: touching end-to-start is fine.
        if start < other_end && end > other_start {
            return Ok(Some(SlotConflict::Overlap { duration_minutes }));
        }
    }

    Ok(None)
}
