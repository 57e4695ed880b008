use chrono::{NaiveDateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Params};

use crate::errors::AppError;
use crate::models::{AdminUser, Appointment, DialogSession, DialogStep, NewAppointment, ReservationState};
use crate::services::booking_code::normalize_code;

const APPOINTMENT_COLUMNS: &str =
    "id, user_id, user_name, contact, service_type, day_iso, time_iso, booking_code, created_at";

fn now_string() -> String {
    Utc::now().naive_utc().format("%Y-%m-%d %H:%M:%S").to_string()
}

// ── Appointments ──

/// Inserts an appointment. Unique-index and slot-capacity violations come
/// back as `AppError::Conflict` inside the anyhow error.
pub fn insert_appointment(conn: &Connection, appt: &NewAppointment) -> anyhow::Result<i64> {
    conn.execute(
        "INSERT INTO appointments (user_id, user_name, contact, service_type, day_iso, time_iso, booking_code, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            appt.user_id,
            appt.user_name,
            appt.contact,
            appt.service_type,
            appt.day_iso,
            appt.time_iso,
            appt.booking_code,
            now_string(),
        ],
    )
    .map_err(AppError::from_sqlite)?;
    Ok(conn.last_insert_rowid())
}

pub fn delete_appointment(conn: &Connection, id: i64) -> anyhow::Result<bool> {
    let count = conn.execute("DELETE FROM appointments WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

pub fn update_appointment_slot(
    conn: &Connection,
    id: i64,
    day_iso: &str,
    time_iso: &str,
) -> anyhow::Result<bool> {
    let count = conn
        .execute(
            "UPDATE appointments SET day_iso = ?1, time_iso = ?2 WHERE id = ?3",
            params![day_iso, time_iso, id],
        )
        .map_err(AppError::from_sqlite)?;
    Ok(count > 0)
}

/// Looks up by booking code ignoring case and punctuation.
pub fn find_by_code(conn: &Connection, code: &str) -> anyhow::Result<Option<Appointment>> {
    let key = normalize_code(code);
    if key.is_empty() {
        return Ok(None);
    }
    let sql = format!(
        "SELECT {APPOINTMENT_COLUMNS} FROM appointments
         WHERE UPPER(REPLACE(booking_code, '-', '')) = ?1 LIMIT 1"
    );
    let appt = conn
        .query_row(&sql, params![key], parse_appointment_row)
        .optional()?;
    Ok(appt)
}

pub fn booking_code_exists(conn: &Connection, code: &str) -> anyhow::Result<bool> {
    Ok(find_by_code(conn, code)?.is_some())
}

fn query_appointments<P: Params>(
    conn: &Connection,
    where_clause: &str,
    params: P,
) -> anyhow::Result<Vec<Appointment>> {
    let sql = format!(
        "SELECT {APPOINTMENT_COLUMNS} FROM appointments {where_clause} ORDER BY day_iso ASC, time_iso ASC, id ASC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params, parse_appointment_row)?;

    let mut appointments = vec![];
    for row in rows {
        appointments.push(row?);
    }
    Ok(appointments)
}

pub fn list_for_user(conn: &Connection, user_id: &str) -> anyhow::Result<Vec<Appointment>> {
    query_appointments(conn, "WHERE user_id = ?1", params![user_id])
}

pub fn list_for_user_on_day(
    conn: &Connection,
    user_id: &str,
    day_iso: &str,
) -> anyhow::Result<Vec<Appointment>> {
    query_appointments(
        conn,
        "WHERE user_id = ?1 AND day_iso = ?2",
        params![user_id, day_iso],
    )
}

pub fn list_all(conn: &Connection) -> anyhow::Result<Vec<Appointment>> {
    query_appointments(conn, "", [])
}

pub fn list_on_day(conn: &Connection, day_iso: &str) -> anyhow::Result<Vec<Appointment>> {
    query_appointments(conn, "WHERE day_iso = ?1", params![day_iso])
}

/// Inclusive on both ends; ISO dates compare correctly as text.
pub fn list_in_range(
    conn: &Connection,
    from_iso: &str,
    to_iso: &str,
) -> anyhow::Result<Vec<Appointment>> {
    query_appointments(
        conn,
        "WHERE day_iso >= ?1 AND day_iso <= ?2",
        params![from_iso, to_iso],
    )
}

pub fn list_by_service(conn: &Connection, service_key: &str) -> anyhow::Result<Vec<Appointment>> {
    query_appointments(conn, "WHERE service_type = ?1", params![service_key])
}

/// Case-insensitive substring match on user id or user name. SQLite's
/// `LOWER` only folds ASCII, so the filter runs here.
pub fn list_by_user_or_name(conn: &Connection, query: &str) -> anyhow::Result<Vec<Appointment>> {
    let needle = query.trim().to_lowercase();
    let all = list_all(conn)?;
    Ok(all
        .into_iter()
        .filter(|a| {
            a.user_id.to_lowercase().contains(&needle)
                || a
                    .user_name
                    .as_deref()
                    .map(|n| n.to_lowercase().contains(&needle))
                    .unwrap_or(false)
        })
        .collect())
}

pub fn list_in_slot(
    conn: &Connection,
    day_iso: &str,
    time_iso: &str,
) -> anyhow::Result<Vec<Appointment>> {
    query_appointments(
        conn,
        "WHERE day_iso = ?1 AND time_iso = ?2",
        params![day_iso, time_iso],
    )
}

pub fn last_for_user(conn: &Connection, user_id: &str) -> anyhow::Result<Option<Appointment>> {
    let sql = format!(
        "SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE user_id = ?1
         ORDER BY created_at DESC, id DESC LIMIT 1"
    );
    let appt = conn
        .query_row(&sql, params![user_id], parse_appointment_row)
        .optional()?;
    Ok(appt)
}

pub fn count_in_slot(
    conn: &Connection,
    day_iso: &str,
    time_iso: &str,
    exclude_id: Option<i64>,
) -> anyhow::Result<i64> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM appointments
         WHERE day_iso = ?1 AND time_iso = ?2 AND (?3 IS NULL OR id != ?3)",
        params![day_iso, time_iso, exclude_id],
        |row| row.get(0),
    )?;
    Ok(count)
}

pub fn find_for_user_slot(
    conn: &Connection,
    user_id: &str,
    day_iso: &str,
    time_iso: &str,
) -> anyhow::Result<Option<Appointment>> {
    let sql = format!(
        "SELECT {APPOINTMENT_COLUMNS} FROM appointments
         WHERE user_id = ?1 AND day_iso = ?2 AND time_iso = ?3 LIMIT 1"
    );
    let appt = conn
        .query_row(&sql, params![user_id, day_iso, time_iso], parse_appointment_row)
        .optional()?;
    Ok(appt)
}

pub fn exists_for_user_slot(
    conn: &Connection,
    user_id: &str,
    day_iso: &str,
    time_iso: &str,
    exclude_id: Option<i64>,
) -> anyhow::Result<bool> {
    let exists = conn.query_row(
        "SELECT COUNT(*) > 0 FROM appointments
         WHERE user_id = ?1 AND day_iso = ?2 AND time_iso = ?3 AND (?4 IS NULL OR id != ?4)",
        params![user_id, day_iso, time_iso, exclude_id],
        |row| row.get(0),
    )?;
    Ok(exists)
}

fn parse_appointment_row(row: &rusqlite::Row) -> rusqlite::Result<Appointment> {
    let created_at_str: String = row.get(8)?;
    let created_at = NaiveDateTime::parse_from_str(&created_at_str, "%Y-%m-%d %H:%M:%S")
        .unwrap_or_else(|_| Utc::now().naive_utc());

    Ok(Appointment {
        id: row.get(0)?,
        user_id: row.get(1)?,
        user_name: row.get(2)?,
        contact: row.get(3)?,
        service_type: row.get(4)?,
        day_iso: row.get(5)?,
        time_iso: row.get(6)?,
        booking_code: row.get(7)?,
        created_at,
    })
}

// ── Admin Users ──

pub fn get_admin_by_username(conn: &Connection, username: &str) -> anyhow::Result<Option<AdminUser>> {
    let result = conn.query_row(
        "SELECT id, username, password_hash FROM admin_users WHERE username = ?1",
        params![username],
        |row| {
            Ok(AdminUser {
                id: row.get(0)?,
                username: row.get(1)?,
                password_hash: row.get(2)?,
            })
        },
    );

    match result {
        Ok(user) => Ok(Some(user)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn insert_admin(conn: &Connection, username: &str, password_hash: &str) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO admin_users (username, password_hash) VALUES (?1, ?2)",
        params![username, password_hash],
    )
    .map_err(AppError::from_sqlite)?;
    Ok(())
}

// ── Dialogs ──

pub fn load_dialog(conn: &Connection, user_id: &str) -> anyhow::Result<Option<DialogSession>> {
    let result = conn.query_row(
        "SELECT step, data FROM dialogs WHERE user_id = ?1",
        params![user_id],
        |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
    );

    match result {
        Ok((step_str, data)) => {
            let Some(step) = DialogStep::parse(&step_str) else {
                tracing::warn!(user_id, step = %step_str, "unknown dialog step, dropping session");
                return Ok(None);
            };
            let reservation: ReservationState = serde_json::from_str(&data).unwrap_or_default();
            Ok(Some(DialogSession {
                user_id: user_id.to_string(),
                step,
                reservation,
            }))
        }
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn save_dialog(conn: &Connection, session: &DialogSession) -> anyhow::Result<()> {
    let data = serde_json::to_string(&session.reservation)?;
    conn.execute(
        "INSERT INTO dialogs (user_id, step, data, updated_at)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(user_id) DO UPDATE SET
           step = excluded.step,
           data = excluded.data,
           updated_at = excluded.updated_at",
        params![session.user_id, session.step.as_str(), data, now_string()],
    )?;
    Ok(())
}

pub fn clear_dialog(conn: &Connection, user_id: &str) -> anyhow::Result<bool> {
    let count = conn.execute("DELETE FROM dialogs WHERE user_id = ?1", params![user_id])?;
    Ok(count > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    fn setup_db() -> Connection {
        db::init_db(":memory:").unwrap()
    }

    fn new_appt(user: &str, day: &str, time: &str, code: &str) -> NewAppointment {
        NewAppointment {
            user_id: user.to_string(),
            user_name: Some(format!("Name {user}")),
            contact: Some("091234567".to_string()),
            service_type: Some("it".to_string()),
            day_iso: day.to_string(),
            time_iso: time.to_string(),
            booking_code: code.to_string(),
        }
    }

    fn is_conflict(err: &anyhow::Error) -> bool {
        matches!(err.downcast_ref::<AppError>(), Some(AppError::Conflict(_)))
    }

    #[test]
    fn test_insert_and_find_by_code_normalized() {
        let conn = setup_db();
        insert_appointment(&conn, &new_appt("u1", "2025-09-17", "14:00", "AB2C-DE3F")).unwrap();

        let found = find_by_code(&conn, "ab2c de3f").unwrap().unwrap();
        assert_eq!(found.user_id, "u1");
        assert!(find_by_code(&conn, "AB2CDE3F").unwrap().is_some());
        assert!(find_by_code(&conn, "ZZZZ-ZZZZ").unwrap().is_none());
        assert!(find_by_code(&conn, "--").unwrap().is_none());
    }

    #[test]
    fn test_same_user_slot_is_unique() {
        let conn = setup_db();
        insert_appointment(&conn, &new_appt("u1", "2025-09-17", "14:00", "AAAA-AAAA")).unwrap();
        let err = insert_appointment(&conn, &new_appt("u1", "2025-09-17", "14:00", "BBBB-BBBB"))
            .unwrap_err();
        assert!(is_conflict(&err));
    }

    #[test]
    fn test_booking_code_is_unique() {
        let conn = setup_db();
        insert_appointment(&conn, &new_appt("u1", "2025-09-17", "14:00", "AAAA-AAAA")).unwrap();
        let err = insert_appointment(&conn, &new_appt("u2", "2025-09-18", "10:00", "AAAA-AAAA"))
            .unwrap_err();
        match err.downcast_ref::<AppError>() {
            Some(e) => assert!(e.is_booking_code_conflict()),
            None => panic!("expected AppError"),
        }
    }

    #[test]
    fn test_capacity_trigger_blocks_third_insert() {
        let conn = setup_db();
        insert_appointment(&conn, &new_appt("u1", "2025-09-17", "14:00", "AAAA-AAAA")).unwrap();
        insert_appointment(&conn, &new_appt("u2", "2025-09-17", "14:00", "BBBB-BBBB")).unwrap();
        let err = insert_appointment(&conn, &new_appt("u3", "2025-09-17", "14:00", "CCCC-CCCC"))
            .unwrap_err();
        assert!(is_conflict(&err));
        assert_eq!(count_in_slot(&conn, "2025-09-17", "14:00", None).unwrap(), 2);
    }

    #[test]
    fn test_capacity_trigger_on_update_ignores_own_row() {
        let conn = setup_db();
        let a = insert_appointment(&conn, &new_appt("u1", "2025-09-17", "14:00", "AAAA-AAAA")).unwrap();
        insert_appointment(&conn, &new_appt("u2", "2025-09-17", "14:00", "BBBB-BBBB")).unwrap();
        let c = insert_appointment(&conn, &new_appt("u3", "2025-09-17", "16:00", "CCCC-CCCC")).unwrap();

        // Moving within its own slot is fine even though the slot is full.
        assert!(update_appointment_slot(&conn, a, "2025-09-17", "14:00").unwrap());

        let err = update_appointment_slot(&conn, c, "2025-09-17", "14:00").unwrap_err();
        assert!(is_conflict(&err));
    }

    #[test]
    fn test_listing_filters() {
        let conn = setup_db();
        insert_appointment(&conn, &new_appt("web-1", "2025-09-17", "14:00", "AAAA-AAAA")).unwrap();
        insert_appointment(&conn, &new_appt("web-1", "2025-09-19", "09:00", "BBBB-BBBB")).unwrap();
        let mut other = new_appt("web-2", "2025-09-18", "10:00", "CCCC-CCCC");
        other.user_name = Some("Đuro Šimić".to_string());
        other.service_type = Some("vodo".to_string());
        insert_appointment(&conn, &other).unwrap();

        assert_eq!(list_for_user(&conn, "web-1").unwrap().len(), 2);
        assert_eq!(list_for_user_on_day(&conn, "web-1", "2025-09-19").unwrap().len(), 1);
        assert_eq!(list_on_day(&conn, "2025-09-18").unwrap().len(), 1);
        assert_eq!(list_in_range(&conn, "2025-09-17", "2025-09-18").unwrap().len(), 2);
        assert_eq!(list_by_service(&conn, "vodo").unwrap().len(), 1);
        assert_eq!(list_by_user_or_name(&conn, "ŠIMIĆ").unwrap().len(), 1);
        assert_eq!(list_by_user_or_name(&conn, "web-").unwrap().len(), 3);

        let all = list_all(&conn).unwrap();
        let days: Vec<&str> = all.iter().map(|a| a.day_iso.as_str()).collect();
        assert_eq!(days, vec!["2025-09-17", "2025-09-18", "2025-09-19"]);

        let last = last_for_user(&conn, "web-1").unwrap().unwrap();
        assert_eq!(last.booking_code, "BBBB-BBBB");
    }

    #[test]
    fn test_slot_lookups() {
        let conn = setup_db();
        let id = insert_appointment(&conn, &new_appt("u1", "2025-09-17", "14:00", "AAAA-AAAA")).unwrap();
        assert!(exists_for_user_slot(&conn, "u1", "2025-09-17", "14:00", None).unwrap());
        assert!(!exists_for_user_slot(&conn, "u1", "2025-09-17", "14:00", Some(id)).unwrap());
        assert!(find_for_user_slot(&conn, "u1", "2025-09-17", "14:00").unwrap().is_some());
        assert_eq!(count_in_slot(&conn, "2025-09-17", "14:00", Some(id)).unwrap(), 0);
        assert_eq!(list_in_slot(&conn, "2025-09-17", "14:00").unwrap().len(), 1);
        assert!(delete_appointment(&conn, id).unwrap());
        assert!(!delete_appointment(&conn, id).unwrap());
    }

    #[test]
    fn test_admin_round_trip() {
        let conn = setup_db();
        assert!(get_admin_by_username(&conn, "admin").unwrap().is_none());
        insert_admin(&conn, "admin", "hash").unwrap();
        let admin = get_admin_by_username(&conn, "admin").unwrap().unwrap();
        assert_eq!(admin.password_hash, "hash");
    }

    #[test]
    fn test_dialog_persistence() {
        let conn = setup_db();
        assert!(load_dialog(&conn, "u1").unwrap().is_none());

        let mut session = DialogSession {
            user_id: "u1".to_string(),
            step: DialogStep::AskTime,
            reservation: ReservationState {
                service_type: Some("it".to_string()),
                day: Some("17.09.".to_string()),
                ..Default::default()
            },
        };
        save_dialog(&conn, &session).unwrap();
        session.step = DialogStep::AskName;
        save_dialog(&conn, &session).unwrap();

        let loaded = load_dialog(&conn, "u1").unwrap().unwrap();
        assert_eq!(loaded, session);

        assert!(clear_dialog(&conn, "u1").unwrap());
        assert!(load_dialog(&conn, "u1").unwrap().is_none());
    }
}
