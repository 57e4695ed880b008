use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A persisted appointment. `day_iso` is `YYYY-MM-DD`, `time_iso` is `HH:mm`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: i64,
    pub user_id: String,
    pub user_name: Option<String>,
    pub contact: Option<String>,
    pub service_type: Option<String>,
    pub day_iso: String,
    pub time_iso: String,
    pub booking_code: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone)]
pub struct NewAppointment {
    pub user_id: String,
    pub user_name: Option<String>,
    pub contact: Option<String>,
    pub service_type: Option<String>,
    pub day_iso: String,
    pub time_iso: String,
    pub booking_code: String,
}
