use serde::{Deserialize, Serialize};

use super::intent::{is_blank, Entities};

/// Slots collected by the reservation dialog. Values stay as the user typed
/// them until the confirm step canonicalizes day, time and service.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ReservationState {
    pub service_type: Option<String>,
    pub day: Option<String>,
    pub time: Option<String>,
    pub name: Option<String>,
    pub contact: Option<String>,
}

impl From<&Entities> for ReservationState {
    fn from(e: &Entities) -> Self {
        Self {
            service_type: e.service.clone(),
            day: e.date.clone(),
            time: e.time.clone(),
            name: e.name.clone(),
            contact: e.contact.clone(),
        }
    }
}

impl ReservationState {
    pub fn has_service(&self) -> bool {
        !is_blank(&self.service_type)
    }

    pub fn has_day(&self) -> bool {
        !is_blank(&self.day)
    }

    pub fn has_time(&self) -> bool {
        !is_blank(&self.time)
    }

    pub fn has_name(&self) -> bool {
        !is_blank(&self.name)
    }

    pub fn has_contact(&self) -> bool {
        !is_blank(&self.contact)
    }
}

/// Dialog steps in execution order. A suspended dialog stores the step whose
/// prompt is outstanding; the user's next message answers it. `Save` waits
/// on the yes/no for the summary.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DialogStep {
    AskService,
    AskDay,
    AskTime,
    AskName,
    AskContact,
    ConfirmSummary,
    Save,
}

impl DialogStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            DialogStep::AskService => "ask_service",
            DialogStep::AskDay => "ask_day",
            DialogStep::AskTime => "ask_time",
            DialogStep::AskName => "ask_name",
            DialogStep::AskContact => "ask_contact",
            DialogStep::ConfirmSummary => "confirm_summary",
            DialogStep::Save => "save",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ask_service" => Some(DialogStep::AskService),
            "ask_day" => Some(DialogStep::AskDay),
            "ask_time" => Some(DialogStep::AskTime),
            "ask_name" => Some(DialogStep::AskName),
            "ask_contact" => Some(DialogStep::AskContact),
            "confirm_summary" => Some(DialogStep::ConfirmSummary),
            "save" => Some(DialogStep::Save),
            _ => None,
        }
    }
}

/// A suspended reservation dialog, persisted between turns.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DialogSession {
    pub user_id: String,
    pub step: DialogStep,
    pub reservation: ReservationState,
}
