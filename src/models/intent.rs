use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    None,
    BookAppointment,
    ShowAll,
    ShowByDate,
    Cancel,
    Change,
    CheckSlot,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::None => "none",
            Intent::BookAppointment => "book_appointment",
            Intent::ShowAll => "show_all",
            Intent::ShowByDate => "show_by_date",
            Intent::Cancel => "cancel",
            Intent::Change => "change",
            Intent::CheckSlot => "check_slot",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Entities {
    pub service: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub name: Option<String>,
    pub contact: Option<String>,
}

impl Entities {
    /// True when any slot needed to book without further questions is empty.
    pub fn is_incomplete(&self) -> bool {
        [
            &self.service,
            &self.date,
            &self.time,
            &self.name,
            &self.contact,
        ]
        .iter()
        .any(|slot| is_blank(slot))
    }

    /// Fills only the slots that are still blank; existing values are never overwritten.
    pub fn fill_missing_from(&mut self, other: &Entities) {
        fill(&mut self.service, &other.service);
        fill(&mut self.date, &other.date);
        fill(&mut self.time, &other.time);
        fill(&mut self.name, &other.name);
        fill(&mut self.contact, &other.contact);
    }
}

pub(crate) fn is_blank(slot: &Option<String>) -> bool {
    slot.as_deref().map(|s| s.trim().is_empty()).unwrap_or(true)
}

fn fill(target: &mut Option<String>, source: &Option<String>) {
    if is_blank(target) && !is_blank(source) {
        *target = source.clone();
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IntentResult {
    pub intent: Intent,
    pub entities: Entities,
    pub confidence: f64,
}

impl IntentResult {
    pub fn none() -> Self {
        Self {
            intent: Intent::None,
            entities: Entities::default(),
            confidence: 0.0,
        }
    }

    pub fn new(intent: Intent, confidence: f64) -> Self {
        Self {
            intent,
            entities: Entities::default(),
            confidence,
        }
    }
}
