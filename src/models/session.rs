use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    #[default]
    Hr,
    En,
}

impl Lang {
    pub fn as_str(&self) -> &'static str {
        match self {
            Lang::Hr => "hr",
            Lang::En => "en",
        }
    }

    /// Anything starting with "en" is English, everything else Croatian.
    pub fn parse(s: &str) -> Self {
        if s.trim().to_lowercase().starts_with("en") {
            Lang::En
        } else {
            Lang::Hr
        }
    }

    pub fn is_en(&self) -> bool {
        *self == Lang::En
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum NluMode {
    Regex,
    #[default]
    Local,
    Clu,
}

impl NluMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            NluMode::Regex => "regex",
            NluMode::Local => "local",
            NluMode::Clu => "clu",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "clu" => NluMode::Clu,
            "regex" => NluMode::Regex,
            _ => NluMode::Local,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PendingKind {
    Cancel,
    Change,
}

/// A by-code cancel or change waiting for the user's yes/no.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PendingAction {
    pub kind: PendingKind,
    pub code: String,
    pub new_day_iso: Option<String>,
    pub new_time_iso: Option<String>,
}
