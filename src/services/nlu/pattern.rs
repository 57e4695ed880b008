use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;

use super::IntentRecognizer;
use crate::models::{Intent, IntentResult, Lang, NluMode};

static BOOK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(rezerviraj|rezervacija|book|booking)\b").expect("valid pattern regex"));
static SHOW_ALL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(prikaži\s+rezervacije|show\s+reservations)\b").expect("valid pattern regex"));
static SHOW_BY_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(prikaži\s+rezervacije\s+za|show\s+reservations\s+for)").expect("valid pattern regex"));
static DATE_FRAGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{1,2}[./-]\d{1,2}\.?)").expect("valid pattern regex"));
static CANCEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(otkaži|otkaz|cancel)\b").expect("valid pattern regex"));
static CHANGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(promijeni|promjena|change)\b").expect("valid pattern regex"));

/// Keyword matcher with fixed confidences. Only show-by-date extracts a slot.
pub struct PatternRecognizer;

impl PatternRecognizer {
    pub fn classify(text: &str) -> IntentResult {
        let t = text.trim();

        // Anchored cancel/change come first so "cancel booking X" is not a booking.
        if CANCEL.is_match(t) {
            return IntentResult::new(Intent::Cancel, 0.6);
        }
        if CHANGE.is_match(t) {
            return IntentResult::new(Intent::Change, 0.6);
        }
        if BOOK.is_match(t) {
            return IntentResult::new(Intent::BookAppointment, 0.8);
        }
        if SHOW_BY_DATE.is_match(t) {
            let mut result = IntentResult::new(Intent::ShowByDate, 0.7);
            result.entities.date = DATE_FRAGMENT
                .captures(t)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().to_string());
            return result;
        }
        if SHOW_ALL.is_match(t) {
            return IntentResult::new(Intent::ShowAll, 0.7);
        }

        IntentResult::none()
    }
}

#[async_trait]
impl IntentRecognizer for PatternRecognizer {
    fn mode(&self) -> NluMode {
        NluMode::Regex
    }

    async fn recognize(&self, text: &str, _lang: Lang) -> IntentResult {
        Self::classify(text)
    }
}
