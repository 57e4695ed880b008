use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use chrono::Duration;
use regex::Regex;

use super::IntentRecognizer;
use crate::models::{Entities, Intent, IntentResult, Lang, NluMode};
use crate::services::business_rules::normalize_service;
use crate::services::datetime::Clock;

const SERVICE_WORD_EN: &str = r"(?:it|plumbing|electrical(?:\s+device)?|air\s*cond(?:ition(?:ing)?)?|ac|locksmith|carpenter|mechanic|drywall|lighting|appliance|device)";
const SERVICE_WORD_HR: &str = r"(?:it|vodoinstalacija|elektri\w+|klima|bravar|stolar|automehaničar|automehanicar|gips|knauf|rasvjeta|svjetla|kućanski|kucanski)";

const CONFIDENCE: f64 = 0.85;

fn re(pattern: &str) -> Regex {
    Regex::new(pattern).expect("valid recognizer regex")
}

static BOOK: LazyLock<Regex> =
    LazyLock::new(|| re(r"\b(rezerviraj|rezervacija|book|booking|schedule)\b"));
static SHOW: LazyLock<Regex> =
    LazyLock::new(|| re(r"^(prikaži\s+rezervacije|show\s+reservations)\b"));
static SHOW_FOR_DATE: LazyLock<Regex> =
    LazyLock::new(|| re(r"(za|for)\s+\d{1,2}([./-])\d{1,2}\.?"));
static CANCEL: LazyLock<Regex> = LazyLock::new(|| re(r"^(otkaži|otkaz|cancel)\b"));
static CHANGE: LazyLock<Regex> = LazyLock::new(|| re(r"^(promijeni|promjena|change)\b"));
static CHECK_SLOT: LazyLock<Regex> = LazyLock::new(|| {
    re(r"\b(provjeri\s+termin|check\s+slot|is\s+\d{1,2}[/.-]\d{1,2}\s+at)\b")
});
static RELATIVE_HR: LazyLock<Regex> = LazyLock::new(|| re(r"\b(danas|sutra|preksutra)\b"));
static RELATIVE_EN: LazyLock<Regex> =
    LazyLock::new(|| re(r"\b(today|tomorrow|day after tomorrow)\b"));

static DATE_DM: LazyLock<Regex> = LazyLock::new(|| re(r"\b(\d{1,2})[.\-/](\d{1,2})\.?"));
static DATE_US: LazyLock<Regex> = LazyLock::new(|| re(r"\b(\d{1,2})/(\d{1,2})\b"));

static TIME_COLON: LazyLock<Regex> = LazyLock::new(|| re(r"\b([01]?\d|2[0-3]):(\d{1,2})\b"));
static TIME_DOT: LazyLock<Regex> = LazyLock::new(|| re(r"\b([01]?\d|2[0-3])\.(\d{1,2})\b"));
static TIME_H_MIN: LazyLock<Regex> =
    LazyLock::new(|| re(r"(?i)\b([01]?\d|2[0-3])h(\d{1,2})\b"));
static TIME_H: LazyLock<Regex> = LazyLock::new(|| re(r"(?i)\b([01]?\d|2[0-3])h\b"));
static TIME_AT_HOUR: LazyLock<Regex> =
    LazyLock::new(|| re(r"(?i)\b(?:at|u)\s*([01]?\d|2[0-3])\b"));

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| re(r"(?i)[A-Z0-9._%+-]+@[A-Z0-9.-]+\.[A-Z]{2,}"));
static PHONE: LazyLock<Regex> = LazyLock::new(|| re(r"\+?[\d\-\s()]{9,20}"));
static CLOCK_TIME: LazyLock<Regex> = LazyLock::new(|| re(r"\d{1,2}:\d{2}"));

static SERVICE_PHRASE_EN: LazyLock<Regex> =
    LazyLock::new(|| re(&format!(r"(?i)\b(for)\s+{SERVICE_WORD_EN}\b")));
static SERVICE_PHRASE_HR: LazyLock<Regex> =
    LazyLock::new(|| re(&format!(r"(?i)\b(za)\s+{SERVICE_WORD_HR}\b")));

static NAME_PREFIXES_HR: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![re(r"(?i)^na\s+ime\s+"), re(r"(?i)^na\s+"), re(r"(?i)^za\s+")]
});
static NAME_PREFIXES_EN: LazyLock<Vec<Regex>> =
    LazyLock::new(|| vec![re(r"(?i)^for\s+"), re(r"(?i)^on\s+")]);
static NAME_END_HR: LazyLock<Regex> =
    LazyLock::new(|| re(&format!(r"(?i)^(?:\s+za\s+{SERVICE_WORD_HR}\b|,|$)")));
static NAME_END_EN: LazyLock<Regex> =
    LazyLock::new(|| re(&format!(r"(?i)^(?:\s+for\s+{SERVICE_WORD_EN}\b|,|$)")));
static NAME_TRAILING_PREP: LazyLock<Regex> = LazyLock::new(|| re(r"(?i)\s*(for|za)\s+$"));
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| re(r"\s+"));

/// Heuristic recognizer: intent keywords plus slot extraction for service,
/// date, time, name and contact.
pub struct LocalRecognizer {
    clock: Arc<dyn Clock>,
}

impl LocalRecognizer {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    pub fn analyze(&self, text: &str, lang: Lang) -> IntentResult {
        let original = text.trim();
        let lower = original.to_lowercase();

        // Anchored cancel/change before the booking keywords, otherwise
        // "cancel booking X" would start a new booking.
        if CANCEL.is_match(&lower) {
            return self.build_result(Intent::Cancel, original, &lower, lang);
        }
        if CHANGE.is_match(&lower) {
            return self.build_result(Intent::Change, original, &lower, lang);
        }
        if BOOK.is_match(&lower) {
            return self.build_result(Intent::BookAppointment, original, &lower, lang);
        }
        if SHOW.is_match(&lower) {
            if SHOW_FOR_DATE.is_match(&lower) || has_relative_date(&lower, lang) {
                return self.build_result(Intent::ShowByDate, original, &lower, lang);
            }
            return IntentResult::new(Intent::ShowAll, 0.8);
        }
        if CHECK_SLOT.is_match(&lower) {
            return self.build_result(Intent::CheckSlot, original, &lower, lang);
        }

        IntentResult::none()
    }

    fn build_result(&self, intent: Intent, original: &str, lower: &str, lang: Lang) -> IntentResult {
        let contact = extract_contact(original);

        let service = normalize_service(lower).map(str::to_string);
        let without_service = match service {
            Some(_) => remove_service_phrase(original, lang),
            None => original.to_string(),
        };

        let date = self.extract_date(lower, lang);
        let time = extract_time(original);

        let without_contact = match &contact {
            Some(c) => without_service.replace(c.as_str(), ""),
            None => without_service,
        };
        let name = extract_name(&without_contact, lang);

        IntentResult {
            intent,
            entities: Entities {
                service,
                date,
                time,
                name,
                contact,
            },
            confidence: CONFIDENCE,
        }
    }

    /// Returns `dd.MM.` text; the dialog turns it into an ISO date later.
    fn extract_date(&self, lower: &str, lang: Lang) -> Option<String> {
        if let Some(c) = DATE_DM.captures(lower) {
            let (d, m) = (parse_num(&c[1]), parse_num(&c[2]));
            if (1..=31).contains(&d) && (1..=12).contains(&m) {
                return Some(format!("{d:02}.{m:02}."));
            }
        }

        if lang.is_en() {
            if let Some(c) = DATE_US.captures(lower) {
                let (m, d) = (parse_num(&c[1]), parse_num(&c[2]));
                if (1..=31).contains(&d) && (1..=12).contains(&m) {
                    return Some(format!("{d:02}.{m:02}."));
                }
            }
        }

        // Longer terms first: "preksutra" contains "sutra".
        let offsets: &[(&str, i64)] = if lang.is_en() {
            &[("day after tomorrow", 2), ("tomorrow", 1), ("today", 0)]
        } else {
            &[("preksutra", 2), ("sutra", 1), ("danas", 0)]
        };
        let today = self.clock.today();
        offsets
            .iter()
            .find(|(word, _)| lower.contains(word))
            .map(|(_, days)| (today + Duration::days(*days)).format("%d.%m.").to_string())
    }
}

#[async_trait]
impl IntentRecognizer for LocalRecognizer {
    fn mode(&self) -> NluMode {
        NluMode::Local
    }

    async fn recognize(&self, text: &str, lang: Lang) -> IntentResult {
        self.analyze(text, lang)
    }
}

fn parse_num(s: &str) -> u32 {
    s.parse().unwrap_or(0)
}

fn has_relative_date(lower: &str, lang: Lang) -> bool {
    if lang.is_en() {
        RELATIVE_EN.is_match(lower)
    } else {
        RELATIVE_HR.is_match(lower)
    }
}

fn remove_service_phrase(text: &str, lang: Lang) -> String {
    let re = if lang.is_en() {
        &*SERVICE_PHRASE_EN
    } else {
        &*SERVICE_PHRASE_HR
    };
    re.replace_all(text, "").into_owned()
}

fn hh_mm(h: &str, m: Option<&str>) -> Option<String> {
    let hour = parse_num(h);
    let minute = m.map(parse_num).unwrap_or(0);
    (hour <= 23 && minute <= 59).then(|| format!("{hour:02}:{minute:02}"))
}

/// Tries `H:mm`, then `H.mm` not embedded in a date, then `HhMM`, `Hh`, and
/// finally a bare hour after "at"/"u".
pub(crate) fn extract_time(text: &str) -> Option<String> {
    if let Some(c) = TIME_COLON.captures(text) {
        if let Some(t) = hh_mm(&c[1], Some(&c[2])) {
            return Some(t);
        }
    }

    if let Some(t) = find_dotted_time(text) {
        return Some(t);
    }

    if let Some(c) = TIME_H_MIN.captures(text) {
        if let Some(t) = hh_mm(&c[1], Some(&c[2])) {
            return Some(t);
        }
    }

    if let Some(c) = TIME_H.captures(text) {
        if let Some(t) = hh_mm(&c[1], None) {
            return Some(t);
        }
    }

    TIME_AT_HOUR
        .captures(text)
        .and_then(|c| hh_mm(&c[1], None))
}

/// `H.mm` is only a time when it is not part of a `d.M.` date: the match must
/// not follow "<digit>." and must not be followed by ".".
fn find_dotted_time(text: &str) -> Option<String> {
    let mut start = 0;
    while let Some(c) = TIME_DOT.captures_at(text, start) {
        let whole = c.get(0)?;
        let mut before = text[..whole.start()].chars().rev();
        let after_date = matches!(
            (before.next(), before.next()),
            (Some('.'), Some(d)) if d.is_ascii_digit()
        );
        let before_dot = text[whole.end()..].starts_with('.');

        if !after_date && !before_dot {
            return hh_mm(&c[1], Some(&c[2]));
        }

        start = whole.start()
            + text[whole.start()..]
                .chars()
                .next()
                .map(char::len_utf8)
                .unwrap_or(1);
    }
    None
}

/// Email first; otherwise the last phone-shaped run with 9-12 digits that
/// does not contain a clock time.
pub(crate) fn extract_contact(text: &str) -> Option<String> {
    if let Some(m) = EMAIL.find(text) {
        return Some(m.as_str().trim().to_string());
    }

    let candidates: Vec<&str> = PHONE.find_iter(text).map(|m| m.as_str()).collect();
    candidates.into_iter().rev().find_map(|raw| {
        let candidate = raw.trim();
        if CLOCK_TIME.is_match(candidate) {
            return None;
        }
        is_phone(candidate).then(|| candidate.to_string())
    })
}

pub(crate) fn is_phone(s: &str) -> bool {
    let digits = s.chars().filter(|c| c.is_ascii_digit()).count();
    (9..=12).contains(&digits)
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphabetic() || ('\u{C0}'..='\u{17E}').contains(&c) || matches!(c, '\'' | ' ' | '-')
}

/// Shortest run (at least two characters) of name characters after a name
/// prefix that is followed by a service phrase, a comma or the end of text.
fn extract_name(text: &str, lang: Lang) -> Option<String> {
    let s = WHITESPACE.replace_all(text, " ");
    let s = s.trim();

    let (prefixes, end) = if lang.is_en() {
        (&*NAME_PREFIXES_EN, &*NAME_END_EN)
    } else {
        (&*NAME_PREFIXES_HR, &*NAME_END_HR)
    };

    let mut prev: Option<char> = None;
    for (pos, ch) in s.char_indices() {
        let at_boundary = prev.map(|p| !is_word_char(p)).unwrap_or(true);
        prev = Some(ch);
        if !at_boundary || !is_word_char(ch) {
            continue;
        }

        let rest = &s[pos..];
        for prefix in prefixes {
            let Some(m) = prefix.find(rest) else {
                continue;
            };
            if let Some(raw) = shortest_name(&rest[m.end()..], end) {
                let name = clean_name(raw);
                if !name.is_empty() {
                    return Some(name);
                }
            }
        }
    }
    None
}

fn shortest_name<'a>(rest: &'a str, end: &Regex) -> Option<&'a str> {
    let mut count = 0;
    for (idx, ch) in rest.char_indices() {
        if count >= 2 && end.is_match(&rest[idx..]) {
            return Some(&rest[..idx]);
        }
        if !is_name_char(ch) {
            return None;
        }
        count += 1;
    }
    (count >= 2 && end.is_match("")).then_some(rest)
}

fn clean_name(raw: &str) -> String {
    let stripped = NAME_TRAILING_PREP.replace(raw, "");
    let trimmed = stripped.trim().trim_matches(|c: char| matches!(c, ',' | '.' | ';'));

    trimmed
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::services::datetime::FixedClock;

    fn recognizer() -> LocalRecognizer {
        // Wednesday
        LocalRecognizer::new(Arc::new(FixedClock(NaiveDate::from_ymd_opt(2025, 9, 17).unwrap())))
    }

    #[test]
    fn test_full_croatian_booking() {
        let r = recognizer().analyze("rezerviraj 17.09. u 14:00 na Ivan, IT, 091234567", Lang::Hr);
        assert_eq!(r.intent, Intent::BookAppointment);
        assert_eq!(r.confidence, 0.85);
        assert_eq!(
            r.entities,
            Entities {
                service: Some("it".into()),
                date: Some("17.09.".into()),
                time: Some("14:00".into()),
                name: Some("Ivan".into()),
                contact: Some("091234567".into()),
            }
        );
    }

    #[test]
    fn test_english_booking_with_us_date_and_email() {
        let r = recognizer().analyze(
            "book 09/17 at 15:30 for john smith, plumbing, john@example.com",
            Lang::En,
        );
        assert_eq!(r.intent, Intent::BookAppointment);
        assert_eq!(r.entities.date.as_deref(), Some("17.09."));
        assert_eq!(r.entities.time.as_deref(), Some("15:30"));
        assert_eq!(r.entities.name.as_deref(), Some("John Smith"));
        assert_eq!(r.entities.service.as_deref(), Some("vodo"));
        assert_eq!(r.entities.contact.as_deref(), Some("john@example.com"));
    }

    #[test]
    fn test_us_date_only_in_english() {
        let r = recognizer().analyze("rezerviraj 09/17", Lang::Hr);
        assert!(r.entities.date.is_none());
    }

    #[test]
    fn test_relative_dates() {
        let r = recognizer().analyze("rezerviraj sutra u 9", Lang::Hr);
        assert_eq!(r.entities.date.as_deref(), Some("18.09."));
        assert_eq!(r.entities.time.as_deref(), Some("09:00"));

        let r = recognizer().analyze("rezerviraj preksutra", Lang::Hr);
        assert_eq!(r.entities.date.as_deref(), Some("19.09."));

        let r = recognizer().analyze("book the day after tomorrow", Lang::En);
        assert_eq!(r.entities.date.as_deref(), Some("19.09."));

        let r = recognizer().analyze("book today", Lang::En);
        assert_eq!(r.entities.date.as_deref(), Some("17.09."));
    }

    #[test]
    fn test_dotted_time_is_not_read_from_a_date() {
        assert_eq!(extract_time("rezerviraj 17.09. u 14.30").as_deref(), Some("14:30"));
        assert_eq!(extract_time("rezerviraj 17.09."), None);
        assert_eq!(extract_time("u 9.15 sati").as_deref(), Some("09:15"));
    }

    #[test]
    fn test_time_variants() {
        assert_eq!(extract_time("at 14h30").as_deref(), Some("14:30"));
        assert_eq!(extract_time("oko 10h").as_deref(), Some("10:00"));
        assert_eq!(extract_time("book at 9").as_deref(), Some("09:00"));
        assert_eq!(extract_time("book at 9pm"), None);
        assert_eq!(extract_time("7:75"), None);
    }

    #[test]
    fn test_contact_skips_times_and_short_numbers() {
        assert_eq!(extract_contact("u 14:00 na Ivan").as_deref(), None);
        assert_eq!(
            extract_contact("zovite +385 91 234 5678 ili 12").as_deref(),
            Some("+385 91 234 5678")
        );
        assert_eq!(extract_contact("broj 12345").as_deref(), None);
    }

    #[test]
    fn test_name_stops_before_service_phrase() {
        let r = recognizer().analyze("rezerviraj na ime ana marić za klima", Lang::Hr);
        assert_eq!(r.entities.service.as_deref(), Some("klima"));
        assert_eq!(r.entities.name.as_deref(), Some("Ana Marić"));
    }

    #[test]
    fn test_show_variants() {
        let r = recognizer().analyze("prikaži rezervacije", Lang::Hr);
        assert_eq!((r.intent, r.confidence), (Intent::ShowAll, 0.8));

        let r = recognizer().analyze("prikaži rezervacije za 18.09.", Lang::Hr);
        assert_eq!(r.intent, Intent::ShowByDate);
        assert_eq!(r.entities.date.as_deref(), Some("18.09."));

        let r = recognizer().analyze("show reservations for tomorrow", Lang::En);
        assert_eq!(r.intent, Intent::ShowByDate);
        assert_eq!(r.entities.date.as_deref(), Some("18.09."));
    }

    #[test]
    fn test_check_slot() {
        let r = recognizer().analyze("provjeri termin 17.09. u 14:00", Lang::Hr);
        assert_eq!(r.intent, Intent::CheckSlot);
        assert_eq!(r.entities.date.as_deref(), Some("17.09."));
        assert_eq!(r.entities.time.as_deref(), Some("14:00"));
    }

    #[test]
    fn test_cancel_and_change_are_anchored() {
        let r = recognizer().analyze("cancel booking AB12-CD34", Lang::En);
        assert_eq!(r.intent, Intent::Cancel);
        let r = recognizer().analyze("promijeni rezervaciju AB12-CD34 u 18.09. u 10:00", Lang::Hr);
        assert_eq!(r.intent, Intent::Change);
        let r = recognizer().analyze("kako ste", Lang::Hr);
        assert_eq!(r.intent, Intent::None);
    }
}
