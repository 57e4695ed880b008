use std::sync::LazyLock;

use chrono::{Datelike, NaiveDate, NaiveTime, Weekday};
use regex::Regex;

use crate::models::Lang;

/// Maximum appointments sharing one (day, time) slot across all users.
pub const MAX_PER_SLOT: i64 = 2;

pub const DEFAULT_DURATION_MINUTES: i64 = 60;

pub const OPENING_TIME: (u32, u32) = (8, 0);
pub const CLOSING_TIME: (u32, u32) = (18, 0);

/// Public holidays as (month, day); the same every year.
const HOLIDAYS: &[(u32, u32)] = &[
    (1, 1),
    (5, 1),
    (6, 22),
    (6, 25),
    (8, 5),
    (8, 15),
    (11, 1),
    (12, 25),
    (12, 26),
];

pub struct ServiceInfo {
    pub key: &'static str,
    pub duration_minutes: i64,
    pub name_hr: &'static str,
    pub name_en: &'static str,
}

pub const SERVICES: &[ServiceInfo] = &[
    ServiceInfo { key: "it", duration_minutes: 45, name_hr: "IT", name_en: "IT" },
    ServiceInfo { key: "vodo", duration_minutes: 60, name_hr: "Vodoinstalacija", name_en: "Plumbing" },
    ServiceInfo { key: "elektro", duration_minutes: 60, name_hr: "Električni uređaj", name_en: "Electrical device" },
    ServiceInfo { key: "klima", duration_minutes: 90, name_hr: "Klima", name_en: "Air conditioning" },
    ServiceInfo { key: "bravar", duration_minutes: 45, name_hr: "Bravar", name_en: "Locksmith" },
    ServiceInfo { key: "stolar", duration_minutes: 90, name_hr: "Stolar", name_en: "Carpenter" },
    ServiceInfo { key: "automehanicar", duration_minutes: 60, name_hr: "Automehaničar", name_en: "Auto mechanic" },
    ServiceInfo { key: "gips", duration_minutes: 90, name_hr: "Gips/Knauf", name_en: "Drywall/Knauf" },
    ServiceInfo { key: "rasvjeta", duration_minutes: 45, name_hr: "Rasvjeta", name_en: "Lighting" },
    ServiceInfo { key: "kucanski", duration_minutes: 60, name_hr: "Kućanski aparat", name_en: "Home appliance" },
];

// Order matters: the first group that matches wins.
static SYNONYMS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    [
        ("it", r"it|računalo|kompjuter|komp|laptop|pc|računar|computer|tech\s*support|softver|software|program|internet|network|wifi|lan|server"),
        ("vodo", r"vodoinstalacija|vodoinstalater|plumbing|pipe|curenje|odvod|odštopavanje|odstopavanje|slavina|pipe\s*leak|toilet|wc|faucet|tap|sink|odvodnja"),
        ("elektro", r"elektri\w+|struja|aparat|uređaj|uredaj|electrical|device|circuit|strujni|struja\s*kvar|spoj|utičnica|uticnica|prekidač|prekidac|wire|cable|lampica|elektronika"),
        ("klima", r"klima(\s*uređaj|\s*uredaj)?|air\s*cond|aircon|a/c|ac|klimatizacija|ventilacija|hladnjak\s*zrak|air\s*cooler"),
        ("bravar", r"bravar|locksmith|lock|klju\w+|brava|bravarski|ključ|key|door\s*lock|lock\s*repair|safe|lockout"),
        ("stolar", r"stolar|carpenter|woodwork|ormar|kuhinja|drvo|drven\w+|namještaj|namjestaj|wood|furniture|table|chair|wardrobe|kitchen"),
        ("automehanicar", r"automehaničar|automehanicar|mechanic|auto\s*mech|car\s*repair|servis\s*auta|automobil|vozilo|engine|motor|brake|kočnica|kocnica|ulje|oil\s*change"),
        ("gips", r"gips|knauf|drywall|rigips|pregradni\s*zid|zid\s*ploča|plasterboard|wallboard|gypsum|ceiling|strop|plafon"),
        ("rasvjeta", r"rasvjeta|svjetl\w+|lighting|lamp|luster|žarulja|zarulja|lightbulb|light\s*fixture|fluorescent|neon|light\s*switch"),
        ("kucanski", r"kućanski|kucanski|appliance|washer|dryer|fridge|dishwasher|microwave|stove|pećnica|pecnica|perilica|hladnjak|zamrzivač|zamrzivac|aparat\s*za\s*kavu|coffee\s*machine"),
    ]
    .into_iter()
    .map(|(key, pattern)| {
        let re = Regex::new(&format!(r"(?i)\b({pattern})\b")).expect("valid service regex");
        (key, re)
    })
    .collect()
});

fn service_info(key: &str) -> Option<&'static ServiceInfo> {
    SERVICES.iter().find(|s| s.key == key)
}

/// Maps free text to a catalog key: synonym groups first, in catalog order,
/// then an exact key match.
pub fn normalize_service(text: &str) -> Option<&'static str> {
    let t = text.trim().to_lowercase();
    if t.is_empty() {
        return None;
    }
    if let Some((key, _)) = SYNONYMS.iter().find(|(_, re)| re.is_match(&t)) {
        return Some(*key);
    }
    service_info(&t).map(|s| s.key)
}

/// Display name for a catalog key. Blank keys show as "-"; unknown keys pass through.
pub fn localize_service(key: &str, lang: Lang) -> String {
    if key.trim().is_empty() {
        return "-".to_string();
    }
    match service_info(key) {
        Some(s) if lang.is_en() => s.name_en.to_string(),
        Some(s) => s.name_hr.to_string(),
        None => key.to_string(),
    }
}

pub fn all_services(lang: Lang) -> Vec<&'static str> {
    SERVICES
        .iter()
        .map(|s| if lang.is_en() { s.name_en } else { s.name_hr })
        .collect()
}

pub fn service_list(lang: Lang) -> String {
    all_services(lang).join(", ")
}

pub fn default_duration_minutes(key: Option<&str>) -> i64 {
    key.and_then(service_info)
        .map(|s| s.duration_minutes)
        .unwrap_or(DEFAULT_DURATION_MINUTES)
}

pub fn is_business_day(date: NaiveDate) -> bool {
    if date.weekday() == Weekday::Sun {
        return false;
    }
    !HOLIDAYS.contains(&(date.month(), date.day()))
}

pub fn opening_time() -> NaiveTime {
    NaiveTime::from_hms_opt(OPENING_TIME.0, OPENING_TIME.1, 0).unwrap_or(NaiveTime::MIN)
}

pub fn closing_time() -> NaiveTime {
    NaiveTime::from_hms_opt(CLOSING_TIME.0, CLOSING_TIME.1, 0).unwrap_or(NaiveTime::MIN)
}

/// Opening time inclusive, closing time exclusive.
pub fn is_within_business_hours(time: NaiveTime) -> bool {
    time >= opening_time() && time < closing_time()
}

pub fn hours_display() -> (String, String) {
    (
        opening_time().format("%H:%M").to_string(),
        closing_time().format("%H:%M").to_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_plumbing_synonyms() {
        assert_eq!(normalize_service("vodoinstalacija"), Some("vodo"));
        assert_eq!(normalize_service("plumbing"), Some("vodo"));
        assert_eq!(normalize_service("curenje"), Some("vodo"));
        assert_eq!(normalize_service("  Slavina curi "), Some("vodo"));
    }

    #[test]
    fn test_normalizing_a_key_is_idempotent() {
        for s in SERVICES {
            assert_eq!(normalize_service(s.key), Some(s.key), "key {}", s.key);
        }
    }

    #[test]
    fn test_first_group_wins() {
        // "laptop" is IT even though nothing else matches; "aparat za kavu"
        // hits the electrical group ("aparat") before the appliance group.
        assert_eq!(normalize_service("laptop ne radi"), Some("it"));
        assert_eq!(normalize_service("aparat za kavu"), Some("elektro"));
        assert_eq!(normalize_service("klima uređaj"), Some("elektro"));
        assert_eq!(normalize_service("klima"), Some("klima"));
    }

    #[test]
    fn test_unknown_service() {
        assert_eq!(normalize_service("frizer"), None);
        assert_eq!(normalize_service(""), None);
        // Word boundaries: "itinerary" is not IT.
        assert_eq!(normalize_service("itinerary"), None);
    }

    #[test]
    fn test_localize_service() {
        assert_eq!(localize_service("vodo", Lang::En), "Plumbing");
        assert_eq!(localize_service("vodo", Lang::Hr), "Vodoinstalacija");
        assert_eq!(localize_service("", Lang::Hr), "-");
        assert_eq!(localize_service("nepoznato", Lang::En), "nepoznato");
        assert_eq!(all_services(Lang::En).len(), SERVICES.len());
    }

    #[test]
    fn test_durations() {
        assert_eq!(default_duration_minutes(Some("klima")), 90);
        assert_eq!(default_duration_minutes(Some("it")), 45);
        assert_eq!(default_duration_minutes(Some("unknown")), 60);
        assert_eq!(default_duration_minutes(None), 60);
    }

    #[test]
    fn test_business_days() {
        // 2025-09-17 is a Wednesday, 2025-09-21 a Sunday.
        assert!(is_business_day(date(2025, 9, 17)));
        assert!(!is_business_day(date(2025, 9, 21)));
        assert!(!is_business_day(date(2025, 12, 25)));
        assert!(!is_business_day(date(2031, 5, 1)));
        assert!(is_business_day(date(2025, 9, 20)));
    }

    #[test]
    fn test_business_hours_boundaries() {
        assert!(is_within_business_hours(time(8, 0)));
        assert!(is_within_business_hours(time(17, 59)));
        assert!(!is_within_business_hours(time(18, 0)));
        assert!(!is_within_business_hours(time(7, 59)));
    }
}
