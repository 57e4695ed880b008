use chrono::{Datelike, Local, NaiveDate, NaiveTime};

/// Source of "today" for reference years and relative dates.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Always reports the same day. Used by tests.
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

/// Parses loose day text (`d.M.`, `dd.MM.`, `/` or `-` separators, trailing dot
/// optional) into `YYYY-MM-DD` in `reference_year`. Full dates
/// (`YYYY.MM.DD.` or `DD.MM.YYYY.`) are accepted too, with the year replaced
/// by `reference_year`.
pub fn to_iso_date(text: &str, reference_year: i32) -> Option<String> {
    let mut txt = text.trim().replace(['/', '-'], ".");
    if txt.is_empty() {
        return None;
    }
    if !txt.ends_with('.') {
        txt.push('.');
    }

    let parts: Vec<&str> = txt[..txt.len() - 1].split('.').collect();
    if parts.iter().any(|p| p.is_empty() || !p.chars().all(|c| c.is_ascii_digit())) {
        return None;
    }

    let (day, month) = match parts.as_slice() {
        [d, m] if d.len() <= 2 && m.len() <= 2 => (d.parse().ok()?, m.parse().ok()?),
        [y, m, d] if y.len() == 4 && m.len() <= 2 && d.len() <= 2 => {
            (d.parse().ok()?, m.parse().ok()?)
        }
        [d, m, y] if y.len() == 4 && d.len() <= 2 && m.len() <= 2 => {
            (d.parse().ok()?, m.parse().ok()?)
        }
        _ => return None,
    };

    NaiveDate::from_ymd_opt(reference_year, month, day).map(|d| d.format("%Y-%m-%d").to_string())
}

/// Parses `H:mm`, `H.mm`, `H-mm` or `HhMM` into `HH:mm`.
pub fn to_iso_time(text: &str) -> Option<String> {
    let txt = text.trim().replace(['.', '-', 'h', 'H'], ":");
    let (h, m) = txt.split_once(':')?;

    let valid = |s: &str| (1..=2).contains(&s.len()) && s.chars().all(|c| c.is_ascii_digit());
    if !valid(h) || !valid(m) {
        return None;
    }

    let hour: u32 = h.parse().ok()?;
    let minute: u32 = m.parse().ok()?;
    NaiveTime::from_hms_opt(hour, minute, 0).map(|t| t.format("%H:%M").to_string())
}

/// `YYYY-MM-DD` to `dd.MM.` for display; anything unparseable passes through.
pub fn pretty_date(iso_date: &str) -> String {
    if iso_date.trim().is_empty() {
        return String::new();
    }
    match NaiveDate::parse_from_str(iso_date.trim(), "%Y-%m-%d") {
        Ok(d) => d.format("%d.%m.").to_string(),
        Err(_) => iso_date.to_string(),
    }
}

pub fn parse_iso_date(iso_date: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(iso_date, "%Y-%m-%d").ok()
}

pub fn parse_iso_time(iso_time: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(iso_time, "%H:%M").ok()
}

pub fn reference_year(clock: &dyn Clock) -> i32 {
    clock.today().year()
}
