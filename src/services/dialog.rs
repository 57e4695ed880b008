use std::sync::LazyLock;

use regex::Regex;
use rusqlite::Connection;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{DialogSession, DialogStep, Lang, NewAppointment, ReservationState};
use crate::services::booking_code::new_code;
use crate::services::business_rules::{
    hours_display, is_business_day, is_within_business_hours, localize_service, normalize_service,
    service_list,
};
use crate::services::datetime::{
    parse_iso_date, parse_iso_time, pretty_date, reference_year, to_iso_date, to_iso_time, Clock,
};
use crate::services::i18n;
use crate::services::nlu::local::is_phone;
use crate::services::scheduling::check_slot_conflicts;

const CODE_ATTEMPTS: usize = 3;

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));

pub(crate) fn is_yes(text: &str) -> bool {
    matches!(
        text.trim().to_lowercase().as_str(),
        "da" | "yes" | "y" | "ok" | "potvrdi" | "confirm"
    )
}

pub(crate) fn is_no(text: &str) -> bool {
    matches!(
        text.trim().to_lowercase().as_str(),
        "ne" | "no" | "n" | "odustani" | "cancel"
    )
}

fn is_valid_contact(text: &str) -> bool {
    let t = text.trim();
    if EMAIL.is_match(t) {
        return true;
    }
    let allowed = t
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | ' ' | '-' | '(' | ')' | '/'));
    allowed && is_phone(t)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogOutcome {
    /// Suspended on a prompt; the next message resumes it.
    Waiting(DialogStep),
    Completed { booking_code: String },
    Aborted,
}

#[derive(Debug, Clone)]
pub struct DialogTurn {
    pub messages: Vec<String>,
    pub outcome: DialogOutcome,
}

impl DialogTurn {
    pub fn is_active(&self) -> bool {
        matches!(self.outcome, DialogOutcome::Waiting(_))
    }
}

/// Collects and validates the reservation slots for one user, one message at
/// a time. The suspended position lives in the `dialogs` table.
pub struct ReservationDialog<'a> {
    conn: &'a Connection,
    clock: &'a dyn Clock,
    user_id: &'a str,
    lang: Lang,
}

impl<'a> ReservationDialog<'a> {
    pub fn new(conn: &'a Connection, clock: &'a dyn Clock, user_id: &'a str, lang: Lang) -> Self {
        Self {
            conn,
            clock,
            user_id,
            lang,
        }
    }

    /// Starts a dialog, skipping every step whose slot is already seeded.
    pub fn begin(&self, seed: ReservationState) -> anyhow::Result<DialogTurn> {
        let mut messages = vec![];
        let result = self.run_from(DialogStep::AskService, seed, &mut messages);
        self.finish(result, messages)
    }

    /// Feeds `answer` to the step the dialog is suspended on.
    pub fn resume(&self, session: DialogSession, answer: &str) -> anyhow::Result<DialogTurn> {
        let mut messages = vec![];
        let result = self.answer(session.step, session.reservation, answer, &mut messages);
        self.finish(result, messages)
    }

    fn finish(
        &self,
        result: anyhow::Result<(DialogOutcome, ReservationState)>,
        mut messages: Vec<String>,
    ) -> anyhow::Result<DialogTurn> {
        let outcome = match result {
            Ok((DialogOutcome::Waiting(step), reservation)) => {
                queries::save_dialog(
                    self.conn,
                    &DialogSession {
                        user_id: self.user_id.to_string(),
                        step,
                        reservation,
                    },
                )?;
                DialogOutcome::Waiting(step)
            }
            Ok((outcome, _)) => {
                queries::clear_dialog(self.conn, self.user_id)?;
                outcome
            }
            Err(e) => {
                tracing::error!(user_id = self.user_id, error = %e, "reservation dialog failed");
                queries::clear_dialog(self.conn, self.user_id)?;
                messages.push(i18n::format(self.lang, "dialog_error", &[&e]));
                DialogOutcome::Aborted
            }
        };

        Ok(DialogTurn { messages, outcome })
    }

    fn say(&self, out: &mut Vec<String>, key: &str) {
        out.push(i18n::text(self.lang, key));
    }

    fn answer(
        &self,
        step: DialogStep,
        mut res: ReservationState,
        answer: &str,
        out: &mut Vec<String>,
    ) -> anyhow::Result<(DialogOutcome, ReservationState)> {
        let answer = answer.trim();
        let next = match step {
            DialogStep::AskService => match normalize_service(answer) {
                Some(key) => {
                    res.service_type = Some(key.to_string());
                    DialogStep::AskDay
                }
                None => {
                    self.say(out, "service_unrecognized");
                    res.service_type = None;
                    DialogStep::AskService
                }
            },
            DialogStep::AskDay => match self.validate_day(answer) {
                Ok(day) => {
                    res.day = Some(day);
                    DialogStep::AskTime
                }
                Err(msg) => {
                    out.push(msg);
                    return Ok((DialogOutcome::Waiting(DialogStep::AskDay), res));
                }
            },
            DialogStep::AskTime => match self.validate_time(answer) {
                Ok(time) => {
                    res.time = Some(time);
                    DialogStep::AskName
                }
                Err(msg) => {
                    out.push(msg);
                    return Ok((DialogOutcome::Waiting(DialogStep::AskTime), res));
                }
            },
            DialogStep::AskName => {
                res.name = Some(answer.to_string());
                DialogStep::AskContact
            }
            DialogStep::AskContact => {
                if !is_valid_contact(answer) {
                    self.say(out, "contact_invalid");
                    return Ok((DialogOutcome::Waiting(DialogStep::AskContact), res));
                }
                res.contact = Some(answer.to_string());
                DialogStep::ConfirmSummary
            }
            DialogStep::ConfirmSummary | DialogStep::Save => {
                if is_no(answer) {
                    self.say(out, "aborted");
                    return Ok((DialogOutcome::Aborted, res));
                }
                if !is_yes(answer) {
                    // Re-run from the top: every slot is filled, so this
                    // re-checks and shows the summary again.
                    self.say(out, "reply_yes_no");
                    DialogStep::AskService
                } else {
                    return self.save(res, out);
                }
            }
        };

        self.run_from(next, res, out)
    }

    /// Walks forward from `step`, skipping filled slots, until a prompt is
    /// needed or the confirm checks end the dialog.
    fn run_from(
        &self,
        step: DialogStep,
        mut res: ReservationState,
        out: &mut Vec<String>,
    ) -> anyhow::Result<(DialogOutcome, ReservationState)> {
        let mut step = step;
        loop {
            step = match step {
                DialogStep::AskService => {
                    let known = res.service_type.as_deref().and_then(normalize_service);
                    res.service_type = known.map(str::to_string);
                    if known.is_none() {
                        out.push(i18n::format(self.lang, "prompt_service", &[&service_list(self.lang)]));
                        return Ok((DialogOutcome::Waiting(DialogStep::AskService), res));
                    }
                    DialogStep::AskDay
                }
                DialogStep::AskDay => {
                    if !res.has_day() {
                        self.say(out, "prompt_date");
                        return Ok((DialogOutcome::Waiting(DialogStep::AskDay), res));
                    }
                    DialogStep::AskTime
                }
                DialogStep::AskTime => {
                    if !res.has_time() {
                        self.say(out, "prompt_time");
                        return Ok((DialogOutcome::Waiting(DialogStep::AskTime), res));
                    }
                    DialogStep::AskName
                }
                DialogStep::AskName => {
                    if !res.has_name() {
                        self.say(out, "prompt_name");
                        return Ok((DialogOutcome::Waiting(DialogStep::AskName), res));
                    }
                    DialogStep::AskContact
                }
                DialogStep::AskContact => {
                    if !res.has_contact() {
                        self.say(out, "prompt_contact");
                        return Ok((DialogOutcome::Waiting(DialogStep::AskContact), res));
                    }
                    DialogStep::ConfirmSummary
                }
                DialogStep::ConfirmSummary => return self.confirm_summary(res, out),
                DialogStep::Save => return Ok((DialogOutcome::Waiting(DialogStep::Save), res)),
            };
        }
    }

    fn validate_day(&self, answer: &str) -> Result<String, String> {
        let year = reference_year(self.clock);
        let Some(date) = to_iso_date(answer, year).as_deref().and_then(parse_iso_date) else {
            return Err(i18n::text(self.lang, "date_invalid"));
        };
        let day = date.format("%d.%m.").to_string();
        if !is_business_day(date) {
            return Err(i18n::format(self.lang, "date_closed", &[&day]));
        }
        Ok(day)
    }

    fn validate_time(&self, answer: &str) -> Result<String, String> {
        let Some(hhmm) = to_iso_time(answer) else {
            return Err(i18n::text(self.lang, "time_invalid"));
        };
        let within = parse_iso_time(&hhmm)
            .map(is_within_business_hours)
            .unwrap_or(false);
        if !within {
            let (open, close) = hours_display();
            return Err(i18n::format(
                self.lang,
                "time_outside_hours",
                &[&hhmm, &open, &close],
            ));
        }
        Ok(hhmm)
    }

    /// Re-validates every slot against the calendar and the stored
    /// appointments. The first failure aborts; otherwise the slots are
    /// canonicalized and the summary goes out.
    fn confirm_summary(
        &self,
        mut res: ReservationState,
        out: &mut Vec<String>,
    ) -> anyhow::Result<(DialogOutcome, ReservationState)> {
        let year = reference_year(self.clock);

        let Some(day_iso) = res.day.as_deref().and_then(|d| to_iso_date(d, year)) else {
            self.say(out, "confirm_bad_date");
            return Ok((DialogOutcome::Aborted, res));
        };
        let Some(time_iso) = res.time.as_deref().and_then(to_iso_time) else {
            self.say(out, "confirm_bad_time");
            return Ok((DialogOutcome::Aborted, res));
        };

        if !parse_iso_date(&day_iso).map(is_business_day).unwrap_or(false) {
            self.say(out, "confirm_closed_day");
            return Ok((DialogOutcome::Aborted, res));
        }
        if !parse_iso_time(&time_iso)
            .map(is_within_business_hours)
            .unwrap_or(false)
        {
            let (open, close) = hours_display();
            out.push(i18n::format(self.lang, "confirm_outside_hours", &[&open, &close]));
            return Ok((DialogOutcome::Aborted, res));
        }

        let Some(service_key) = res.service_type.as_deref().and_then(normalize_service) else {
            out.push(i18n::format(
                self.lang,
                "confirm_unknown_service",
                &[&service_list(self.lang)],
            ));
            return Ok((DialogOutcome::Aborted, res));
        };

        if let Some(conflict) = check_slot_conflicts(
            self.conn,
            self.user_id,
            &day_iso,
            &time_iso,
            Some(service_key),
            None,
        )? {
            tracing::info!(
                user_id = self.user_id,
                day = %day_iso,
                time = %time_iso,
                conflict = ?conflict,
                "slot rejected"
            );
            out.push(conflict.message(self.lang, &day_iso, &time_iso, Some(service_key)));
            return Ok((DialogOutcome::Aborted, res));
        }

        let name = res.name.as_deref().unwrap_or_default().trim().to_string();
        let contact = res.contact.as_deref().unwrap_or_default().trim().to_string();
        out.push(i18n::format(
            self.lang,
            "summary",
            &[
                &pretty_date(&day_iso),
                &time_iso,
                &name,
                &contact,
                &localize_service(service_key, self.lang),
            ],
        ));

        res.day = Some(day_iso);
        res.time = Some(time_iso);
        res.service_type = Some(service_key.to_string());
        res.name = Some(name);
        res.contact = Some(contact);
        Ok((DialogOutcome::Waiting(DialogStep::Save), res))
    }

    fn save(
        &self,
        res: ReservationState,
        out: &mut Vec<String>,
    ) -> anyhow::Result<(DialogOutcome, ReservationState)> {
        let (Some(day_iso), Some(time_iso)) = (res.day.clone(), res.time.clone()) else {
            anyhow::bail!("reservation is missing its day or time");
        };
        let contact = res.contact.clone().filter(|c| !c.trim().is_empty());

        let mut booked = None;
        for _ in 0..CODE_ATTEMPTS {
            let code = new_code();
            if queries::booking_code_exists(self.conn, &code)? {
                continue;
            }

            let appt = NewAppointment {
                user_id: self.user_id.to_string(),
                user_name: res.name.clone(),
                contact: contact.clone(),
                service_type: res.service_type.clone(),
                day_iso: day_iso.clone(),
                time_iso: time_iso.clone(),
                booking_code: code.clone(),
            };

            match queries::insert_appointment(self.conn, &appt) {
                Ok(_) => {
                    booked = Some(code);
                    break;
                }
                Err(e) => match e.downcast_ref::<AppError>() {
                    Some(err) if err.is_booking_code_conflict() => continue,
                    Some(AppError::Conflict(reason)) => {
                        tracing::warn!(
                            user_id = self.user_id,
                            day = %day_iso,
                            time = %time_iso,
                            reason = %reason,
                            "slot taken between confirm and save"
                        );
                        self.say(out, "slot_just_taken");
                        return Ok((DialogOutcome::Aborted, res));
                    }
                    _ => return Err(e),
                },
            }
        }

        let Some(code) = booked else {
            anyhow::bail!("could not allocate a unique booking code");
        };

        tracing::info!(
            user_id = self.user_id,
            code = %code,
            day = %day_iso,
            time = %time_iso,
            "appointment booked"
        );

        let service = localize_service(res.service_type.as_deref().unwrap_or_default(), self.lang);
        let name = res.name.clone().unwrap_or_default();
        let mut confirmation = i18n::format(
            self.lang,
            "confirm",
            &[&pretty_date(&day_iso), &time_iso, &name, &service],
        );
        if let Some(contact) = &contact {
            confirmation.push_str(&i18n::format(self.lang, "confirm_contact_line", &[contact]));
        }

        out.push(i18n::format(self.lang, "booking_code", &[&code]));
        out.push(confirmation);

        Ok((DialogOutcome::Completed { booking_code: code }, res))
    }
}
