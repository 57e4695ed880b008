//! User-facing strings. Lookups never fail: a key missing in English falls
//! back to Croatian, and a key missing everywhere is returned as-is.

use std::collections::HashMap;
use std::fmt::Display;
use std::sync::LazyLock;

use crate::models::Lang;

const HR: &[(&str, &str)] = &[
    // reservation dialog
    ("prompt_service", "Koji tip problema imate? ({0})"),
    ("service_unrecognized", "Nisam prepoznao uslugu. Odaberi jednu od dolje ponuđenih."),
    ("prompt_date", "Za koji dan želite rezervaciju?"),
    ("date_invalid", "⛔ Datum nije prepoznat. Unesite **dd.MM.** (npr. 17.09.)."),
    ("date_closed", "⛔ Termin nije moguć za {0}. Ne radimo nedjeljom ni na državne praznike. Odaberite drugi dan."),
    ("prompt_time", "U koliko sati želite rezervaciju?"),
    ("time_invalid", "⛔ Vrijeme nije prepoznato. Unesite **HH:mm** (npr. 14:30)."),
    ("time_outside_hours", "⛔ Vrijeme {0} je izvan radnog vremena. Radimo **od {1} do {2}**."),
    ("prompt_name", "Molim vas, unesite svoje ime."),
    ("prompt_contact", "Unesite kontakt (telefon ili e-mail)."),
    ("contact_invalid", "⛔ Unesite ispravan **telefon** (9-12 znamenki, dopušteni + i razmaci) ili ispravan **e-mail**."),
    ("confirm_bad_date", "Nisam razumio datum. Molim unesite npr. 17.09."),
    ("confirm_bad_time", "Nisam razumio vrijeme. Unesite HH:mm (npr. 14:30)."),
    ("confirm_closed_day", "Termin nije moguć nedjeljom ili na praznik. Odaberite drugi dan."),
    ("confirm_outside_hours", "Radno vrijeme je od {0} do {1}."),
    ("confirm_unknown_service", "Nepoznata usluga. Dopuštene opcije: {0}"),
    ("slot_taken_for_user", "Taj termin ({0} u {1}) je već zauzet za vaš račun."),
    ("slot_full", "Nažalost, slot {0} u {1} je popunjen (max {2}). Odaberite drugi termin."),
    ("slot_overlap", "Termin {0} {1} ({2} min, {3}) se preklapa s postojećim."),
    ("slot_just_taken", "Taj termin je upravo zauzet. Molim odaberite drugi termin."),
    ("summary", "Molim potvrdi rezervaciju:\n• Datum: {0}\n• Vrijeme: {1}\n• Ime: {2}\n• Kontakt: {3}\n• Usluga: {4}\n\nOdgovori **da** za potvrdu ili **ne** za odustajanje."),
    ("reply_yes_no", "Molim odgovori **da** za potvrdu ili **ne** za odustajanje."),
    ("aborted", "Odustao/la si."),
    ("booking_code", "{0}\nje vaš kod rezervacije, možete ga iskoristiti kasnije za promjenu ili otkazivanje."),
    ("confirm", "Rezervacija potvrđena za {0} u {1} na ime {2}.\nVrsta usluge: {3}."),
    ("confirm_contact_line", "\nKontakt: {0}"),
    ("dialog_error", "[ERR] Došlo je do greške: {0}. Rezervacija nije spremljena."),
    // router
    ("pending_yes_no", "Molim potvrdi: **da** za nastavak ili **ne** za odustajanje."),
    ("code_not_found", "Nisam pronašao rezervaciju za taj kod."),
    ("cancelled", "Rezervacija za {0} u {1} je otkazana."),
    ("changed_to", "Rezervacija je promijenjena na {0} u {1}."),
    ("conversation_reset", "Razgovor je prekinut."),
    ("admin_login_ok", "✅ Admin prijava uspješna."),
    ("admin_login_failed", "⛔ Neispravni admin podaci."),
    ("admin_login_usage", "Upotreba: admin login <korisničko_ime> <lozinka>"),
    ("admin_logout", "🔒 Admin pristup isključen."),
    ("lang_set", "Jezik postavljen na hrvatski."),
    ("nlu_set_clu", "NLU način rada: CLU (cloud)."),
    ("nlu_set_regex", "NLU način rada: Regex."),
    ("nlu_set_local", "NLU način rada: Lokalni CLU."),
    ("nlu_is_clu", "NLU je trenutačno: CLU."),
    ("nlu_is_local", "NLU je trenutačno: LOCAL."),
    ("nlu_is_regex", "NLU je trenutačno: REGEX."),
    ("no_reservations", "Trenutno nema rezervacija."),
    ("no_reservations_for_day", "Nema rezervacija za {0}."),
    ("unknown_date", "Datum nije prepoznat. Unesite npr. 17.09."),
    ("list_line", "{0} {1} – {2}{3} | kod: {4}"),
    ("admin_list_line", "{0} {1} – {2} [{3}]{4} | kod: {5}{6}"),
    ("contact_suffix", " | kontakt: {0}"),
    ("slot_check_bad", "Nisam prepoznao datum ili vrijeme."),
    ("slot_check_free", "Termin {0} u {1} je SLOBODAN ({2}/{3})."),
    ("slot_check_full", "Termin {0} u {1} je POPUNJEN ({2}/{3})."),
    ("services_list", "Dostupne usluge: {0}"),
    ("menu_prompt", "Nisam siguran što želite, odaberite:"),
    ("action_book", "Rezerviraj"),
    ("action_book_value", "rezerviraj"),
    ("action_show", "Prikaži rezervacije"),
    ("action_show_value", "prikaži rezervacije"),
    ("action_services", "Usluge"),
    ("action_services_value", "usluge"),
    ("action_help", "Pomoć"),
    ("action_help_value", "pomoć"),
    ("intro", "👋 Bok! Mogu ti rezervirati, prikazati, promijeniti ili otkazati termin.\n\nPokušaj, npr.:\n• **rezerviraj 17.09. u 14:00 na Ivan, IT, 091234567**\n• **prikaži rezervacije**\n• **otkaži rezervaciju AB12-CD34**\n• **usluge** (popis dostupnih usluga)"),
    ("help", "Popis dostupnih naredbi:\nrezerviraj ...\nprikaži rezervacije\nmoje zadnje\notkaži rezervaciju [kod]\npromijeni rezervaciju [kod] u [datum] u [vrijeme]\nprovjeri termin [datum] u [vrijeme]\nusluge\nlanguage: hr\nlanguage: en\n--- Admin naredbe ---\nadmin login [username] [password]\nadmin logout\nadmin list all\nadmin list day [dd.MM.]\nadmin list range [dd.MM.]-[dd.MM.]\nadmin list service [naziv_usluge]\nadmin list user [userId]\nadmin cancel [kod]\nadmin change [kod] [dd.MM.] u [HH:mm]"),
    ("cancel_code_missing", "Molim upišite kod rezervacije, npr. **otkaži rezervaciju ABCD-1234**."),
    ("cancel_confirm_prompt", "Jesi li siguran/na da želiš otkazati **{0} u {1}**? Odgovori **da** za potvrdu ili **ne** za odustajanje."),
    ("change_usage", "Pokušaj: **promijeni rezervaciju ABCD-1234 u 17.09. u 15:00**"),
    ("change_parse_failed", "Ne mogu pročitati novi datum/vrijeme. Primjer: **promijeni rezervaciju ABCD-1234 u 17.09. u 15:00**"),
    ("change_confirm_prompt", "Promijeniti **{0}** na **{1} u {2}**? Odgovori **da** za potvrdu ili **ne** za odustajanje."),
    ("generic_error", "Došlo je do greške. Molim pokušajte ponovno."),
    // admin commands
    ("admin_help", "Dostupne admin komande:\n• admin list all\n• admin list day 22.09.\n• admin list range 17.09.-20.09.\n• admin list service vodoinstalacija\n• admin list user <UserId ili ime>\n• admin cancel 22.09. 10:00 <UserId>\n• admin cancel <kod>\n• admin change <kod> 22.09. u 10:00\n• admin logout"),
    ("admin_no_reservations", "Nema rezervacija."),
    ("admin_bad_day", "❌ Neispravan datum. Primjer: admin list day 22.09."),
    ("admin_no_reservations_for_day", "Nema rezervacija za {0}."),
    ("admin_bad_range", "❌ Neispravan raspon. Primjer: admin list range 17.09.-20.09."),
    ("admin_no_reservations_in_range", "Nema rezervacija u rasponu {0}-{1}."),
    ("admin_bad_service", "❌ Nepoznata usluga. Primjer: admin list service vodoinstalacija"),
    ("admin_no_reservations_for_service", "Nema rezervacija za tu uslugu."),
    ("admin_user_usage", "Primjer: admin list user 12345 ili admin list user Ivan"),
    ("admin_no_results", "Nema rezultata."),
    ("admin_cancel_usage", "Primjer: admin cancel 22.09. 10:00 USER_ID ili admin cancel 22.09. 10:00 Ime"),
    ("admin_bad_date", "❌ Neispravan datum."),
    ("admin_bad_time", "❌ Neispravno vrijeme."),
    ("admin_ambiguous_name", "⚠️ Više rezervacija na to ime za isti termin. Koristi UserId."),
    ("admin_not_found", "Nisam pronašao rezervaciju za taj termin i korisnika."),
    ("admin_cancelled", "Otkazano: {0} {1} – {2} [{3}]."),
    ("admin_change_usage", "Primjer: admin change ABCD-1234 22.09. u 10:00"),
    ("admin_changed", "Promijenjeno: {0} je sada {1} u {2}."),
];

const EN: &[(&str, &str)] = &[
    ("prompt_service", "What type of issue do you have? ({0})"),
    ("service_unrecognized", "I didn't recognize the service. Please choose one from the list below."),
    ("prompt_date", "For which day would you like to book?"),
    ("date_invalid", "⛔ Invalid date. Please enter **dd.MM.** (e.g., 17.09.)."),
    ("date_closed", "⛔ Bookings are not available on {0} (Sunday/holiday). Choose another day."),
    ("prompt_time", "At what time would you like to book?"),
    ("time_invalid", "⛔ Invalid time. Please enter **HH:mm** (e.g., 14:30)."),
    ("time_outside_hours", "⛔ Time {0} is outside working hours. We work **{1}-{2}**."),
    ("prompt_name", "Please enter your name."),
    ("prompt_contact", "Please enter your contact (phone or e-mail)."),
    ("contact_invalid", "⛔ Please enter a valid **phone** (9-12 digits, you can include + and spaces) or a valid **e-mail**."),
    ("confirm_bad_date", "I couldn't understand the date. Try e.g. 17.09."),
    ("confirm_bad_time", "I couldn't understand the time. Use HH:mm (e.g., 14:30)."),
    ("confirm_closed_day", "Bookings are not available on Sundays or public holidays. Pick another day."),
    ("confirm_outside_hours", "Working hours are from {0} to {1}."),
    ("confirm_unknown_service", "Unknown service. Valid options: {0}"),
    ("slot_taken_for_user", "That slot ({0} at {1}) is already taken for your account."),
    ("slot_full", "Slot {0} at {1} is full (max {2}). Choose another time."),
    ("slot_overlap", "The time {0} {1} ({2} min, {3}) overlaps with an existing booking."),
    ("slot_just_taken", "That slot was just taken. Please choose another time."),
    ("summary", "Please confirm your booking:\n• Date: {0}\n• Time: {1}\n• Name: {2}\n• Contact: {3}\n• Service: {4}\n\nReply **yes** to confirm or **no** to cancel."),
    ("reply_yes_no", "Please reply **yes** to confirm or **no** to cancel."),
    ("aborted", "Cancelled."),
    ("booking_code", "{0}\nis your reservation code, you can use this code later to change or cancel your booking."),
    ("confirm", "Booking confirmed for {0} at {1} under the name {2}.\nService type: {3}."),
    ("confirm_contact_line", "\nContact: {0}"),
    ("dialog_error", "[ERR] Something went wrong: {0}. The booking was not saved."),
    ("pending_yes_no", "Please confirm: **yes** to proceed or **no** to abort."),
    ("code_not_found", "I couldn't find a reservation for that code."),
    ("cancelled", "Reservation for {0} at {1} has been cancelled."),
    ("changed_to", "Reservation changed to {0} at {1}."),
    ("conversation_reset", "Conversation reset."),
    ("admin_login_ok", "✅ Admin login successful."),
    ("admin_login_failed", "⛔ Invalid admin credentials."),
    ("admin_login_usage", "Use: admin login <username> <password>"),
    ("admin_logout", "🔒 Admin access disabled."),
    ("lang_set", "Language set to English."),
    ("nlu_set_clu", "NLU mode: CLU (cloud)."),
    ("nlu_set_regex", "NLU mode: Regex."),
    ("nlu_set_local", "NLU mode: Local."),
    ("nlu_is_clu", "NLU is currently: CLU."),
    ("nlu_is_local", "NLU is currently: LOCAL."),
    ("nlu_is_regex", "NLU is currently: REGEX."),
    ("no_reservations", "There are no reservations."),
    ("no_reservations_for_day", "No reservations for {0}."),
    ("unknown_date", "I couldn't understand the date. Try e.g. 17.09."),
    ("list_line", "{0} {1} – {2}{3} | code: {4}"),
    ("admin_list_line", "{0} {1} – {2} [{3}]{4} | code: {5}{6}"),
    ("contact_suffix", " | contact: {0}"),
    ("slot_check_bad", "I couldn't understand the date or time."),
    ("slot_check_free", "Slot {0} at {1} is FREE ({2}/{3})."),
    ("slot_check_full", "Slot {0} at {1} is FULL ({2}/{3})."),
    ("services_list", "Available services: {0}"),
    ("menu_prompt", "Not sure what you meant, pick one:"),
    ("action_book", "Book"),
    ("action_book_value", "book"),
    ("action_show", "Show reservations"),
    ("action_show_value", "show reservations"),
    ("action_services", "Services"),
    ("action_services_value", "services"),
    ("action_help", "Help"),
    ("action_help_value", "help"),
    ("intro", "👋 Hi! I can book, list, change or cancel your appointments.\n\nTry for example:\n• **book 09/17 at 14:00 for John, IT, 091234567**\n• **show reservations**\n• **cancel reservation AB12-CD34**\n• **services** (show available service types)"),
    ("help", "List of available commands:\nbook ...\nshow reservations\nmy last\ncancel reservation [code]\nchange reservation [code] to [date] at [time]\ncheck slot [date] at [time]\nservices\nlanguage: hr\nlanguage: en\n--- Admin commands ---\nadmin login [username] [password]\nadmin logout\nadmin list all\nadmin list day [dd.MM.]\nadmin list range [dd.MM.]-[dd.MM.]\nadmin list service [service_name]\nadmin list user [userId]\nadmin cancel [code]\nadmin change [code] [dd.MM.] at [HH:mm]"),
    ("cancel_code_missing", "Please provide a booking code, e.g. **cancel reservation ABCD-1234**."),
    ("cancel_confirm_prompt", "Are you sure you want to cancel **{0} at {1}**? Reply **yes** to confirm or **no** to abort."),
    ("change_usage", "Try: **change reservation ABCD-1234 to 17.09. at 15:00**"),
    ("change_parse_failed", "Couldn't parse the new date/time. Example: **change reservation ABCD-1234 to 17.09. at 15:00**"),
    ("change_confirm_prompt", "Change **{0}** to **{1} at {2}**? Reply **yes** to confirm or **no** to abort."),
    ("generic_error", "Something went wrong. Please try again."),
    ("admin_help", "Available admin commands:\n• admin list all\n• admin list day 22.09.\n• admin list range 17.09.-20.09.\n• admin list service plumbing\n• admin list user <UserId or name>\n• admin cancel 22.09. 10:00 <UserId>\n• admin cancel <code>\n• admin change <code> 22.09. at 10:00\n• admin logout"),
    ("admin_no_reservations", "No reservations."),
    ("admin_bad_day", "❌ Invalid date. Example: admin list day 22.09."),
    ("admin_no_reservations_for_day", "No reservations for {0}."),
    ("admin_bad_range", "❌ Invalid range. Example: admin list range 17.09.-20.09."),
    ("admin_no_reservations_in_range", "No reservations between {0} and {1}."),
    ("admin_bad_service", "❌ Unknown service. Example: admin list service plumbing"),
    ("admin_no_reservations_for_service", "No reservations for that service."),
    ("admin_user_usage", "Example: admin list user 12345 or admin list user Ivan"),
    ("admin_no_results", "No results."),
    ("admin_cancel_usage", "Example: admin cancel 22.09. 10:00 USER_ID or admin cancel 22.09. 10:00 Name"),
    ("admin_bad_date", "❌ Invalid date."),
    ("admin_bad_time", "❌ Invalid time."),
    ("admin_ambiguous_name", "⚠️ Several bookings under that name for the same slot. Use the UserId."),
    ("admin_not_found", "No reservation found for that slot and user."),
    ("admin_cancelled", "Cancelled: {0} {1} – {2} [{3}]."),
    ("admin_change_usage", "Example: admin change ABCD-1234 22.09. at 10:00"),
    ("admin_changed", "Changed: {0} is now {1} at {2}."),
];

static TABLES: LazyLock<HashMap<&'static str, HashMap<&'static str, &'static str>>> =
    LazyLock::new(|| {
        HashMap::from([
            ("hr", HR.iter().copied().collect()),
            ("en", EN.iter().copied().collect()),
        ])
    });

fn lookup(lang: &str, key: &str) -> Option<&'static str> {
    TABLES.get(lang).and_then(|t| t.get(key)).copied()
}

pub fn text(lang: Lang, key: &str) -> String {
    lookup(lang.as_str(), key)
        .or_else(|| lookup("hr", key))
        .map(str::to_string)
        .unwrap_or_else(|| key.to_string())
}

/// Substitutes positional `{0}`, `{1}`, ... placeholders.
pub fn format(lang: Lang, key: &str, args: &[&dyn Display]) -> String {
    let mut out = text(lang, key);
    for (i, arg) in args.iter().enumerate() {
        out = out.replace(&format!("{{{i}}}"), &arg.to_string());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_per_language() {
        assert_eq!(text(Lang::Hr, "lang_set"), "Jezik postavljen na hrvatski.");
        assert_eq!(text(Lang::En, "lang_set"), "Language set to English.");
    }

    #[test]
    fn test_missing_key_falls_back() {
        assert_eq!(text(Lang::En, "does_not_exist"), "does_not_exist");
    }

    #[test]
    fn test_format_positional() {
        assert_eq!(
            format(Lang::En, "cancelled", &[&"17.09.", &"14:00"]),
            "Reservation for 17.09. at 14:00 has been cancelled."
        );
        assert_eq!(
            format(Lang::Hr, "slot_full", &[&"17.09.", &"14:00", &2]),
            "Nažalost, slot 17.09. u 14:00 je popunjen (max 2). Odaberite drugi termin."
        );
    }

    #[test]
    fn test_every_english_key_exists_in_croatian() {
        let hr: Vec<&str> = HR.iter().map(|(k, _)| *k).collect();
        for (key, _) in EN {
            assert!(hr.contains(key), "missing hr key {key}");
        }
        assert_eq!(HR.len(), EN.len());
    }
}
