pub mod admin;
pub mod booking_code;
pub mod business_rules;
pub mod conversation;
pub mod datetime;
pub mod dialog;
pub mod i18n;
pub mod nlu;
pub mod password;
pub mod scheduling;
pub mod session;
