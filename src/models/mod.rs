pub mod admin;
pub mod appointment;
pub mod intent;
pub mod reservation;
pub mod session;

pub use admin::AdminUser;
pub use appointment::{Appointment, NewAppointment};
pub use intent::{Entities, Intent, IntentResult};
pub use reservation::{DialogSession, DialogStep, ReservationState};
pub use session::{Lang, NluMode, PendingAction, PendingKind};
