use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::config::AppConfig;
use crate::services::datetime::Clock;
use crate::services::nlu::Recognizers;
use crate::services::session::SessionStore;

pub struct AppState {
    pub db: Arc<Mutex<Connection>>,
    pub config: AppConfig,
    pub recognizers: Recognizers,
    pub sessions: SessionStore,
    pub clock: Arc<dyn Clock>,
}
