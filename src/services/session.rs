use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::models::{Lang, NluMode, PendingAction};

#[derive(Debug, Clone, Default)]
struct UserSession {
    lang: Option<Lang>,
    mode: Option<NluMode>,
    admin: Option<String>,
    pending: Option<PendingAction>,
}

/// Per-user conversational state: language, NLU mode, admin login and the
/// pending by-code action. Entries live until explicitly changed or consumed.
pub struct SessionStore {
    default_lang: Lang,
    default_mode: NluMode,
    users: Mutex<HashMap<String, UserSession>>,
}

impl SessionStore {
    pub fn new(default_lang: Lang, default_mode: NluMode) -> Self {
        Self {
            default_lang,
            default_mode,
            users: Mutex::new(HashMap::new()),
        }
    }

    fn users(&self) -> MutexGuard<'_, HashMap<String, UserSession>> {
        self.users.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn lang(&self, user_id: &str) -> Lang {
        self.users()
            .get(user_id)
            .and_then(|s| s.lang)
            .unwrap_or(self.default_lang)
    }

    pub fn has_lang(&self, user_id: &str) -> bool {
        self.users()
            .get(user_id)
            .map(|s| s.lang.is_some())
            .unwrap_or(false)
    }

    pub fn set_lang(&self, user_id: &str, lang: Lang) {
        self.users().entry(user_id.to_string()).or_default().lang = Some(lang);
    }

    pub fn mode(&self, user_id: &str) -> NluMode {
        self.users()
            .get(user_id)
            .and_then(|s| s.mode)
            .unwrap_or(self.default_mode)
    }

    pub fn set_mode(&self, user_id: &str, mode: NluMode) {
        self.users().entry(user_id.to_string()).or_default().mode = Some(mode);
    }

    pub fn is_admin(&self, user_id: &str) -> bool {
        self.users()
            .get(user_id)
            .map(|s| s.admin.is_some())
            .unwrap_or(false)
    }

    pub fn admin_username(&self, user_id: &str) -> Option<String> {
        self.users().get(user_id).and_then(|s| s.admin.clone())
    }

    pub fn login_admin(&self, user_id: &str, username: &str) {
        self.users().entry(user_id.to_string()).or_default().admin = Some(username.to_string());
    }

    pub fn logout_admin(&self, user_id: &str) {
        if let Some(s) = self.users().get_mut(user_id) {
            s.admin = None;
        }
    }

    pub fn pending(&self, user_id: &str) -> Option<PendingAction> {
        self.users().get(user_id).and_then(|s| s.pending.clone())
    }

    /// Replaces any earlier pending action for this user.
    pub fn set_pending(&self, user_id: &str, action: PendingAction) {
        self.users().entry(user_id.to_string()).or_default().pending = Some(action);
    }

    pub fn take_pending(&self, user_id: &str) -> Option<PendingAction> {
        self.users().get_mut(user_id).and_then(|s| s.pending.take())
    }
}
