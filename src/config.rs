use std::env;

#[derive(Clone, Debug, Default)]
pub struct CluLangConfig {
    pub project: Option<String>,
    pub deployment: Option<String>,
    pub language: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct CluConfig {
    pub endpoint: String,
    pub key: String,
    pub project: String,
    pub deployment: String,
    pub hr: CluLangConfig,
    pub en: CluLangConfig,
    pub timeout_secs: u64,
}

impl CluConfig {
    pub fn is_configured(&self) -> bool {
        !self.endpoint.trim().is_empty() && !self.key.trim().is_empty()
    }

    pub fn for_lang(&self, lang: &str) -> &CluLangConfig {
        if lang == "en" {
            &self.en
        } else {
            &self.hr
        }
    }
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub default_language: String,
    pub default_nlu_mode: String,
    pub clu: CluConfig,
    pub admin_seed_username: String,
    pub admin_seed_password: String,
}

fn non_empty(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn clu_lang(prefix: &str) -> CluLangConfig {
    CluLangConfig {
        project: non_empty(&format!("CLU_{prefix}_PROJECT")),
        deployment: non_empty(&format!("CLU_{prefix}_DEPLOYMENT")),
        language: non_empty(&format!("CLU_{prefix}_LANGUAGE")),
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3978),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "terminbot.db".to_string()),
            default_language: env::var("DEFAULT_LANGUAGE").unwrap_or_else(|_| "hr".to_string()),
            default_nlu_mode: env::var("DEFAULT_NLU_MODE")
                .unwrap_or_else(|_| "local".to_string()),
            clu: CluConfig {
                endpoint: env::var("CLU_ENDPOINT").unwrap_or_default(),
                key: env::var("CLU_KEY").unwrap_or_default(),
                project: env::var("CLU_PROJECT").unwrap_or_default(),
                deployment: env::var("CLU_DEPLOYMENT").unwrap_or_default(),
                hr: clu_lang("HR"),
                en: clu_lang("EN"),
                timeout_secs: env::var("CLU_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(10),
            },
            admin_seed_username: env::var("ADMIN_SEED_USERNAME").unwrap_or_default(),
            admin_seed_password: env::var("ADMIN_SEED_PASSWORD").unwrap_or_default(),
        }
    }
}
