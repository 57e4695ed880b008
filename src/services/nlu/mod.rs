pub mod clu;
pub mod local;
pub mod pattern;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::CluConfig;
use crate::models::{Intent, IntentResult, Lang, NluMode};
use crate::services::datetime::Clock;

use self::clu::CluRecognizer;
use self::local::LocalRecognizer;
use self::pattern::PatternRecognizer;

/// Text to intent plus slots. Implementations never fail: anything they
/// cannot handle comes back as `Intent::None` with zero confidence.
#[async_trait]
pub trait IntentRecognizer: Send + Sync {
    fn mode(&self) -> NluMode;

    fn is_configured(&self) -> bool {
        true
    }

    async fn recognize(&self, text: &str, lang: Lang) -> IntentResult;
}

pub struct Recognizers {
    pub pattern: Box<dyn IntentRecognizer>,
    pub local: Box<dyn IntentRecognizer>,
    pub cloud: Box<dyn IntentRecognizer>,
}

impl Recognizers {
    pub fn new(clu: CluConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            pattern: Box::new(PatternRecognizer),
            local: Box::new(LocalRecognizer::new(clock)),
            cloud: Box::new(CluRecognizer::new(clu)),
        }
    }

    /// Cloud mode without configuration falls back to the pattern recognizer.
    pub fn select(&self, mode: NluMode) -> &dyn IntentRecognizer {
        match mode {
            NluMode::Local => self.local.as_ref(),
            NluMode::Clu if self.cloud.is_configured() => self.cloud.as_ref(),
            NluMode::Clu | NluMode::Regex => self.pattern.as_ref(),
        }
    }

    /// Runs the recognizer for `mode`. When it is not the local one and a
    /// booking or show-by-date result is missing slots, the local recognizer
    /// fills the blanks without overwriting anything already found.
    pub async fn recognize(&self, mode: NluMode, text: &str, lang: Lang) -> IntentResult {
        let primary = self.select(mode);
        let mut result = primary.recognize(text, lang).await;

        if primary.mode() == NluMode::Local {
            return result;
        }

        match result.intent {
            Intent::BookAppointment if result.entities.is_incomplete() => {
                let extra = self.local.recognize(text, lang).await;
                result.entities.fill_missing_from(&extra.entities);
            }
            Intent::ShowByDate if crate::models::intent::is_blank(&result.entities.date) => {
                let extra = self.local.recognize(text, lang).await;
                result.entities.date = extra.entities.date;
            }
            _ => {}
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::models::Entities;
    use crate::services::datetime::FixedClock;

    struct StubCloud(IntentResult);

    #[async_trait]
    impl IntentRecognizer for StubCloud {
        fn mode(&self) -> NluMode {
            NluMode::Clu
        }

        async fn recognize(&self, _text: &str, _lang: Lang) -> IntentResult {
            self.0.clone()
        }
    }

    fn recognizers(cloud: IntentResult) -> Recognizers {
        let clock: Arc<dyn Clock> = Arc::new(FixedClock(NaiveDate::from_ymd_opt(2025, 9, 17).unwrap()));
        Recognizers {
            pattern: Box::new(PatternRecognizer),
            local: Box::new(LocalRecognizer::new(clock)),
            cloud: Box::new(StubCloud(cloud)),
        }
    }

    #[tokio::test]
    async fn test_unconfigured_cloud_falls_back_to_pattern() {
        let clock: Arc<dyn Clock> = Arc::new(FixedClock(NaiveDate::from_ymd_opt(2025, 9, 17).unwrap()));
        let r = Recognizers::new(CluConfig::default(), clock);
        assert_eq!(r.select(NluMode::Clu).mode(), NluMode::Regex);
        assert_eq!(r.select(NluMode::Local).mode(), NluMode::Local);
    }

    #[tokio::test]
    async fn test_pattern_booking_is_filled_from_local() {
        let r = recognizers(IntentResult::none());
        let result = r
            .recognize(
                NluMode::Regex,
                "rezerviraj 17.09. u 14:00 na Ivan, IT, 091234567",
                Lang::Hr,
            )
            .await;
        assert_eq!(result.intent, Intent::BookAppointment);
        assert_eq!(result.confidence, 0.8);
        assert_eq!(result.entities.service.as_deref(), Some("it"));
        assert_eq!(result.entities.date.as_deref(), Some("17.09."));
        assert_eq!(result.entities.contact.as_deref(), Some("091234567"));
    }

    #[tokio::test]
    async fn test_cloud_values_win_over_local() {
        let cloud = IntentResult {
            intent: Intent::BookAppointment,
            entities: Entities {
                service: Some("klima".into()),
                ..Default::default()
            },
            confidence: 0.93,
        };
        let r = recognizers(cloud);
        let result = r
            .recognize(NluMode::Clu, "book 17.09. at 14:00 for John, IT, 091234567", Lang::En)
            .await;
        assert_eq!(result.entities.service.as_deref(), Some("klima"));
        assert_eq!(result.entities.time.as_deref(), Some("14:00"));
        assert_eq!(result.entities.name.as_deref(), Some("John"));
        assert_eq!(result.confidence, 0.93);
    }

    #[tokio::test]
    async fn test_show_by_date_fills_only_date() {
        let cloud = IntentResult::new(Intent::ShowByDate, 0.7);
        let r = recognizers(cloud);
        let result = r
            .recognize(NluMode::Clu, "show reservations for tomorrow at 10:00", Lang::En)
            .await;
        assert_eq!(result.entities.date.as_deref(), Some("18.09."));
        assert!(result.entities.time.is_none());
    }
}
