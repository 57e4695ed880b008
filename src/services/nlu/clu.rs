use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use super::IntentRecognizer;
use crate::config::CluConfig;
use crate::models::{Entities, Intent, IntentResult, Lang, NluMode};

const API_VERSION: &str = "2023-04-01";

#[derive(Debug, Deserialize)]
struct AnalyzeResponse {
    result: AnalyzeResult,
}

#[derive(Debug, Deserialize)]
struct AnalyzeResult {
    prediction: Prediction,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Prediction {
    top_intent: Option<String>,
    #[serde(default)]
    intents: Vec<ScoredIntent>,
    #[serde(default)]
    entities: Vec<EntitySpan>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScoredIntent {
    category: String,
    confidence_score: f64,
}

#[derive(Debug, Deserialize)]
struct EntitySpan {
    category: String,
    text: String,
}

/// Delegates to a conversational language understanding endpoint. Every
/// failure degrades to `Intent::None`.
pub struct CluRecognizer {
    config: CluConfig,
    client: reqwest::Client,
}

impl CluRecognizer {
    pub fn new(config: CluConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { config, client }
    }

    /// Project, deployment and language for `lang`, falling back to the
    /// shared values. `None` when no project or deployment is known.
    fn target(&self, lang: Lang) -> Option<(String, String, String)> {
        let per_lang = self.config.for_lang(lang.as_str());
        let pick = |specific: &Option<String>, shared: &str| {
            specific
                .clone()
                .unwrap_or_else(|| shared.to_string())
                .trim()
                .to_string()
        };

        let project = pick(&per_lang.project, &self.config.project);
        let deployment = pick(&per_lang.deployment, &self.config.deployment);
        if project.is_empty() || deployment.is_empty() {
            return None;
        }

        let language = per_lang
            .language
            .clone()
            .unwrap_or_else(|| lang.as_str().to_string());
        Some((project, deployment, language))
    }

    async fn analyze(
        &self,
        text: &str,
        project: &str,
        deployment: &str,
        language: &str,
    ) -> anyhow::Result<IntentResult> {
        let url = format!(
            "{}/language/:analyze-conversations?api-version={API_VERSION}",
            self.config.endpoint.trim().trim_end_matches('/')
        );

        let body = json!({
            "kind": "Conversation",
            "analysisInput": {
                "conversationItem": {
                    "text": text,
                    "id": "1",
                    "modality": "text",
                    "language": language,
                    "participantId": "user",
                }
            },
            "parameters": {
                "projectName": project,
                "deploymentName": deployment,
                "stringIndexType": "TextElement_V8",
            }
        });

        let resp = self
            .client
            .post(&url)
            .header("Ocp-Apim-Subscription-Key", self.config.key.trim())
            .json(&body)
            .send()
            .await
            .context("failed to call CLU endpoint")?;

        let status = resp.status();
        if !status.is_success() {
            anyhow::bail!("CLU endpoint returned {status}");
        }

        let data: AnalyzeResponse = resp
            .json()
            .await
            .context("failed to parse CLU response")?;

        Ok(to_intent_result(data.result.prediction))
    }
}

fn map_intent(label: &str) -> Intent {
    match label.to_lowercase().as_str() {
        "book" | "bookappointment" | "rezerviraj" => Intent::BookAppointment,
        "showall" | "showreservations" => Intent::ShowAll,
        "showbydate" => Intent::ShowByDate,
        "cancel" | "cancelreservation" => Intent::Cancel,
        "change" | "changereservation" => Intent::Change,
        "checkslot" => Intent::CheckSlot,
        _ => Intent::None,
    }
}

fn to_intent_result(prediction: Prediction) -> IntentResult {
    let top = prediction.top_intent.unwrap_or_default();

    let mut entities = Entities::default();
    for span in prediction.entities {
        let value = Some(span.text);
        match span.category.to_lowercase().as_str() {
            "date" => entities.date = value,
            "time" => entities.time = value,
            "service" => entities.service = value,
            "name" => entities.name = value,
            _ => {}
        }
    }

    let confidence = prediction
        .intents
        .iter()
        .find(|i| i.category.eq_ignore_ascii_case(&top))
        .map(|i| i.confidence_score)
        .unwrap_or(0.0);

    IntentResult {
        intent: map_intent(&top),
        entities,
        confidence,
    }
}

#[async_trait]
impl IntentRecognizer for CluRecognizer {
    fn mode(&self) -> NluMode {
        NluMode::Clu
    }

    fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    async fn recognize(&self, text: &str, lang: Lang) -> IntentResult {
        if !self.is_configured() || text.trim().is_empty() {
            return IntentResult::none();
        }
        let Some((project, deployment, language)) = self.target(lang) else {
            tracing::debug!(lang = lang.as_str(), "CLU project or deployment missing");
            return IntentResult::none();
        };

        match self.analyze(text, &project, &deployment, &language).await {
            Ok(result) => {
                tracing::debug!(
                    intent = result.intent.as_str(),
                    confidence = result.confidence,
                    "CLU prediction"
                );
                result
            }
            Err(e) => {
                tracing::warn!(error = %e, "CLU recognition failed");
                IntentResult::none()
            }
        }
    }
}
