use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Deserialize;
use serde_json::{Value, json};
use shared::{Recommendation, Severity, Treatment};

use super::{DetectionError, DetectionResult};

const GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta/models";

const ANALYSIS_PROMPT: &str = r#"You are an agricultural advisor helping farmers. Analyze this plant image and provide a disease diagnosis in SIMPLE language a farmer with basic education can understand. Avoid scientific terms.

Respond ONLY in valid JSON format (no markdown, no extra text):

{
  "disease_name": "Tomato Early blight",
  "confidence": 85.5,
  "crop_type": "Tomato",
  "severity": "Medium",
  "description": "Your plant leaves have brown spots and are turning yellow. This disease spreads when leaves stay wet."
}

Guidelines:
- disease_name: simple names with spaces, NOT underscores
- crop_type: simple crop name (Tomato, Potato, Corn, ...)
- severity: Low (just starting), Medium (spreading), High (very bad)
- description: short sentences about what the farmer can SEE and what will HAPPEN; say "fungus" or "germs", never "pathogen"

Provide ONLY the JSON response."#;

fn recommendation_prompt(disease_name: &str, crop_type: &str) -> String {
    format!(
        r#"You are helping a farmer treat a crop disease. Use SIMPLE language. Give REAL medicine names available in local agriculture shops.

Disease: {disease_name}
Crop: {crop_type}

Respond ONLY in JSON format (no markdown):
{{
  "chemical_treatment": {{
    "name": "Medicine name",
    "active_ingredient": "Main ingredient",
    "description": "What it does in simple words",
    "application_steps": "Numbered simple steps with quantities",
    "where_to_buy": "Local fertilizer shop, Krishi Kendra, agri apps",
    "precautions": "Wear gloves. Don't spray in afternoon sun."
  }},
  "organic_treatment": {{
    "name": "Natural treatment such as Neem oil",
    "ingredients": "What you need",
    "description": "How it helps the plant",
    "application_steps": "Numbered simple steps",
    "effectiveness": "When results show"
  }},
  "preventive_measures": [
    "Remove bad leaves from the plant",
    "Water the soil, not the leaves",
    "Keep space between plants for air",
    "Check plants every 2-3 days"
  ]
}}"#
    )
}

/// Cloud vision strategy plus the generative enrichment collaborator, both
/// backed by the same Gemini REST endpoint.
#[derive(Clone)]
pub struct GeminiVision {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl GeminiVision {
    pub fn new(api_key: String, model: String, timeout: Duration) -> Result<Self, DetectionError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DetectionError::Unavailable(e.to_string()))?;
        Ok(Self {
            client,
            api_key,
            model,
        })
    }

    /// Analyzes a plant image. A reply that does not match the expected JSON
    /// schema degrades to the sentinel result instead of failing the request;
    /// transport failures surface as `Unavailable`.
    pub async fn analyze(
        &self,
        image: &[u8],
        mime_type: &str,
    ) -> Result<DetectionResult, DetectionError> {
        let parts = json!([
            {"text": ANALYSIS_PROMPT},
            {"inline_data": {"mime_type": mime_type, "data": BASE64.encode(image)}}
        ]);

        let text = self.generate(parts).await?;
        match parse_analysis(&text) {
            Ok(result) => Ok(result),
            Err(err) => {
                log::warn!("Gemini reply did not match the analysis schema: {err}");
                Ok(DetectionResult::analysis_failed())
            }
        }
    }

    /// Crop-specific treatment advice. All failures degrade to `None`; the
    /// resolver falls back to the taxonomy.
    pub async fn detailed_recommendations(
        &self,
        disease_name: &str,
        crop_type: &str,
    ) -> Option<Recommendation> {
        let prompt = recommendation_prompt(disease_name, crop_type);
        let text = match self.generate(json!([{"text": prompt}])).await {
            Ok(text) => text,
            Err(err) => {
                log::warn!("Gemini recommendation request failed: {err}");
                return None;
            }
        };

        match parse_recommendations(&text) {
            Ok(recommendation) => Some(recommendation),
            Err(err) => {
                log::warn!("Gemini recommendations did not parse: {err}");
                None
            }
        }
    }

    async fn generate(&self, parts: Value) -> Result<String, DetectionError> {
        let url = format!(
            "{GEMINI_ENDPOINT}/{}:generateContent?key={}",
            self.model, self.api_key
        );
        let body = json!({"contents": [{"parts": parts}]});

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| DetectionError::Unavailable(format!("Gemini request failed: {e}")))?
            .error_for_status()
            .map_err(|e| DetectionError::Unavailable(format!("Gemini rejected the request: {e}")))?;

        let payload: Value = response
            .json()
            .await
            .map_err(|e| DetectionError::Unavailable(format!("Gemini reply unreadable: {e}")))?;

        payload
            .pointer("/candidates/0/content/parts/0/text")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| DetectionError::Unavailable("Gemini reply had no text candidate".into()))
    }
}

#[derive(Deserialize)]
struct AnalysisPayload {
    disease_name: String,
    confidence: f32,
    #[serde(default)]
    crop_type: Option<String>,
    #[serde(default)]
    severity: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

fn parse_analysis(text: &str) -> Result<DetectionResult, serde_json::Error> {
    let payload: AnalysisPayload = serde_json::from_str(strip_code_fences(text))?;
    Ok(DetectionResult {
        raw_label: payload.disease_name,
        confidence: payload.confidence,
        // The cloud path always carries a crop, so enrichment is always
        // attempted for it.
        crop_type: Some(payload.crop_type.unwrap_or_else(|| "Unknown".to_string())),
        severity: payload
            .severity
            .as_deref()
            .map(Severity::parse)
            .unwrap_or_default(),
        description: Some(
            payload
                .description
                .unwrap_or_else(|| "No description available".to_string()),
        ),
    })
}

#[derive(Deserialize)]
struct EnrichedRecommendations {
    chemical_treatment: Treatment,
    organic_treatment: Treatment,
    #[serde(default)]
    preventive_measures: Vec<String>,
}

/// Enrichment replies use `chemical_treatment`/`organic_treatment`; the
/// taxonomy's field names win before the record goes anywhere else.
fn parse_recommendations(text: &str) -> Result<Recommendation, serde_json::Error> {
    let payload: EnrichedRecommendations = serde_json::from_str(strip_code_fences(text))?;
    Ok(Recommendation {
        chemical: payload.chemical_treatment,
        organic: payload.organic_treatment,
        preventive_measures: payload.preventive_measures,
    })
}

/// Models wrap JSON in markdown fences despite instructions; strip them.
fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let trimmed = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    trimmed.strip_suffix("```").unwrap_or(trimmed).trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::ANALYSIS_FAILED;

    #[test]
    fn strips_json_code_fences() {
        let fenced = "```json\n{\"disease_name\": \"Rust\"}\n```";
        assert_eq!(strip_code_fences(fenced), "{\"disease_name\": \"Rust\"}");

        let bare_fence = "```\n{}\n```";
        assert_eq!(strip_code_fences(bare_fence), "{}");

        let plain = "{\"confidence\": 4}";
        assert_eq!(strip_code_fences(plain), plain);
    }

    #[test]
    fn parses_well_formed_analysis() {
        let reply = r#"{
            "disease_name": "Tomato Early blight",
            "confidence": 85.5,
            "crop_type": "Tomato",
            "severity": "medium",
            "description": "Brown spots on leaves."
        }"#;
        let result = parse_analysis(reply).unwrap();
        assert_eq!(result.raw_label, "Tomato Early blight");
        assert_eq!(result.confidence, 85.5);
        assert_eq!(result.crop_type.as_deref(), Some("Tomato"));
        assert_eq!(result.severity, Severity::Medium);
    }

    #[test]
    fn analysis_defaults_missing_optional_fields() {
        let reply = r#"{"disease_name": "Rust", "confidence": 40.0}"#;
        let result = parse_analysis(reply).unwrap();
        assert_eq!(result.crop_type.as_deref(), Some("Unknown"));
        assert_eq!(result.severity, Severity::Unknown);
        assert_eq!(result.description.as_deref(), Some("No description available"));
    }

    #[test]
    fn malformed_analysis_is_an_error_not_a_panic() {
        assert!(parse_analysis("The plant looks sick to me.").is_err());
        assert!(parse_analysis("{\"confidence\": 50.0}").is_err());
    }

    #[test]
    fn sentinel_result_fails_acceptance() {
        let sentinel = DetectionResult::analysis_failed();
        assert_eq!(sentinel.raw_label, ANALYSIS_FAILED);
        assert_eq!(sentinel.confidence, 0.0);
        assert!(!sentinel.is_acceptable(20.0));
    }

    #[test]
    fn enrichment_fields_are_renamed_to_taxonomy_names() {
        let reply = r#"{
            "chemical_treatment": {"name": "Mancozeb", "active_ingredient": "Mancozeb 75% WP"},
            "organic_treatment": {"name": "Neem oil", "ingredients": "Neem oil, water"},
            "preventive_measures": ["Remove bad leaves from the plant"]
        }"#;
        let recommendation = parse_recommendations(reply).unwrap();
        assert_eq!(recommendation.chemical.name, "Mancozeb");
        assert_eq!(recommendation.organic.name, "Neem oil");

        let serialized = serde_json::to_value(&recommendation).unwrap();
        assert!(serialized.get("chemical").is_some());
        assert!(serialized.get("organic").is_some());
        assert!(serialized.get("chemical_treatment").is_none());
        assert!(serialized.get("organic_treatment").is_none());
    }

    #[test]
    fn enrichment_without_treatments_does_not_parse() {
        assert!(parse_recommendations(r#"{"preventive_measures": []}"#).is_err());
    }
}
