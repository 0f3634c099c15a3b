use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

#[derive(Serialize, Deserialize, Clone)]
pub struct PredictRequest {
    pub image_url: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Treatment {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_ingredient: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_steps: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub where_to_buy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precautions: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingredients: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effectiveness: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Recommendation {
    pub chemical: Treatment,
    pub organic: Treatment,
    pub preventive_measures: Vec<String>,
}

#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Display, EnumString, Default,
)]
#[strum(ascii_case_insensitive)]
pub enum Severity {
    Low,
    Medium,
    High,
    #[default]
    Unknown,
}

impl Severity {
    pub fn parse(label: &str) -> Self {
        label.trim().parse().unwrap_or_default()
    }
}

#[derive(Serialize, Deserialize, Clone)]
pub struct PredictionResponse {
    pub disease_name: String,
    pub confidence: f32,
    pub description: String,
    pub severity: Severity,
    pub crop_type: String,
    pub recommendations: Recommendation,
    pub image_url: String,
    pub timestamp: String,
}

fn default_source_language() -> String {
    "en".to_string()
}

#[derive(Serialize, Deserialize, Clone)]
pub struct TranslateRequest {
    pub text: String,
    pub target_language: String,
    #[serde(default = "default_source_language")]
    pub source_language: String,
}

#[derive(Serialize, Deserialize, Clone)]
pub struct TranslateResponse {
    pub original_text: String,
    pub translated_text: String,
    pub source_language: String,
    pub target_language: String,
}

#[derive(Serialize, Deserialize, Clone)]
pub struct BulkTranslateRequest {
    pub texts: HashMap<String, String>,
    pub target_language: String,
    #[serde(default = "default_source_language")]
    pub source_language: String,
}

#[derive(Serialize, Deserialize, Clone)]
pub struct BulkTranslateResponse {
    pub original_texts: HashMap<String, String>,
    pub translated_texts: HashMap<String, String>,
    pub source_language: String,
    pub target_language: String,
}

fn default_voice_gender() -> String {
    "NEUTRAL".to_string()
}

#[derive(Serialize, Deserialize, Clone)]
pub struct TtsRequest {
    pub text: String,
    #[serde(default = "default_source_language")]
    pub language: String,
    #[serde(default = "default_voice_gender")]
    pub voice_gender: String,
}

#[derive(Serialize, Deserialize, Clone)]
pub struct TtsResponse {
    pub audio_content: String,
    pub language_code: String,
    pub format: String,
}

#[derive(Serialize, Deserialize, Clone)]
pub struct FeedbackRequest {
    pub name: String,
    pub email: String,
    pub rating: u8,
    pub message: String,
    pub timestamp: String,
}

#[derive(Serialize, Deserialize, Clone)]
pub struct LoginRequest {
    pub password: String,
}

#[derive(Serialize, Deserialize, Clone)]
pub struct LoginResponse {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}
