use std::collections::HashMap;
use std::env;
use std::time::Duration;

use actix_web::{HttpResponse, web};
use log::error;
use serde_json::{Value, json};
use shared::{
    BulkTranslateRequest, BulkTranslateResponse, TranslateRequest, TranslateResponse, TtsRequest,
    TtsResponse,
};

/// Languages offered to farmers; bare ISO codes, regionalized for TTS.
pub const SUPPORTED_LANGUAGES: &[(&str, &str)] = &[
    ("en", "English"),
    ("hi", "Hindi"),
    ("mr", "Marathi"),
    ("gu", "Gujarati"),
    ("ta", "Tamil"),
    ("te", "Telugu"),
    ("kn", "Kannada"),
    ("bn", "Bengali"),
    ("pa", "Punjabi"),
    ("ml", "Malayalam"),
];

const CLOUD_TRANSLATE_ENDPOINT: &str = "https://translation.googleapis.com/language/translate/v2";
const WEB_TRANSLATE_ENDPOINT: &str = "https://translate.googleapis.com/translate_a/single";
const TTS_ENDPOINT: &str = "https://texttospeech.googleapis.com/v1/text:synthesize";

#[derive(Debug, thiserror::Error)]
pub enum TranslateError {
    #[error("Translation request failed: {0}")]
    Request(String),
    #[error("Translation reply unreadable: {0}")]
    Malformed(String),
    #[error("Text-to-speech requires a configured GOOGLE_API_KEY")]
    TtsUnconfigured,
}

/// Translation and speech synthesis. Uses the Google Cloud REST APIs when an
/// API key is configured, otherwise the free web translation endpoint.
#[derive(Clone)]
pub struct TranslateService {
    client: reqwest::Client,
    api_key: Option<String>,
}

impl TranslateService {
    pub fn from_env(timeout: Duration) -> Result<Self, reqwest::Error> {
        let api_key = env::var("GOOGLE_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty());
        if api_key.is_some() {
            log::info!("Google Cloud translation configured");
        } else {
            log::warn!("GOOGLE_API_KEY not set, using the free translation endpoint; TTS disabled");
        }

        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, api_key })
    }

    pub fn supports(language: &str) -> bool {
        SUPPORTED_LANGUAGES.iter().any(|(code, _)| *code == language)
    }

    pub async fn translate(
        &self,
        text: &str,
        source: &str,
        target: &str,
    ) -> Result<String, TranslateError> {
        if source == target {
            return Ok(text.to_string());
        }
        match &self.api_key {
            Some(key) => self.translate_cloud(text, source, target, key).await,
            None => self.translate_web(text, source, target).await,
        }
    }

    async fn translate_cloud(
        &self,
        text: &str,
        source: &str,
        target: &str,
        api_key: &str,
    ) -> Result<String, TranslateError> {
        let body = json!({
            "q": text,
            "source": source,
            "target": target,
            "format": "text",
        });

        let payload: Value = self
            .client
            .post(format!("{CLOUD_TRANSLATE_ENDPOINT}?key={api_key}"))
            .json(&body)
            .send()
            .await
            .map_err(|e| TranslateError::Request(e.to_string()))?
            .error_for_status()
            .map_err(|e| TranslateError::Request(e.to_string()))?
            .json()
            .await
            .map_err(|e| TranslateError::Malformed(e.to_string()))?;

        payload
            .pointer("/data/translations/0/translatedText")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| TranslateError::Malformed("no translation in reply".to_string()))
    }

    async fn translate_web(
        &self,
        text: &str,
        source: &str,
        target: &str,
    ) -> Result<String, TranslateError> {
        let url = format!(
            "{WEB_TRANSLATE_ENDPOINT}?client=gtx&sl={source}&tl={target}&dt=t&q={}",
            urlencoding::encode(text)
        );

        let payload: Value = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| TranslateError::Request(e.to_string()))?
            .error_for_status()
            .map_err(|e| TranslateError::Request(e.to_string()))?
            .json()
            .await
            .map_err(|e| TranslateError::Malformed(e.to_string()))?;

        parse_web_translation(&payload)
            .ok_or_else(|| TranslateError::Malformed("no translation segments".to_string()))
    }

    pub async fn synthesize(
        &self,
        text: &str,
        language: &str,
        voice_gender: &str,
    ) -> Result<TtsResponse, TranslateError> {
        let api_key = self.api_key.as_ref().ok_or(TranslateError::TtsUnconfigured)?;
        let language_code = tts_language_code(language);

        let body = json!({
            "input": {"text": text},
            "voice": {"languageCode": language_code, "ssmlGender": voice_gender},
            "audioConfig": {"audioEncoding": "MP3", "speakingRate": 0.9, "pitch": 0.0},
        });

        let payload: Value = self
            .client
            .post(format!("{TTS_ENDPOINT}?key={api_key}"))
            .json(&body)
            .send()
            .await
            .map_err(|e| TranslateError::Request(e.to_string()))?
            .error_for_status()
            .map_err(|e| TranslateError::Request(e.to_string()))?
            .json()
            .await
            .map_err(|e| TranslateError::Malformed(e.to_string()))?;

        let audio_content = payload
            .get("audioContent")
            .and_then(Value::as_str)
            .ok_or_else(|| TranslateError::Malformed("no audio content in reply".to_string()))?
            .to_string();

        Ok(TtsResponse {
            audio_content,
            language_code,
            format: "mp3".to_string(),
        })
    }
}

/// The free endpoint answers with nested arrays; segment[0] of each entry in
/// the first array is a translated chunk.
fn parse_web_translation(payload: &Value) -> Option<String> {
    let segments = payload.get(0)?.as_array()?;
    let translated: String = segments
        .iter()
        .filter_map(|segment| segment.get(0)?.as_str())
        .collect();
    if translated.is_empty() {
        None
    } else {
        Some(translated)
    }
}

/// Bare language codes map onto Indian regional TTS voices.
fn tts_language_code(language: &str) -> String {
    let base = language.split('-').next().unwrap_or(language);
    if TranslateService::supports(base) {
        format!("{base}-IN")
    } else {
        "en-IN".to_string()
    }
}

pub async fn get_supported_languages() -> HttpResponse {
    let languages: HashMap<&str, &str> = SUPPORTED_LANGUAGES.iter().copied().collect();
    HttpResponse::Ok().json(json!({
        "supported_languages": languages,
        "total_count": languages.len(),
    }))
}

pub async fn translate_text(
    service: web::Data<TranslateService>,
    request: web::Json<TranslateRequest>,
) -> HttpResponse {
    if !TranslateService::supports(&request.target_language) {
        let codes: Vec<&str> = SUPPORTED_LANGUAGES.iter().map(|(code, _)| *code).collect();
        return HttpResponse::BadRequest().json(json!({
            "error": format!(
                "Target language '{}' not supported. Supported languages: {codes:?}",
                request.target_language
            )
        }));
    }

    match service
        .translate(
            &request.text,
            &request.source_language,
            &request.target_language,
        )
        .await
    {
        Ok(translated_text) => HttpResponse::Ok().json(TranslateResponse {
            original_text: request.text.clone(),
            translated_text,
            source_language: request.source_language.clone(),
            target_language: request.target_language.clone(),
        }),
        Err(err) => {
            error!("Translation failed: {err}");
            HttpResponse::InternalServerError().json(json!({
                "error": format!("Translation failed: {err}")
            }))
        }
    }
}

pub async fn translate_bulk(
    service: web::Data<TranslateService>,
    request: web::Json<BulkTranslateRequest>,
) -> HttpResponse {
    if !TranslateService::supports(&request.target_language) {
        return HttpResponse::BadRequest().json(json!({
            "error": format!("Target language '{}' not supported", request.target_language)
        }));
    }

    let mut translated_texts = HashMap::new();
    for (field, text) in &request.texts {
        match service
            .translate(text, &request.source_language, &request.target_language)
            .await
        {
            Ok(translated) => {
                translated_texts.insert(field.clone(), translated);
            }
            Err(err) => {
                error!("Bulk translation failed on field {field}: {err}");
                return HttpResponse::InternalServerError().json(json!({
                    "error": format!("Bulk translation failed: {err}")
                }));
            }
        }
    }

    HttpResponse::Ok().json(BulkTranslateResponse {
        original_texts: request.texts.clone(),
        translated_texts,
        source_language: request.source_language.clone(),
        target_language: request.target_language.clone(),
    })
}

pub async fn generate_speech(
    service: web::Data<TranslateService>,
    request: web::Json<TtsRequest>,
) -> HttpResponse {
    let base = request.language.split('-').next().unwrap_or(&request.language);
    if !TranslateService::supports(base) {
        return HttpResponse::BadRequest().json(json!({
            "error": format!("Language '{}' not supported", request.language)
        }));
    }

    match service
        .synthesize(&request.text, &request.language, &request.voice_gender)
        .await
    {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(TranslateError::TtsUnconfigured) => {
            HttpResponse::ServiceUnavailable().json(json!({
                "error": "Text-to-speech service not available"
            }))
        }
        Err(err) => {
            error!("TTS failed: {err}");
            HttpResponse::InternalServerError().json(json!({
                "error": format!("TTS generation failed: {err}")
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn supported_language_lookup() {
        assert!(TranslateService::supports("hi"));
        assert!(TranslateService::supports("ml"));
        assert!(!TranslateService::supports("fr"));
    }

    #[test]
    fn tts_codes_regionalize_to_india() {
        assert_eq!(tts_language_code("hi"), "hi-IN");
        assert_eq!(tts_language_code("en-US"), "en-IN");
        assert_eq!(tts_language_code("mr-IN"), "mr-IN");
        assert_eq!(tts_language_code("fr"), "en-IN");
    }

    #[test]
    fn web_translation_concatenates_segments() {
        let payload = json!([
            [
                ["Namaste, ", "Hello, ", null],
                ["kisaan", "farmer", null]
            ],
            null,
            "en"
        ]);
        assert_eq!(
            parse_web_translation(&payload).as_deref(),
            Some("Namaste, kisaan")
        );
    }

    #[test]
    fn web_translation_rejects_unexpected_shapes() {
        assert!(parse_web_translation(&json!({"detail": "error"})).is_none());
        assert!(parse_web_translation(&json!([])).is_none());
    }
}
