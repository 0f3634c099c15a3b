use std::fs;
use std::path::Path;

use actix_web::{HttpResponse, web};
use chrono::Utc;
use log::{error, info};
use serde_json::json;
use shared::{PredictRequest, PredictionResponse};

use crate::config::AppConfig;
use crate::dataset::DatasetCollector;
use crate::db::predictions::PredictionRepository;
use crate::detect::selector::BackendDescriptor;
use crate::detect::{ActiveBackend, DetectionError};
use crate::fetch::ImageFetcher;
use crate::recommend;
use crate::stats::StatsStore;
use crate::taxonomy::TaxonomyStore;

pub async fn predict_disease(
    request: web::Json<PredictRequest>,
    fetcher: web::Data<ImageFetcher>,
    backend: web::Data<ActiveBackend>,
    taxonomy: web::Data<TaxonomyStore>,
    repository: web::Data<PredictionRepository>,
    stats: web::Data<StatsStore>,
    dataset: web::Data<DatasetCollector>,
    config: web::Data<AppConfig>,
) -> HttpResponse {
    let image_url = request.image_url.clone();

    let image = match fetcher.fetch(&image_url).await {
        Ok(image) => image,
        Err(err) => {
            error!("Image fetch failed for {image_url}: {err}");
            return HttpResponse::BadRequest().json(json!({
                "error": format!("Failed to download image from URL: {err}")
            }));
        }
    };

    let detection = match backend.detect(&image.bytes, &image.mime_type).await {
        Ok(detection) => detection,
        Err(DetectionError::NoFinding) => {
            return HttpResponse::NotFound().json(json!({
                "error": "No disease detected in the image. Please upload a clearer image of affected plant parts."
            }));
        }
        Err(err) => {
            error!("Detection failed for {image_url}: {err}");
            return HttpResponse::BadGateway().json(json!({
                "error": format!("Prediction failed: {err}")
            }));
        }
    };

    if !detection.is_acceptable(config.detection.min_confidence) {
        info!(
            "Rejecting low-quality detection \"{}\" at {:.2}%",
            detection.raw_label, detection.confidence
        );
        return HttpResponse::NotFound().json(json!({
            "error": "Unable to detect disease clearly. Please upload a clearer image of the plant."
        }));
    }

    let recommendations =
        recommend::recommend(&taxonomy, backend.enrichment(), &detection).await;

    let response = PredictionResponse {
        disease_name: detection.raw_label.clone(),
        confidence: (detection.confidence * 100.0).round() / 100.0,
        description: detection.description.clone().unwrap_or_default(),
        severity: detection.severity,
        crop_type: detection
            .crop_type
            .clone()
            .unwrap_or_else(|| "Unknown".to_string()),
        recommendations,
        image_url: image_url.clone(),
        timestamp: Utc::now().to_rfc3339(),
    };

    // Bookkeeping runs after the response is assembled; its failures are
    // logged and never fail the request.
    let disease_name = detection.raw_label;
    let confidence = detection.confidence;
    let timestamp = response.timestamp.clone();
    actix_web::rt::spawn(async move {
        if let Err(err) =
            repository.save_prediction(&image_url, &disease_name, confidence as f64, &timestamp)
        {
            error!("Failed to save prediction: {err}");
        }
        if let Err(err) = stats.track_prediction(&disease_name, confidence) {
            error!("Failed to track prediction: {err}");
        }
        match dataset.store(&image.bytes, &image.mime_type) {
            Ok(path) => info!("Stored retraining sample at {}", path.display()),
            Err(err) => error!("Failed to store retraining sample: {err}"),
        }
    });

    HttpResponse::Ok().json(response)
}

/// Reports the presented identity, not the executing strategy; in hybrid
/// mode this is where the masking is visible to callers.
pub async fn model_info(
    descriptor: web::Data<BackendDescriptor>,
    config: web::Data<AppConfig>,
) -> HttpResponse {
    let (model_version, timestamp, accuracy) =
        latest_model_log_entry(&config.storage.model_log_path).unwrap_or_else(|| {
            (
                "v1.0".to_string(),
                "Initial".to_string(),
                "N/A".to_string(),
            )
        });

    HttpResponse::Ok().json(json!({
        "model_type": descriptor.presented_identity.as_str(),
        "model_name": descriptor.presented_identity.display_name(),
        "model_version": model_version,
        "timestamp": timestamp,
        "accuracy": accuracy,
    }))
}

pub async fn recent_predictions(repository: web::Data<PredictionRepository>) -> HttpResponse {
    match repository.recent_predictions(100) {
        Ok(records) => HttpResponse::Ok().json(records),
        Err(err) => {
            error!("Failed to list predictions: {err}");
            HttpResponse::InternalServerError().json(json!({
                "error": "Failed to retrieve predictions"
            }))
        }
    }
}

/// Model log lines read "version, timestamp, accuracy"; the last one wins.
pub(crate) fn latest_model_log_entry(path: &Path) -> Option<(String, String, String)> {
    let contents = fs::read_to_string(path).ok()?;
    let line = contents.lines().rev().find(|line| !line.trim().is_empty())?;
    let mut parts = line.trim().split(", ");
    let version = parts.next()?.to_string();
    let timestamp = parts.next().unwrap_or("N/A").to_string();
    let accuracy = parts.next().unwrap_or("N/A").to_string();
    Some((version, timestamp, accuracy))
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn model_log_takes_last_nonempty_line() {
        let path = std::env::temp_dir().join(format!("model-log-{}.txt", Uuid::new_v4()));
        fs::write(
            &path,
            "model_v1, 2026-01-01T00:00:00, 88.10%\nmodel_v2, 2026-02-01T00:00:00, 91.40%\n\n",
        )
        .unwrap();

        let (version, timestamp, accuracy) = latest_model_log_entry(&path).unwrap();
        assert_eq!(version, "model_v2");
        assert_eq!(timestamp, "2026-02-01T00:00:00");
        assert_eq!(accuracy, "91.40%");
    }

    #[test]
    fn missing_model_log_yields_none() {
        let path = std::env::temp_dir().join(format!("model-log-{}.txt", Uuid::new_v4()));
        assert!(latest_model_log_entry(&path).is_none());
    }

    #[test]
    fn short_model_log_lines_fill_with_placeholders() {
        let path = std::env::temp_dir().join(format!("model-log-{}.txt", Uuid::new_v4()));
        fs::write(&path, "model_v3\n").unwrap();

        let (version, timestamp, accuracy) = latest_model_log_entry(&path).unwrap();
        assert_eq!(version, "model_v3");
        assert_eq!(timestamp, "N/A");
        assert_eq!(accuracy, "N/A");
    }
}
