use actix_web::{HttpResponse, web};
use chrono::Utc;
use log::{error, info};
use serde_json::json;

use crate::config::AppConfig;
use crate::dataset::DatasetCollector;
use crate::db::predictions::PredictionRepository;

/// Queues a retraining run. Training itself belongs to the external trainer,
/// which consumes the collected dataset and appends to the model log; this
/// endpoint only verifies there is new data and records the handoff.
pub async fn trigger_retrain(
    dataset: web::Data<DatasetCollector>,
    repository: web::Data<PredictionRepository>,
) -> HttpResponse {
    let timestamp = Utc::now();
    let model_version = format!("model_v{}", timestamp.format("%Y%m%d_%H%M%S"));
    let queued_version = model_version.clone();

    actix_web::rt::spawn(async move {
        if !dataset.has_samples() {
            info!("No new data available for retraining");
            return;
        }
        match repository.record_retraining(
            &queued_version,
            None,
            &timestamp.to_rfc3339(),
            "queued for external trainer",
        ) {
            Ok(()) => info!("Retraining {queued_version} handed off to the external trainer"),
            Err(err) => error!("Failed to record retraining request: {err}"),
        }
    });

    HttpResponse::Ok().json(json!({
        "message": "Retraining process started in background. This may take several minutes.",
        "model_version": model_version,
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

pub async fn retrain_status(config: web::Data<AppConfig>) -> HttpResponse {
    let contents = match std::fs::read_to_string(&config.storage.model_log_path) {
        Ok(contents) => contents,
        Err(_) => {
            return HttpResponse::Ok().json(json!({
                "status": "No retraining history found",
                "history": [],
            }));
        }
    };

    let history: Vec<serde_json::Value> = contents
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| {
            let parts: Vec<&str> = line.trim().split(", ").collect();
            if parts.len() >= 3 {
                Some(json!({
                    "version": parts[0],
                    "timestamp": parts[1],
                    "accuracy": parts[2],
                }))
            } else {
                None
            }
        })
        .collect();

    HttpResponse::Ok().json(json!({
        "status": "Available",
        "total_retrains": history.len(),
        "history": history,
    }))
}
