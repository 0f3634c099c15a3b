use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use actix_web::{HttpResponse, web};
use log::{error, info};
use serde::Serialize;
use serde_json::json;
use shared::FeedbackRequest;

#[derive(Serialize)]
pub struct FeedbackStats {
    pub total_feedbacks: usize,
    pub average_rating: f64,
    pub ratings_distribution: BTreeMap<u8, u64>,
}

/// User feedback, appended to a JSON array file. Same locking discipline as
/// the stats store.
#[derive(Clone)]
pub struct FeedbackStore {
    path: PathBuf,
    lock: Arc<Mutex<()>>,
}

impl FeedbackStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Arc::new(Mutex::new(())),
        }
    }

    fn load(&self) -> Vec<FeedbackRequest> {
        fs::read_to_string(&self.path)
            .ok()
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default()
    }

    /// Returns the stored feedback count, which doubles as the new entry's id.
    pub fn submit(&self, entry: FeedbackRequest) -> std::io::Result<usize> {
        let _guard = self.lock.lock().unwrap();
        let mut entries = self.load();
        entries.push(entry);

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, serde_json::to_string_pretty(&entries)?)?;
        Ok(entries.len())
    }

    pub fn stats(&self) -> FeedbackStats {
        let _guard = self.lock.lock().unwrap();
        let entries = self.load();

        let mut distribution: BTreeMap<u8, u64> = (1..=5).map(|rating| (rating, 0)).collect();
        for entry in &entries {
            if let Some(count) = distribution.get_mut(&entry.rating) {
                *count += 1;
            }
        }

        let average_rating = if entries.is_empty() {
            0.0
        } else {
            let total: u64 = entries.iter().map(|entry| entry.rating as u64).sum();
            let average = total as f64 / entries.len() as f64;
            (average * 100.0).round() / 100.0
        };

        FeedbackStats {
            total_feedbacks: entries.len(),
            average_rating,
            ratings_distribution: distribution,
        }
    }
}

pub async fn submit_feedback(
    store: web::Data<FeedbackStore>,
    feedback: web::Json<FeedbackRequest>,
) -> HttpResponse {
    if !(1..=5).contains(&feedback.rating) {
        return HttpResponse::BadRequest().json(json!({
            "error": "Rating must be between 1 and 5"
        }));
    }

    let entry = feedback.into_inner();
    let name = entry.name.clone();
    let rating = entry.rating;

    match store.submit(entry) {
        Ok(feedback_id) => {
            info!("Feedback saved from {name} ({rating} stars)");
            HttpResponse::Ok().json(json!({
                "status": "success",
                "message": "Thank you for your feedback!",
                "feedback_id": feedback_id
            }))
        }
        Err(err) => {
            error!("Feedback submission failed: {err}");
            HttpResponse::InternalServerError().json(json!({
                "error": "Failed to submit feedback"
            }))
        }
    }
}

pub async fn get_feedback_stats(store: web::Data<FeedbackStore>) -> HttpResponse {
    HttpResponse::Ok().json(store.stats())
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn temp_store() -> FeedbackStore {
        FeedbackStore::new(std::env::temp_dir().join(format!("feedback-{}.json", Uuid::new_v4())))
    }

    fn entry(rating: u8) -> FeedbackRequest {
        FeedbackRequest {
            name: "Asha".to_string(),
            email: "asha@example.com".to_string(),
            rating,
            message: "Very helpful".to_string(),
            timestamp: "2026-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn submissions_accumulate_and_average() {
        let store = temp_store();
        assert_eq!(store.submit(entry(5)).unwrap(), 1);
        assert_eq!(store.submit(entry(4)).unwrap(), 2);

        let stats = store.stats();
        assert_eq!(stats.total_feedbacks, 2);
        assert_eq!(stats.average_rating, 4.5);
        assert_eq!(stats.ratings_distribution[&5], 1);
        assert_eq!(stats.ratings_distribution[&1], 0);
    }

    #[test]
    fn empty_store_has_zeroed_distribution() {
        let stats = temp_store().stats();
        assert_eq!(stats.total_feedbacks, 0);
        assert_eq!(stats.average_rating, 0.0);
        assert_eq!(stats.ratings_distribution.len(), 5);
    }
}
