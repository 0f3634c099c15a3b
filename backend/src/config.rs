use std::path::PathBuf;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub detection: DetectionConfig,
    pub cloud: CloudConfig,
    pub models: ModelPaths,
    pub storage: StorageConfig,
    pub taxonomy: TaxonomyConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DetectionConfig {
    /// Acceptance floor on the 0-100 confidence scale; below it the request
    /// is rejected as unclear.
    pub min_confidence: f32,
    /// Per-detection acceptance threshold for the object detector (0-1).
    pub detector_threshold: f64,
    pub fetch_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CloudConfig {
    pub model: String,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelPaths {
    pub classifier_path: PathBuf,
    pub classifier_labels: PathBuf,
    pub detector_path: PathBuf,
    pub detector_labels: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub database_path: PathBuf,
    pub stats_path: PathBuf,
    pub feedback_path: PathBuf,
    pub model_log_path: PathBuf,
    pub dataset_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TaxonomyConfig {
    pub path: PathBuf,
}

impl AppConfig {
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        let config_path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| {
            match std::env::var("CARGO_MANIFEST_DIR") {
                Ok(manifest_dir) => format!("{manifest_dir}/../config/detection.yaml"),
                Err(_) => "config/detection.yaml".to_string(),
            }
        });
        let config_str = std::fs::read_to_string(&config_path)?;
        let config: AppConfig = serde_yaml::from_str(&config_str)?;
        Ok(config)
    }
}
