mod auth;
mod config;
mod dataset;
mod db;
mod detect;
mod feedback;
mod fetch;
mod predict;
mod recommend;
mod retrain;
mod routes;
mod stats;
mod translate;
mod taxonomy;

use std::env;
use std::time::Duration;

use actix_cors::Cors;
use actix_web::{App, HttpServer, web};

use auth::AdminCredentials;
use auth::jwt::JwtService;
use config::AppConfig;
use dataset::DatasetCollector;
use db::predictions::PredictionRepository;
use detect::classifier::DiseaseClassifier;
use detect::cloud::GeminiVision;
use detect::detector::ObjectDetector;
use detect::selector::{BackendDescriptor, StrategyKind};
use detect::{ActiveBackend, DetectionError};
use feedback::FeedbackStore;
use fetch::ImageFetcher;
use routes::configure_routes;
use stats::StatsStore;
use taxonomy::TaxonomyStore;
use translate::TranslateService;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    dotenv::dotenv().ok();

    if let Ok(current_dir) = env::current_dir() {
        log::info!("Current working directory: {}", current_dir.display());
    }

    let config = AppConfig::load()
        .map_err(|e| std::io::Error::other(format!("Config loading failed: {e}")))?;

    let taxonomy = TaxonomyStore::load(&config.taxonomy.path)
        .map_err(|e| std::io::Error::other(format!("Taxonomy loading failed: {e}")))?;

    // Backend selection happens exactly once per process lifetime.
    let cloud_available = detect::selector::cloud_available();
    let local_available = detect::selector::local_available(&config.models.classifier_path);
    let descriptor = detect::selector::select_backend(cloud_available, local_available);

    let backend = build_backend(&descriptor, local_available, &config)
        .map_err(|e| std::io::Error::other(format!("Detection backend failed to start: {e}")))?;

    let fetcher = ImageFetcher::new(Duration::from_secs(config.detection.fetch_timeout_secs))
        .map_err(|e| std::io::Error::other(format!("HTTP client failed to start: {e}")))?;
    let translate_service = TranslateService::from_env(Duration::from_secs(30))
        .map_err(|e| std::io::Error::other(format!("HTTP client failed to start: {e}")))?;

    let repository = PredictionRepository::new(&config.storage.database_path);
    let stats_store = StatsStore::new(&config.storage.stats_path);
    let feedback_store = FeedbackStore::new(&config.storage.feedback_path);
    let dataset = DatasetCollector::new(&config.storage.dataset_dir);

    let jwt_secret = env::var("JWT_SECRET").unwrap_or_else(|_| {
        log::warn!("JWT_SECRET not set, using the development default");
        "krushimitra-dev-secret".to_string()
    });
    let jwt_service = JwtService::new(&jwt_secret);
    let admin_credentials = AdminCredentials::from_env();

    let backend = web::Data::new(backend);
    let taxonomy = web::Data::new(taxonomy);
    let descriptor = web::Data::new(descriptor);
    let config_data = web::Data::new(config);

    let port = env::var("PORT").unwrap_or_else(|_| "8000".to_string());
    let bind_address = format!("0.0.0.0:{port}");
    log::info!("Starting server on {bind_address}");

    HttpServer::new(move || {
        App::new()
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allowed_methods(vec!["GET", "POST", "OPTIONS"])
                    .allowed_headers(vec![
                        actix_web::http::header::AUTHORIZATION,
                        actix_web::http::header::ACCEPT,
                        actix_web::http::header::CONTENT_TYPE,
                    ])
                    .max_age(3600),
            )
            .app_data(backend.clone())
            .app_data(taxonomy.clone())
            .app_data(descriptor.clone())
            .app_data(config_data.clone())
            .app_data(web::Data::new(fetcher.clone()))
            .app_data(web::Data::new(translate_service.clone()))
            .app_data(web::Data::new(repository.clone()))
            .app_data(web::Data::new(stats_store.clone()))
            .app_data(web::Data::new(feedback_store.clone()))
            .app_data(web::Data::new(dataset.clone()))
            .app_data(web::Data::new(jwt_service.clone()))
            .app_data(web::Data::new(admin_credentials.clone()))
            .configure(configure_routes)
    })
    .bind(&bind_address)?
    .run()
    .await
}

fn build_backend(
    descriptor: &BackendDescriptor,
    local_available: bool,
    config: &AppConfig,
) -> Result<ActiveBackend, DetectionError> {
    match descriptor.strategy {
        StrategyKind::Cloud => {
            let api_key = env::var("GEMINI_API_KEY")
                .map_err(|_| DetectionError::Unavailable("GEMINI_API_KEY not set".to_string()))?;
            let vision = GeminiVision::new(
                api_key,
                config.cloud.model.clone(),
                Duration::from_secs(config.cloud.request_timeout_secs),
            )?;

            // Hybrid mode keeps the classifier warm as a silent fallback.
            let standby = if local_available {
                match DiseaseClassifier::load(
                    &config.models.classifier_path,
                    &config.models.classifier_labels,
                ) {
                    Ok(classifier) => Some(classifier),
                    Err(err) => {
                        log::warn!("Standby classifier failed to load: {err}");
                        None
                    }
                }
            } else {
                None
            };

            Ok(ActiveBackend::Cloud { vision, standby })
        }
        StrategyKind::Local => Ok(ActiveBackend::Local(DiseaseClassifier::load(
            &config.models.classifier_path,
            &config.models.classifier_labels,
        )?)),
        StrategyKind::Detector => Ok(ActiveBackend::Detector(ObjectDetector::load(
            &config.models.detector_path,
            &config.models.detector_labels,
            config.detection.detector_threshold,
        )?)),
    }
}
