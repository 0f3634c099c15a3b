use actix_web::{HttpResponse, web};
use actix_web_httpauth::middleware::HttpAuthentication;
use serde_json::json;

use crate::auth::middleware::admin_validator;
use crate::{auth, feedback, predict, retrain, stats, translate};

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .service(web::resource("/predict/").route(web::post().to(predict::predict_disease)))
            .service(web::resource("/model-info/").route(web::get().to(predict::model_info)))
            .service(web::resource("/stats/").route(web::get().to(stats::get_stats)))
            .service(web::resource("/feedback/").route(web::post().to(feedback::submit_feedback)))
            .service(
                web::resource("/feedback/stats/")
                    .route(web::get().to(feedback::get_feedback_stats)),
            )
            .service(
                web::resource("/languages/")
                    .route(web::get().to(translate::get_supported_languages)),
            )
            .service(web::resource("/translate/").route(web::post().to(translate::translate_text)))
            .service(
                web::resource("/translate/bulk/").route(web::post().to(translate::translate_bulk)),
            )
            .service(
                web::resource("/text-to-speech/").route(web::post().to(translate::generate_speech)),
            )
            .service(web::resource("/retrain/status/").route(web::get().to(retrain::retrain_status)))
            .service(web::resource("/admin/login/").route(web::post().to(auth::routes::admin_login)))
            .service(
                web::resource("/admin/verify/").route(web::post().to(auth::routes::verify_admin)),
            )
            .service(
                web::scope("")
                    .wrap(HttpAuthentication::bearer(admin_validator))
                    .service(web::resource("/stats/reset/").route(web::post().to(stats::reset_stats)))
                    .service(web::resource("/retrain/").route(web::post().to(retrain::trigger_retrain)))
                    .service(
                        web::resource("/predictions/")
                            .route(web::get().to(predict::recent_predictions)),
                    ),
            ),
    )
    .service(web::resource("/").route(web::get().to(root)))
    .service(web::resource("/health").route(web::get().to(health)));
}

async fn root() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "message": "Welcome to KrushiMitra API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "predict": "/api/predict/",
            "stats": "/api/stats/",
            "translate": "/api/translate/",
            "languages": "/api/languages/"
        }
    }))
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "healthy",
        "service": "KrushiMitra API"
    }))
}
