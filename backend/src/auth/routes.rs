use actix_web::{HttpResponse, web};
use log::error;
use serde_json::json;
use shared::{LoginRequest, LoginResponse};

use super::AdminCredentials;
use super::jwt::JwtService;
use super::models::VerifyRequest;

pub async fn admin_login(
    credentials: web::Data<AdminCredentials>,
    jwt_service: web::Data<JwtService>,
    request: web::Json<LoginRequest>,
) -> HttpResponse {
    if !credentials.matches(&request.password) {
        return HttpResponse::Unauthorized().json(LoginResponse {
            success: false,
            message: "Invalid password".to_string(),
            token: None,
        });
    }

    match jwt_service.generate_admin_token() {
        Ok(token) => HttpResponse::Ok().json(LoginResponse {
            success: true,
            message: "Login successful".to_string(),
            token: Some(token),
        }),
        Err(err) => {
            error!("Failed to issue admin token: {err}");
            HttpResponse::InternalServerError().json(json!({
                "error": "Failed to issue token"
            }))
        }
    }
}

pub async fn verify_admin(
    jwt_service: web::Data<JwtService>,
    request: web::Json<VerifyRequest>,
) -> HttpResponse {
    let valid = jwt_service.verify_admin_token(&request.token).is_ok();
    HttpResponse::Ok().json(json!({ "valid": valid }))
}
