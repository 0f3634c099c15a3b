use actix_web::dev::ServiceRequest;
use actix_web::{Error, error, web};
use actix_web_httpauth::extractors::bearer::BearerAuth;

use super::jwt::JwtService;

/// Bearer validator for the admin-scoped routes; wraps them via
/// `HttpAuthentication::bearer`.
pub async fn admin_validator(
    req: ServiceRequest,
    credentials: BearerAuth,
) -> Result<ServiceRequest, (Error, ServiceRequest)> {
    let Some(jwt_service) = req.app_data::<web::Data<JwtService>>() else {
        log::error!("JwtService missing from app data while validating {}", req.path());
        return Err((
            error::ErrorInternalServerError("Authentication unavailable"),
            req,
        ));
    };

    match jwt_service.verify_admin_token(credentials.token()) {
        Ok(_claims) => Ok(req),
        Err(err) => {
            log::warn!("Admin token rejected for {}: {err}", req.path());
            Err((
                error::ErrorUnauthorized("Missing or invalid admin token"),
                req,
            ))
        }
    }
}
