use serde::{Deserialize, Serialize};

pub const ADMIN_SUBJECT: &str = "admin";
pub const ADMIN_ROLE: &str = "admin";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: String,
    pub exp: usize,
    pub iat: usize,
}

#[derive(Deserialize)]
pub struct VerifyRequest {
    pub token: String,
}
