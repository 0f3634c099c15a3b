pub mod jwt;
pub mod middleware;
pub mod models;
pub mod routes;

use std::env;

/// Single-operator admin password, checked on login only; everything after
/// that rides on the issued JWT.
#[derive(Clone)]
pub struct AdminCredentials {
    password: String,
}

impl AdminCredentials {
    pub fn from_env() -> Self {
        let password = env::var("ADMIN_PASSWORD").unwrap_or_else(|_| {
            log::warn!("ADMIN_PASSWORD not set, using the development default");
            "admin123".to_string()
        });
        Self { password }
    }

    pub fn matches(&self, candidate: &str) -> bool {
        self.password == candidate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_match_is_exact() {
        let credentials = AdminCredentials {
            password: "secret".to_string(),
        };
        assert!(credentials.matches("secret"));
        assert!(!credentials.matches("Secret"));
        assert!(!credentials.matches(""));
    }
}
