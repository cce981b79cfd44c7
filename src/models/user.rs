use serde::{Deserialize, Serialize};

/// Local user record, materialized from a verified identity on first login
/// and keyed by the identity provider's subject id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub uid: String,
    pub email: String,
    pub display_name: String,
    pub photo_url: String,
    pub role: String,
}

/// Verified identity returned by the identity provider. Ownership checks
/// compare its normalized email against stored record owners.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    pub uid: String,
    pub email: String,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
}

/// Emails are compared in lowercase everywhere so ownership checks don't
/// depend on how the identity provider cases them.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
