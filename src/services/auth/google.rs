use async_trait::async_trait;
use serde::Deserialize;

use super::{AuthError, IdentityVerifier};
use crate::models::Identity;

const LOOKUP_URL: &str = "https://identitytoolkit.googleapis.com/v1/accounts:lookup";

/// Verifies Firebase ID tokens against the Google Identity Toolkit REST API.
pub struct GoogleIdentityVerifier {
    api_key: String,
    client: reqwest::Client,
}

impl GoogleIdentityVerifier {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            client: reqwest::Client::new(),
        }
    }
}

#[derive(Deserialize)]
struct LookupResponse {
    users: Option<Vec<LookupUser>>,
}

#[derive(Deserialize)]
struct LookupUser {
    #[serde(rename = "localId")]
    local_id: String,
    email: Option<String>,
    #[serde(rename = "displayName")]
    display_name: Option<String>,
    #[serde(rename = "photoUrl")]
    photo_url: Option<String>,
    disabled: Option<bool>,
}

#[derive(Deserialize)]
struct LookupError {
    error: Option<LookupErrorBody>,
}

#[derive(Deserialize)]
struct LookupErrorBody {
    message: Option<String>,
}

#[async_trait]
impl IdentityVerifier for GoogleIdentityVerifier {
    async fn verify(&self, token: &str) -> Result<Identity, AuthError> {
        let response = self
            .client
            .post(format!("{LOOKUP_URL}?key={}", self.api_key))
            .json(&serde_json::json!({ "idToken": token }))
            .send()
            .await
            .map_err(|e| {
                tracing::error!("identity provider unreachable: {e}");
                AuthError::Invalid
            })?;

        if !response.status().is_success() {
            let body: LookupError = response.json().await.unwrap_or(LookupError { error: None });
            let code = body
                .error
                .and_then(|e| e.message)
                .unwrap_or_default();
            return Err(match code.as_str() {
                "TOKEN_EXPIRED" => AuthError::Expired,
                "USER_DISABLED" => AuthError::Revoked,
                _ => AuthError::Invalid,
            });
        }

        let body: LookupResponse = response.json().await.map_err(|_| AuthError::Invalid)?;
        let user = body
            .users
            .and_then(|mut users| if users.is_empty() { None } else { Some(users.remove(0)) })
            .ok_or(AuthError::Invalid)?;

        if user.disabled.unwrap_or(false) {
            return Err(AuthError::Revoked);
        }

        let email = user.email.ok_or(AuthError::Invalid)?;

        Ok(Identity {
            uid: user.local_id,
            email,
            display_name: user.display_name,
            photo_url: user.photo_url,
        })
    }
}
