//! Bot check against the Cloudflare Turnstile siteverify endpoint.

use async_trait::async_trait;
use serde::Deserialize;

use sealdrop_core::AppError;

const SITEVERIFY_URL: &str = "https://challenges.cloudflare.com/turnstile/v0/siteverify";

/// Bot-check seam. Handlers depend on this trait; tests substitute a fake
/// that accepts or rejects without network traffic.
#[async_trait]
pub trait BotVerifier: Send + Sync {
    /// Check a client-supplied token. A token that does not verify is
    /// `AppError::BotCheckFailed`.
    async fn verify(&self, token: &str, remote_ip: Option<&str>) -> Result<(), AppError>;
}

#[derive(Debug, Deserialize)]
struct SiteverifyResponse {
    success: bool,
    #[serde(default, rename = "error-codes")]
    error_codes: Vec<String>,
}

/// Production verifier posting to Turnstile's siteverify endpoint.
pub struct TurnstileVerifier {
    client: reqwest::Client,
    secret: String,
}

impl TurnstileVerifier {
    pub fn new(client: reqwest::Client, secret: &str) -> Self {
        Self {
            client,
            secret: secret.to_string(),
        }
    }
}

#[async_trait]
impl BotVerifier for TurnstileVerifier {
    async fn verify(&self, token: &str, remote_ip: Option<&str>) -> Result<(), AppError> {
        let mut form: Vec<(&str, &str)> = vec![("secret", &self.secret), ("response", token)];
        if let Some(ip) = remote_ip {
            form.push(("remoteip", ip));
        }

        let response = self
            .client
            .post(SITEVERIFY_URL)
            .form(&form)
            .send()
            .await
            .map_err(|e| AppError::Internal(format!("siteverify request failed: {}", e)))?;

        let result: SiteverifyResponse = response
            .json()
            .await
            .map_err(|e| AppError::Internal(format!("siteverify response invalid: {}", e)))?;

        if result.success {
            Ok(())
        } else {
            tracing::debug!(error_codes = ?result.error_codes, "Turnstile rejected token");
            Err(AppError::BotCheckFailed)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_siteverify_response_parses_error_codes() {
        let parsed: SiteverifyResponse = serde_json::from_str(
            r#"{"success": false, "error-codes": ["invalid-input-response"]}"#,
        )
        .unwrap();
        assert!(!parsed.success);
        assert_eq!(parsed.error_codes, vec!["invalid-input-response"]);
    }

    #[test]
    fn test_siteverify_response_without_error_codes() {
        let parsed: SiteverifyResponse = serde_json::from_str(r#"{"success": true}"#).unwrap();
        assert!(parsed.success);
        assert!(parsed.error_codes.is_empty());
    }
}
