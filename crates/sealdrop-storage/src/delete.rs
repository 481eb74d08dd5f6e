use async_trait::async_trait;
use chrono::Utc;

use sealdrop_core::AppError;

use crate::delete_result::{escape_xml, parse_deleted_keys};
use crate::sign::ScopedUrlSigner;

/// Batch deletion of objects from the store. The reconciler works against
/// this trait so tests can substitute a fake store.
#[async_trait]
pub trait ObjectStoreDelete: Send + Sync {
    /// Delete the given object keys. Returns the subset the store confirmed
    /// deleted; keys missing from the result must be retried later.
    async fn delete_objects(&self, keys: &[String]) -> Result<Vec<String>, AppError>;
}

/// HTTP client for the object store's batch-delete endpoint.
pub struct ObjectStoreClient {
    http: reqwest::Client,
    signer: ScopedUrlSigner,
}

impl ObjectStoreClient {
    pub fn new(http: reqwest::Client, signer: ScopedUrlSigner) -> Self {
        Self { http, signer }
    }

    fn build_delete_request(
        &self,
        keys: &[String],
        now: chrono::DateTime<Utc>,
    ) -> Result<reqwest::Request, AppError> {
        let body = delete_request_body(keys);
        let headers = self
            .signer
            .sign_headers("POST", &[("delete", "")], body.as_bytes(), now)?;

        let url = format!("{}/?delete", self.signer.bucket_url());
        let mut request = self
            .http
            .post(&url)
            .header("content-type", "application/xml")
            .header("accept", "application/xml")
            .body(body);
        for (name, value) in headers {
            request = request.header(name, value);
        }
        request
            .build()
            .map_err(|e| AppError::Storage(format!("batch delete request invalid: {}", e)))
    }
}

fn delete_request_body(keys: &[String]) -> String {
    let mut body = String::from("<Delete>");
    for key in keys {
        body.push_str("<Object><Key>");
        body.push_str(&escape_xml(key));
        body.push_str("</Key></Object>");
    }
    body.push_str("</Delete>");
    body
}

#[async_trait]
impl ObjectStoreDelete for ObjectStoreClient {
    async fn delete_objects(&self, keys: &[String]) -> Result<Vec<String>, AppError> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let request = self.build_delete_request(keys, Utc::now())?;
        let response = self
            .http
            .execute(request)
            .await
            .map_err(|e| AppError::Storage(format!("batch delete request failed: {}", e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| AppError::Storage(format!("batch delete response unreadable: {}", e)))?;

        if !status.is_success() {
            return Err(AppError::Storage(format!(
                "batch delete returned {}: {}",
                status, text,
            )));
        }

        let confirmed = parse_deleted_keys(&text)?;
        tracing::debug!(
            requested = keys.len(),
            confirmed = confirmed.len(),
            "object store batch delete"
        );
        Ok(confirmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delete_body_wraps_each_key() {
        let body = delete_request_body(&["a".to_string(), "b".to_string()]);
        assert_eq!(
            body,
            "<Delete><Object><Key>a</Key></Object><Object><Key>b</Key></Object></Delete>",
        );
    }

    #[test]
    fn test_delete_body_escapes_keys() {
        let body = delete_request_body(&["a&b".to_string()]);
        assert!(body.contains("<Key>a&amp;b</Key>"));
    }

    #[test]
    fn test_delete_request_carries_xml_and_signing_headers() {
        let signer = ScopedUrlSigner::new(
            "https://bucket.s3.eu-west-1.amazonaws.com",
            "eu-west-1",
            "AKIDEXAMPLE",
            "secret",
        )
        .unwrap();
        let client = ObjectStoreClient::new(reqwest::Client::new(), signer);
        let now = chrono::DateTime::parse_from_rfc3339("2026-01-02T03:04:05Z")
            .unwrap()
            .with_timezone(&Utc);

        let request = client
            .build_delete_request(&["a".to_string()], now)
            .unwrap();

        assert_eq!(request.method(), "POST");
        assert_eq!(
            request.url().as_str(),
            "https://bucket.s3.eu-west-1.amazonaws.com/?delete",
        );
        let headers = request.headers();
        assert_eq!(headers.get("content-type").unwrap(), "application/xml");
        assert_eq!(headers.get("accept").unwrap(), "application/xml");
        assert!(headers.contains_key("authorization"));
        assert!(headers.contains_key("x-amz-date"));
        assert!(headers.contains_key("x-amz-content-sha256"));
    }
}
