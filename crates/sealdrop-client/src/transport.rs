use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use sealdrop_core::models::FileInfo;
use sealdrop_core::AppError;

/// Body of POST /api/create-upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUploadRequest {
    pub name: String,
    pub size: i64,
    pub expiry_time_hours: i64,
    pub bot_token: String,
}

/// Response of POST /api/create-upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUploadResponse {
    pub id: String,
    pub upload_url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DownloadRequest<'a> {
    bot_token: &'a str,
}

/// Network seam of the transfer engine. Production uses [`HttpTransport`];
/// tests substitute a fake.
#[async_trait]
pub trait ApiTransport: Send + Sync {
    async fn create_upload(
        &self,
        request: &CreateUploadRequest,
    ) -> Result<CreateUploadResponse, AppError>;

    /// PUT the ciphertext to a scoped upload URL.
    async fn put_ciphertext(&self, upload_url: &str, ciphertext: Vec<u8>) -> Result<(), AppError>;

    async fn file_info(&self, id: &str) -> Result<FileInfo, AppError>;

    /// Fetch the ciphertext for `id` through the download broker.
    async fn download_ciphertext(&self, id: &str, bot_token: &str) -> Result<Vec<u8>, AppError>;
}

/// reqwest-backed transport talking to a Sealdrop API server.
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    api_origin: String,
}

impl HttpTransport {
    pub fn new(client: reqwest::Client, api_origin: &str) -> Self {
        Self {
            client,
            api_origin: api_origin.trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.api_origin, path)
    }
}

/// Map an API error status onto the shared error taxonomy. The response body
/// is kept for diagnostics but never trusted.
fn status_error(status: reqwest::StatusCode, body: String) -> AppError {
    match status.as_u16() {
        400 => AppError::InvalidInput(body),
        403 => AppError::BotCheckFailed,
        404 => AppError::NotFound(body),
        _ => AppError::Internal(format!("unexpected status {}: {}", status, body)),
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, AppError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(status_error(status, body))
}

#[async_trait]
impl ApiTransport for HttpTransport {
    async fn create_upload(
        &self,
        request: &CreateUploadRequest,
    ) -> Result<CreateUploadResponse, AppError> {
        let response = self
            .client
            .post(self.endpoint("/api/create-upload"))
            .json(request)
            .send()
            .await
            .map_err(|e| AppError::Internal(format!("create-upload request failed: {}", e)))?;

        check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| AppError::Internal(format!("create-upload response invalid: {}", e)))
    }

    async fn put_ciphertext(&self, upload_url: &str, ciphertext: Vec<u8>) -> Result<(), AppError> {
        let response = self
            .client
            .put(upload_url)
            .header("content-type", "application/octet-stream")
            .body(ciphertext)
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("ciphertext upload failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Storage(format!(
                "ciphertext upload rejected with status {}",
                status
            )));
        }
        Ok(())
    }

    async fn file_info(&self, id: &str) -> Result<FileInfo, AppError> {
        let response = self
            .client
            .get(self.endpoint("/api/file-info"))
            .query(&[("id", id)])
            .send()
            .await
            .map_err(|e| AppError::Internal(format!("file-info request failed: {}", e)))?;

        check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| AppError::Internal(format!("file-info response invalid: {}", e)))
    }

    async fn download_ciphertext(&self, id: &str, bot_token: &str) -> Result<Vec<u8>, AppError> {
        let response = self
            .client
            .post(self.endpoint("/api/download"))
            .query(&[("id", id)])
            .json(&DownloadRequest { bot_token })
            .send()
            .await
            .map_err(|e| AppError::Internal(format!("download request failed: {}", e)))?;

        let bytes = check_status(response)
            .await?
            .bytes()
            .await
            .map_err(|e| AppError::Internal(format!("download body unreadable: {}", e)))?;

        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serializes_with_camel_case_fields() {
        let request = CreateUploadRequest {
            name: "notes.txt".to_string(),
            size: 42,
            expiry_time_hours: 24,
            bot_token: "tok".to_string(),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["expiryTimeHours"], 24);
        assert_eq!(json["botToken"], "tok");
    }

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            status_error(reqwest::StatusCode::BAD_REQUEST, String::new()),
            AppError::InvalidInput(_),
        ));
        assert!(matches!(
            status_error(reqwest::StatusCode::FORBIDDEN, String::new()),
            AppError::BotCheckFailed,
        ));
        assert!(matches!(
            status_error(reqwest::StatusCode::NOT_FOUND, String::new()),
            AppError::NotFound(_),
        ));
        assert!(matches!(
            status_error(reqwest::StatusCode::BAD_GATEWAY, String::new()),
            AppError::Internal(_),
        ));
    }
}
