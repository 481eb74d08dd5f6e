//! Shared fakes for engine tests.

use std::sync::Mutex;

use async_trait::async_trait;

use sealdrop_core::models::FileInfo;
use sealdrop_core::AppError;

use crate::transport::{ApiTransport, CreateUploadRequest, CreateUploadResponse};

/// Pretend broker plus object store. Remembers what was PUT so download
/// tests can replay an earlier upload.
#[derive(Default)]
pub(crate) struct FakeTransport {
    pub stored: Mutex<Option<(String, Vec<u8>)>>,
    pub info: Mutex<Option<FileInfo>>,
    pub fail_put: bool,
    pub reject_bot: bool,
}

#[async_trait]
impl ApiTransport for FakeTransport {
    async fn create_upload(
        &self,
        request: &CreateUploadRequest,
    ) -> Result<CreateUploadResponse, AppError> {
        if self.reject_bot {
            return Err(AppError::BotCheckFailed);
        }
        *self.info.lock().unwrap() = Some(FileInfo {
            name: request.name.clone(),
            size: request.size,
        });
        Ok(CreateUploadResponse {
            id: "fixed-id".to_string(),
            upload_url: "https://store.example/fixed-id?scoped".to_string(),
        })
    }

    async fn put_ciphertext(&self, upload_url: &str, ciphertext: Vec<u8>) -> Result<(), AppError> {
        if self.fail_put {
            return Err(AppError::Storage("store unavailable".to_string()));
        }
        *self.stored.lock().unwrap() = Some((upload_url.to_string(), ciphertext));
        Ok(())
    }

    async fn file_info(&self, _id: &str) -> Result<FileInfo, AppError> {
        self.info
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| AppError::NotFound("no such file".to_string()))
    }

    async fn download_ciphertext(&self, _id: &str, _bot_token: &str) -> Result<Vec<u8>, AppError> {
        self.stored
            .lock()
            .unwrap()
            .clone()
            .map(|(_, bytes)| bytes)
            .ok_or_else(|| AppError::NotFound("no such file".to_string()))
    }
}
