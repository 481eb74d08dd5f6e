use sealdrop_core::crypto::{CipherEngine, OsRandom, RandomSource};
use sealdrop_core::link::{build_url, CapabilityLinkPayload};
use sealdrop_core::models::validate_upload;
use sealdrop_core::{checksum, AppError, ErrorMetadata};

use crate::format::{duration_name, human_file_size};
use crate::state::{ProgressGauge, UploadState};
use crate::transport::{ApiTransport, CreateUploadRequest};

type StateObserver<S> = Box<dyn Fn(&S) + Send + Sync>;

/// Result of a finished upload: the object id and the shareable capability
/// link. The link is the only copy of the key material.
#[derive(Debug, Clone)]
pub struct UploadOutcome {
    pub id: String,
    pub link: String,
}

/// Upload engine. One transfer at a time per instance; a failed transfer is
/// terminal, the caller starts over with fresh input if it wants to retry.
pub struct Uploader<T: ApiTransport, R: RandomSource = OsRandom> {
    transport: T,
    cipher: CipherEngine<R>,
    share_origin: String,
    max_file_size_bytes: i64,
    observer: Option<StateObserver<UploadState>>,
}

impl<T: ApiTransport> Uploader<T, OsRandom> {
    pub fn new(transport: T, share_origin: &str, max_file_size_bytes: i64) -> Self {
        Self::with_cipher(transport, CipherEngine::new(), share_origin, max_file_size_bytes)
    }
}

impl<T: ApiTransport, R: RandomSource> Uploader<T, R> {
    pub fn with_cipher(
        transport: T,
        cipher: CipherEngine<R>,
        share_origin: &str,
        max_file_size_bytes: i64,
    ) -> Self {
        Self {
            transport,
            cipher,
            share_origin: share_origin.trim_end_matches('/').to_string(),
            max_file_size_bytes,
            observer: None,
        }
    }

    /// Register a state observer. Progress reported through it is monotonic
    /// within the uploading phase.
    pub fn on_state(mut self, observer: impl Fn(&UploadState) + Send + Sync + 'static) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    fn emit(&self, state: UploadState) {
        if let Some(observer) = &self.observer {
            observer(&state);
        }
    }

    #[cfg(test)]
    pub(crate) fn into_transport(self) -> T {
        self.transport
    }

    /// Run the whole upload flow: validate, encrypt, register with the
    /// broker, PUT the ciphertext, build the capability link.
    pub async fn upload(
        &mut self,
        name: &str,
        plaintext: &[u8],
        expiry_hours: i64,
        bot_token: &str,
    ) -> Result<UploadOutcome, AppError> {
        match self
            .run(name, plaintext, expiry_hours, bot_token)
            .await
        {
            Ok(outcome) => {
                self.emit(UploadState::Success {
                    link: outcome.link.clone(),
                    retention: duration_name(expiry_hours),
                });
                Ok(outcome)
            }
            Err(err) => {
                self.emit(UploadState::Error {
                    message: err.client_message(),
                });
                Err(err)
            }
        }
    }

    async fn run(
        &self,
        name: &str,
        plaintext: &[u8],
        expiry_hours: i64,
        bot_token: &str,
    ) -> Result<UploadOutcome, AppError> {
        if plaintext.len() as i64 > self.max_file_size_bytes {
            return Err(AppError::InvalidInput(format!(
                "File is too large, the maximum size is {}",
                human_file_size(self.max_file_size_bytes, false, 0),
            )));
        }
        validate_upload(
            name,
            plaintext.len() as i64,
            expiry_hours,
            self.max_file_size_bytes,
        )?;

        self.emit(UploadState::Encrypting);
        let key = self.cipher.generate_key();
        let nonce = self.cipher.generate_nonce();
        let ciphertext = self.cipher.encrypt(&key, &nonce, plaintext)?;

        let created = self
            .transport
            .create_upload(&CreateUploadRequest {
                name: name.to_string(),
                size: ciphertext.len() as i64,
                expiry_time_hours: expiry_hours,
                bot_token: bot_token.to_string(),
            })
            .await?;

        let mut gauge = ProgressGauge::default();
        self.emit(UploadState::Uploading {
            progress: gauge.advance(0.0),
        });
        self.transport
            .put_ciphertext(&created.upload_url, ciphertext)
            .await?;
        self.emit(UploadState::Uploading {
            progress: gauge.advance(1.0),
        });

        let payload = CapabilityLinkPayload {
            key,
            nonce,
            checksum: checksum::derive(&created.id, &key, &nonce),
        };
        let link = build_url(&self.share_origin, &created.id, &payload);

        Ok(UploadOutcome {
            id: created.id,
            link,
        })
    }
}
