use sealdrop_core::crypto::CipherEngine;
use sealdrop_core::link::parse_url;
use sealdrop_core::models::FileInfo;
use sealdrop_core::{checksum, AppError, ErrorMetadata};

use crate::state::{DownloadState, ProgressGauge};
use crate::transport::ApiTransport;

type StateObserver = Box<dyn Fn(&DownloadState) + Send + Sync>;

/// Result of a finished download: recovered plaintext and the metadata the
/// broker reported for it.
#[derive(Debug, Clone)]
pub struct DownloadOutcome {
    pub name: String,
    pub size: i64,
    pub plaintext: Vec<u8>,
}

/// Download engine. The link checksum is verified before the key is ever
/// applied to the ciphertext; a mismatch aborts without a decryption
/// attempt and is never retried.
pub struct Downloader<T: ApiTransport> {
    transport: T,
    cipher: CipherEngine,
    observer: Option<StateObserver>,
}

impl<T: ApiTransport> Downloader<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            cipher: CipherEngine::new(),
            observer: None,
        }
    }

    pub fn on_state(mut self, observer: impl Fn(&DownloadState) + Send + Sync + 'static) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    fn emit(&self, state: DownloadState) {
        if let Some(observer) = &self.observer {
            observer(&state);
        }
    }

    /// Fetch only the display metadata for a link, without pulling the
    /// ciphertext. Used before the caller commits to a download.
    pub async fn file_info(&self, link: &str) -> Result<FileInfo, AppError> {
        let parsed = parse_url(link)?;
        self.emit(DownloadState::GettingInfo);
        let info = self.transport.file_info(&parsed.id).await?;
        self.emit(DownloadState::Idle { info: info.clone() });
        Ok(info)
    }

    /// Run the whole download flow for a capability link.
    pub async fn download(
        &mut self,
        link: &str,
        bot_token: &str,
    ) -> Result<DownloadOutcome, AppError> {
        match self.run(link, bot_token).await {
            Ok(outcome) => {
                self.emit(DownloadState::Success {
                    name: outcome.name.clone(),
                });
                Ok(outcome)
            }
            Err(err) => {
                self.emit(DownloadState::Error {
                    message: err.client_message(),
                });
                Err(err)
            }
        }
    }

    async fn run(&self, link: &str, bot_token: &str) -> Result<DownloadOutcome, AppError> {
        let parsed = parse_url(link)?;

        self.emit(DownloadState::GettingInfo);
        let info = self.transport.file_info(&parsed.id).await?;
        self.emit(DownloadState::Idle { info: info.clone() });

        let mut gauge = ProgressGauge::default();
        self.emit(DownloadState::Downloading {
            progress: gauge.advance(0.0),
        });
        let ciphertext = self
            .transport
            .download_ciphertext(&parsed.id, bot_token)
            .await?;
        self.emit(DownloadState::Downloading {
            progress: gauge.advance(1.0),
        });

        // The checksum binds key and nonce to this id. Verify before the key
        // touches any ciphertext.
        checksum::verify(
            &parsed.id,
            &parsed.payload.key,
            &parsed.payload.nonce,
            &parsed.payload.checksum,
        )?;

        self.emit(DownloadState::Decrypting);
        let plaintext = self
            .cipher
            .decrypt(&parsed.payload.key, &parsed.payload.nonce, &ciphertext)?;

        Ok(DownloadOutcome {
            name: info.name,
            size: info.size,
            plaintext,
        })
    }
}
