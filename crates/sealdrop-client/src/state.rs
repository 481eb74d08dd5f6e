use sealdrop_core::models::FileInfo;

/// Phases of an upload. A transfer visits these in order and ends in exactly
/// one of the terminal variants; there is no retry from a terminal state.
#[derive(Debug, Clone, PartialEq)]
pub enum UploadState {
    Idle,
    Encrypting,
    Uploading { progress: f32 },
    /// `retention` is display text for how long the file stays available,
    /// e.g. "1 day".
    Success { link: String, retention: String },
    Error { message: String },
}

impl UploadState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, UploadState::Success { .. } | UploadState::Error { .. })
    }
}

/// Phases of a download. `Idle` carries the file info fetched before the
/// caller commits to pulling the ciphertext.
#[derive(Debug, Clone, PartialEq)]
pub enum DownloadState {
    GettingInfo,
    Idle { info: FileInfo },
    Downloading { progress: f32 },
    Decrypting,
    Success { name: String },
    Error { message: String },
}

impl DownloadState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            DownloadState::Success { .. } | DownloadState::Error { .. }
        )
    }
}

/// Progress values reported to observers never move backwards within a
/// phase, whatever the underlying byte counters do.
#[derive(Debug, Default)]
pub(crate) struct ProgressGauge {
    last: f32,
}

impl ProgressGauge {
    pub fn advance(&mut self, value: f32) -> f32 {
        let clamped = value.clamp(self.last, 1.0);
        self.last = clamped;
        clamped
    }
}
