//! Upload state machine.
//!
//! One machine exists per signed-in browser session:
//!
//! ```text
//! Idle -> FileSelected -> Submitting -> ResultReady
//!                                    \-> Error --(display time)--> Idle
//! ```
//!
//! `reset` returns to `Idle` from anywhere. Checks on the selected file run
//! in `select`, so a rejected file never reaches `Submitting` and never causes
//! an outbound request.

use std::{
    mem,
    time::{Duration, Instant},
};

use bytes::Bytes;
use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_BYTES: usize = 10 * 1024 * 1024;
pub const DEFAULT_ERROR_DISPLAY: Duration = Duration::from_secs(5);

/// A file picked by the user, as received from the browser.
#[derive(Debug, Clone)]
pub struct ImageFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

impl ImageFile {
    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UploadError {
    #[error("Please select an image file")]
    NoFile,
    #[error("Please select a valid image file")]
    NotAnImage,
    #[error("File size must be less than {limit_mb}MB")]
    TooLarge { limit_mb: usize },
    #[error("An upload is already in progress")]
    Busy,
    /// The API answered but reported a failure.
    #[error("{0}")]
    Remote(String),
    #[error("Network error. Please check if the colorization API is running.")]
    Network,
    #[error("The upload was reset before the colorization finished")]
    Reset,
    #[error("No colorized image is available")]
    NoResult,
    #[error("Failed to download image. Please try again.")]
    Download,
}

impl UploadError {
    /// Errors caught before anything was sent to the API.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            UploadError::NoFile | UploadError::NotAnImage | UploadError::TooLarge { .. }
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoomTarget {
    Original,
    Colorized,
}

#[derive(Debug, Clone)]
pub struct ColorizedResult {
    pub original: ImageFile,
    /// Absolute URL of the processed image on the colorization API.
    pub download_url: String,
    pub zoom: Option<ZoomTarget>,
}

/// Tells one submission apart from a later one of the same session.
pub type SubmissionId = u64;

#[derive(Debug, Clone)]
pub enum UploadState {
    Idle,
    FileSelected(ImageFile),
    Submitting { id: SubmissionId, file: ImageFile },
    ResultReady(ColorizedResult),
    Error { message: String, since: Instant },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    FileSelected,
    Submitting,
    ResultReady,
    Error,
}

#[derive(Debug, Clone, Copy)]
pub struct UploadLimits {
    pub max_bytes: usize,
    pub error_display: Duration,
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_BYTES,
            error_display: DEFAULT_ERROR_DISPLAY,
        }
    }
}

impl UploadLimits {
    pub fn limit_mb(&self) -> usize {
        self.max_bytes / (1024 * 1024)
    }

    pub fn check(&self, file: &ImageFile) -> Result<(), UploadError> {
        if !file.content_type.to_ascii_lowercase().starts_with("image/") {
            return Err(UploadError::NotAnImage);
        }
        if file.size() > self.max_bytes {
            return Err(UploadError::TooLarge {
                limit_mb: self.limit_mb(),
            });
        }
        Ok(())
    }
}

#[derive(Debug)]
pub struct UploadMachine {
    state: UploadState,
    limits: UploadLimits,
    next_submission: SubmissionId,
}

impl UploadMachine {
    pub fn new(limits: UploadLimits) -> Self {
        Self {
            state: UploadState::Idle,
            limits,
            next_submission: 0,
        }
    }

    pub fn limits(&self) -> &UploadLimits {
        &self.limits
    }

    pub fn phase(&self) -> Phase {
        match self.state {
            UploadState::Idle => Phase::Idle,
            UploadState::FileSelected(_) => Phase::FileSelected,
            UploadState::Submitting { .. } => Phase::Submitting,
            UploadState::ResultReady(_) => Phase::ResultReady,
            UploadState::Error { .. } => Phase::Error,
        }
    }

    /// Accepts a file from the picker or a drop. A rejected file moves the
    /// machine to `Error`; nothing is accepted while a submission is running.
    pub fn select(&mut self, file: Option<ImageFile>) -> Result<(), UploadError> {
        if matches!(self.state, UploadState::Submitting { .. }) {
            return Err(UploadError::Busy);
        }
        let file = match file {
            Some(file) => file,
            None => return Err(self.fail(UploadError::NoFile)),
        };
        if let Err(e) = self.limits.check(&file) {
            return Err(self.fail(e));
        }
        self.state = UploadState::FileSelected(file);
        Ok(())
    }

    /// Moves the selected file into `Submitting` and hands it to the caller,
    /// which issues the one outbound request and reports back under `id`.
    pub fn begin_submit(&mut self) -> Result<(SubmissionId, ImageFile), UploadError> {
        match &self.state {
            UploadState::FileSelected(file) => {
                let file = file.clone();
                self.next_submission += 1;
                let id = self.next_submission;
                self.state = UploadState::Submitting {
                    id,
                    file: file.clone(),
                };
                Ok((id, file))
            }
            UploadState::Submitting { .. } => Err(UploadError::Busy),
            _ => Err(UploadError::NoFile),
        }
    }

    /// Applies the outcome of submission `id`. `Ok` carries the absolute
    /// download URL of the processed image. An outcome for a submission that
    /// was reset or superseded leaves the state untouched.
    pub fn finish(
        &mut self,
        id: SubmissionId,
        outcome: Result<String, UploadError>,
    ) -> Result<ColorizedResult, UploadError> {
        let original = match mem::replace(&mut self.state, UploadState::Idle) {
            UploadState::Submitting { id: current, file } if current == id => file,
            other => {
                self.state = other;
                return Err(UploadError::Reset);
            }
        };

        match outcome {
            Ok(download_url) => {
                let result = ColorizedResult {
                    original,
                    download_url,
                    zoom: None,
                };
                self.state = UploadState::ResultReady(result.clone());
                Ok(result)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Records an error for display. Ignored while a submission is running.
    pub fn fail(&mut self, error: UploadError) -> UploadError {
        if !matches!(self.state, UploadState::Submitting { .. }) {
            self.state = UploadState::Error {
                message: error.to_string(),
                since: Instant::now(),
            };
        }
        error
    }

    /// Returns to `Idle` once an error has been shown for the display time.
    pub fn expire_error(&mut self, now: Instant) -> bool {
        if let UploadState::Error { since, .. } = &self.state {
            if now.saturating_duration_since(*since) >= self.limits.error_display {
                self.state = UploadState::Idle;
                return true;
            }
        }
        false
    }

    pub fn zoom(&mut self, target: ZoomTarget) -> Result<(), UploadError> {
        match &mut self.state {
            UploadState::ResultReady(result) => {
                result.zoom = Some(target);
                Ok(())
            }
            _ => Err(UploadError::NoResult),
        }
    }

    pub fn back(&mut self) {
        if let UploadState::ResultReady(result) = &mut self.state {
            result.zoom = None;
        }
    }

    /// Clears the selected file and the cached download URL.
    pub fn reset(&mut self) {
        self.state = UploadState::Idle;
    }

    pub fn result(&self) -> Option<&ColorizedResult> {
        match &self.state {
            UploadState::ResultReady(result) => Some(result),
            _ => None,
        }
    }

    pub fn download_url(&self) -> Option<&str> {
        self.result().map(|r| r.download_url.as_str())
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.state {
            UploadState::Error { message, .. } => Some(message),
            _ => None,
        }
    }

    pub fn file_name(&self) -> Option<&str> {
        match &self.state {
            UploadState::FileSelected(file) | UploadState::Submitting { file, .. } => Some(&file.file_name),
            UploadState::ResultReady(result) => Some(&result.original.file_name),
            _ => None,
        }
    }
}
