//! Voice recording: a capture device behind [`AudioCapture`] and the
//! `Idle -> Recording -> Sending -> Idle` state machine that turns a finished
//! clip into a media message.

use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;
use chatcore::media::AUDIO_MIME_TYPE;
use chatcore::types::MessageRow;
use log::{debug, info, warn};
use thiserror::Error;

use crate::composer::{ComposeError, Composer};

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("microphone permission denied: {0}")]
    PermissionDenied(String),
    #[error("not recording")]
    NotRecording,
    #[error("already recording")]
    AlreadyRecording,
    #[error("recording produced no audio")]
    Empty,
    #[error("capture device error: {0}")]
    Io(#[from] std::io::Error),
}

/// A finished recording.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioClip {
    pub data: Bytes,
    pub mime_type: String,
}

impl AudioClip {
    pub fn webm(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            mime_type: AUDIO_MIME_TYPE.to_string(),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// An audio source. `open` acquires the device (and its permission), `finish`
/// stops capturing and hands back everything recorded since `open`.
#[async_trait]
pub trait AudioCapture: Send {
    async fn open(&mut self) -> Result<(), CaptureError>;
    async fn finish(&mut self) -> Result<AudioClip, CaptureError>;
}

/// Capture that "records" a pre-recorded clip from disk.
pub struct FileCapture {
    path: PathBuf,
    opened: bool,
}

impl FileCapture {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            opened: false,
        }
    }
}

#[async_trait]
impl AudioCapture for FileCapture {
    async fn open(&mut self) -> Result<(), CaptureError> {
        match tokio::fs::metadata(&self.path).await {
            Ok(meta) if meta.is_file() => {
                self.opened = true;
                Ok(())
            }
            Ok(_) => Err(CaptureError::PermissionDenied(format!(
                "{} is not a file",
                self.path.display()
            ))),
            Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => Err(
                CaptureError::PermissionDenied(self.path.display().to_string()),
            ),
            Err(e) => Err(CaptureError::Io(e)),
        }
    }

    async fn finish(&mut self) -> Result<AudioClip, CaptureError> {
        if !self.opened {
            return Err(CaptureError::NotRecording);
        }
        self.opened = false;
        let data = tokio::fs::read(&self.path).await?;
        if data.is_empty() {
            return Err(CaptureError::Empty);
        }
        Ok(AudioClip::webm(data))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderState {
    Idle,
    Recording,
    Sending,
}

pub struct Recorder<C> {
    capture: C,
    state: RecorderState,
}

impl<C: AudioCapture> Recorder<C> {
    pub fn new(capture: C) -> Self {
        Self {
            capture,
            state: RecorderState::Idle,
        }
    }

    pub fn state(&self) -> RecorderState {
        self.state
    }

    pub fn is_recording(&self) -> bool {
        self.state == RecorderState::Recording
    }

    /// Starts capturing. A denied permission leaves the recorder idle and
    /// never reaches the network.
    pub async fn start(&mut self) -> Result<(), CaptureError> {
        if self.state != RecorderState::Idle {
            return Err(CaptureError::AlreadyRecording);
        }
        if let Err(e) = self.capture.open().await {
            warn!("Could not start recording: {e}");
            return Err(e);
        }
        debug!("Recording started");
        self.state = RecorderState::Recording;
        Ok(())
    }

    /// Stops capturing and sends the clip through `composer`. The recorder is
    /// back to idle afterwards whether or not the send succeeded.
    pub async fn stop_and_send(&mut self, composer: &Composer) -> Result<MessageRow, ComposeError> {
        if self.state != RecorderState::Recording {
            return Err(CaptureError::NotRecording.into());
        }

        let mut state = scopeguard::guard(&mut self.state, |state| {
            *state = RecorderState::Idle;
        });
        **state = RecorderState::Sending;

        let clip = self.capture.finish().await?;
        info!("Sending {} byte recording", clip.len());
        composer.send_audio(clip).await
    }
}
