//! Error types for snapshot ingestion, rendering and remote actions.

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ViewError {
    #[error("snapshot payload is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("embedded payload is not valid base64 text: {0}")]
    Base64(String),

    #[error("viewer configuration is invalid: {0}")]
    Config(serde_json::Error),

    #[error("root blip {0} is not present in the wavelet")]
    MissingRootBlip(String),

    #[error("no snapshot has been loaded yet")]
    NothingLoaded,

    #[error("no reply is in progress")]
    NoReplyTarget,

    #[error("responder name {0:?} is empty or contains characters other than letters, digits, '_', '+' or '$'")]
    InvalidResponderName(String),
}

/// HTTP status the action endpoint answers with when the robot is no longer
/// a participant of the wave.
pub const STATUS_FORBIDDEN: u16 = 403;

/// Why a remote action request failed, as far as the viewer cares.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum ActionFailure {
    #[error("the service is no longer a participant of this wave")]
    NotParticipant,

    #[error("the action request failed with status {0}")]
    Generic(u16),
}

impl ActionFailure {
    /// Status 0 stands for a transport failure with no response.
    pub fn from_status(status: u16) -> Self {
        if status == STATUS_FORBIDDEN {
            ActionFailure::NotParticipant
        } else {
            ActionFailure::Generic(status)
        }
    }

    pub fn notice(self) -> Notice {
        let (kind, message) = match self {
            ActionFailure::NotParticipant => (
                NoticeKind::NotParticipant,
                "Your reply could not be added because the robot is no longer a participant of this wave.",
            ),
            ActionFailure::Generic(_) => (
                NoticeKind::Generic,
                "Something went wrong while talking to the server. Please try again.",
            ),
        };
        Notice { kind, message: message.to_string(), recovery: Recovery::Reload }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    NotParticipant,
    Generic,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Recovery {
    /// Re-render the snapshot currently held.
    Reload,
}

/// A user-facing message shown after a failed action.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
    pub recovery: Recovery,
}
