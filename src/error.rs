use chatcore::types::UserId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("client is not logged in")]
    NotLoggedIn,
    #[error("{0} is required")]
    MissingInput(&'static str),
    #[error("{message}")]
    Service { status: u16, message: String },
    #[error("request failed: {0}")]
    Transport(#[from] anyhow::Error),
    #[error("unexpected response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("empty response from {0}")]
    EmptyResponse(String),
    #[error("unknown contact: {0}")]
    UnknownContact(UserId),
    #[error("no contact selected")]
    NoActiveContact,
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Service { status, .. } => Some(*status),
            _ => None,
        }
    }
}
