use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of call a user asked to place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CallKind {
    Audio,
    Video,
}

impl CallKind {
    pub fn label(&self) -> &'static str {
        match self {
            CallKind::Audio => "Audio",
            CallKind::Video => "Video",
        }
    }
}

impl fmt::Display for CallKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for CallKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "audio" => Ok(CallKind::Audio),
            "video" => Ok(CallKind::Video),
            other => Err(format!("unknown call kind: {other}")),
        }
    }
}
