//! Call session record.

use chatcore::types::{CallKind, Profile};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Local-only record of an open call overlay. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallSession {
    pub kind: CallKind,
    pub contact: Profile,
    pub started_at: DateTime<Utc>,
}

impl CallSession {
    pub fn new(kind: CallKind, contact: Profile) -> Self {
        Self {
            kind,
            contact,
            started_at: Utc::now(),
        }
    }

    /// The overlay always reports a connection in progress; there is no
    /// transport behind it.
    pub fn status_line(&self) -> String {
        format!("{} Call - Connecting...", self.kind.label())
    }

    pub fn shows_video_placeholder(&self) -> bool {
        self.kind == CallKind::Video
    }
}
