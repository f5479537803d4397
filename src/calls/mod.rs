//! Call overlay.
//!
//! Selecting a call type opens an overlay backed by a [`CallSession`];
//! dismissing it clears the session. No signaling or media happens here.

mod state;

use chatcore::types::{CallKind, Profile};
use log::info;

pub use state::CallSession;

pub const NOTICE: &str =
    "Note: This is a UI demonstration. Full call functionality requires a WebRTC integration.";

#[derive(Debug, Default)]
pub struct CallOverlay {
    session: Option<CallSession>,
}

impl CallOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens the overlay, replacing any call already shown.
    pub fn start(&mut self, kind: CallKind, contact: Profile) -> &CallSession {
        info!("Opening {kind} call overlay for {}", contact.username);
        self.session.insert(CallSession::new(kind, contact))
    }

    /// Dismisses the overlay, returning the session it showed.
    pub fn end(&mut self) -> Option<CallSession> {
        let ended = self.session.take();
        if let Some(session) = &ended {
            info!("Closed {} call overlay for {}", session.kind, session.contact.username);
        }
        ended
    }

    pub fn current(&self) -> Option<&CallSession> {
        self.session.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    pub fn status_line(&self) -> Option<String> {
        self.session.as_ref().map(CallSession::status_line)
    }
}
