//! The shell-side stand-in for an embedded remote surface.
//!
//! A terminal cannot render the remote page itself, so each window hosts a
//! `SurfaceEndpoint`: it accepts messages addressed to the surface's origin,
//! keeps a short protocol log for the window's content view, and posts the
//! surface's own requests back to the host inbox.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use serde_json::json;

use super::{HostInbox, MessageEvent, MessagePort, OutboundMessage, PortError};
use crate::constants::SURFACE_LOG_LINES;
use crate::origin::Origin;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogDirection {
    /// Surface → host.
    Sent,
    /// Host → surface.
    Received,
    Note,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceLogEntry {
    pub direction: LogDirection,
    pub text: String,
}

#[derive(Debug, Default)]
struct EndpointState {
    loaded: bool,
    uid: Option<String>,
    has_token: bool,
    log: VecDeque<SurfaceLogEntry>,
}

impl EndpointState {
    fn push(&mut self, direction: LogDirection, text: String) {
        self.log.push_back(SurfaceLogEntry { direction, text });
        while self.log.len() > SURFACE_LOG_LINES {
            self.log.pop_front();
        }
    }
}

#[derive(Debug, Clone)]
pub struct SurfaceEndpoint {
    origin: Origin,
    state: Arc<Mutex<EndpointState>>,
}

impl SurfaceEndpoint {
    pub fn new(origin: Origin) -> Self {
        Self {
            origin,
            state: Arc::new(Mutex::new(EndpointState::default())),
        }
    }

    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    pub fn set_loaded(&self, loaded: bool) {
        if let Ok(mut state) = self.state.lock() {
            state.loaded = loaded;
            if loaded {
                let note = format!("loaded {}", self.origin);
                state.push(LogDirection::Note, note);
            } else {
                state.uid = None;
                state.has_token = false;
            }
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.state.lock().map(|s| s.loaded).unwrap_or(false)
    }

    /// Uid of the last token the surface received, if any.
    pub fn signed_in_uid(&self) -> Option<String> {
        self.state.lock().ok().and_then(|s| s.uid.clone())
    }

    pub fn has_token(&self) -> bool {
        self.state.lock().map(|s| s.has_token).unwrap_or(false)
    }

    pub fn log(&self) -> Vec<SurfaceLogEntry> {
        self.state
            .lock()
            .map(|s| s.log.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Ask the host for the current identity, as the remote page does when
    /// it has no token yet.
    pub fn request_auth(&self, inbox: &HostInbox) -> bool {
        if let Ok(mut state) = self.state.lock() {
            state.push(LogDirection::Sent, "CHECK_AUTH".to_string());
        }
        let port: Arc<dyn MessagePort> = Arc::new(self.clone());
        inbox.post(MessageEvent {
            origin: self.origin.clone(),
            data: json!({ "type": "CHECK_AUTH" }),
            source: Some(port),
        })
    }
}

impl MessagePort for SurfaceEndpoint {
    fn post_message(
        &self,
        message: &OutboundMessage,
        target_origin: &Origin,
    ) -> Result<(), PortError> {
        if *target_origin != self.origin {
            return Err(PortError::OriginMismatch {
                target: target_origin.clone(),
                actual: self.origin.clone(),
            });
        }
        let mut state = self.state.lock().map_err(|_| PortError::Closed)?;
        if !state.loaded {
            return Err(PortError::Closed);
        }
        let (uid, has_token) = match message {
            OutboundMessage::FirebaseToken { uid, .. } => (Some(uid.clone()), true),
            OutboundMessage::AuthStatus { token, uid } => (uid.clone(), token.is_some()),
        };
        let who = uid.as_deref().unwrap_or("signed out");
        let line = format!("{} ({who})", message.type_name());
        state.uid = uid;
        state.has_token = has_token;
        state.push(LogDirection::Received, line);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint() -> SurfaceEndpoint {
        let ep = SurfaceEndpoint::new(Origin::new("https://signets.netlify.app"));
        ep.set_loaded(true);
        ep
    }

    #[test]
    fn accepts_messages_for_its_own_origin() {
        let ep = endpoint();
        let msg = OutboundMessage::FirebaseToken {
            token: "T".into(),
            uid: "U".into(),
        };
        ep.post_message(&msg, &Origin::new("https://signets.netlify.app"))
            .unwrap();
        assert_eq!(ep.signed_in_uid().as_deref(), Some("U"));
        assert!(ep.has_token());
        let last = ep.log().pop().unwrap();
        assert_eq!(last.direction, LogDirection::Received);
        assert_eq!(last.text, "FIREBASE_TOKEN (U)");
    }

    #[test]
    fn rejects_mismatched_target_origin() {
        let ep = endpoint();
        let msg = OutboundMessage::AuthStatus {
            token: None,
            uid: None,
        };
        let err = ep
            .post_message(&msg, &Origin::new("https://evil.example"))
            .unwrap_err();
        assert!(matches!(err, PortError::OriginMismatch { .. }));
        assert!(!ep.has_token());
    }

    #[test]
    fn unloaded_surface_reports_closed() {
        let ep = SurfaceEndpoint::new(Origin::new("https://signets.netlify.app"));
        let msg = OutboundMessage::AuthStatus {
            token: None,
            uid: None,
        };
        assert_eq!(
            ep.post_message(&msg, ep.origin()),
            Err(PortError::Closed)
        );
    }

    #[test]
    fn request_auth_posts_check_auth_with_source() {
        let ep = endpoint();
        let (inbox, rx) = HostInbox::channel();
        assert!(ep.request_auth(&inbox));
        let event = rx.try_recv().unwrap();
        assert_eq!(event.origin, *ep.origin());
        assert_eq!(event.data, json!({"type": "CHECK_AUTH"}));
        assert!(event.source.is_some());
    }

    #[test]
    fn log_is_bounded() {
        let ep = endpoint();
        let (inbox, _rx) = HostInbox::channel();
        for _ in 0..(SURFACE_LOG_LINES + 20) {
            ep.request_auth(&inbox);
        }
        assert_eq!(ep.log().len(), SURFACE_LOG_LINES);
    }
}
