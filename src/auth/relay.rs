//! The host's single authentication relay.
//!
//! One relay serves every window. Windows attach their surface origin when
//! they open and detach when they close; every inbound message is checked
//! against both the static allow-list and the set of attached origins, so a
//! trusted origin whose window is closed gets no answer either.
//!
//! Token fetches run on worker threads. Their results queue on a channel and
//! are delivered by [`AuthRelay::pump`] on the event loop, which keeps the
//! window state machine free of any waiting.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::{Duration, Instant};

use super::{
    AllowList, AuthToken, InboundMessage, MessageEvent, MessagePort, OutboundMessage, TokenError,
    TokenProvider,
};
use crate::origin::Origin;
use crate::window::WindowId;

/// What the relay did with an inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Origin not allow-listed, or its window is not open.
    Untrusted,
    /// Trusted origin, but not a message the relay understands.
    Unrecognized,
    /// `CHECK_AUTH` without a source handle: nobody to answer.
    NoReplyTarget,
    /// A token fetch is under way; the reply follows on a later `pump`.
    FetchStarted,
}

#[derive(Debug)]
enum Delivery {
    /// Answer to `CHECK_AUTH`, addressed to the message's source and origin.
    Reply {
        source: Arc<dyn MessagePort>,
        origin: Origin,
    },
    /// Proactive push after the surface loaded, addressed to the origin
    /// derived from the window's configured URL.
    Push {
        target: Arc<dyn MessagePort>,
        origin: Origin,
    },
}

#[derive(Debug)]
struct PendingFetch {
    window: WindowId,
    delivery: Delivery,
}

#[derive(Debug)]
struct FetchOutcome {
    request: u64,
    result: Result<Option<AuthToken>, TokenError>,
}

#[derive(Debug)]
pub struct AuthRelay {
    allow_list: AllowList,
    provider: Arc<dyn TokenProvider>,
    attached: BTreeMap<WindowId, Origin>,
    pending: BTreeMap<u64, PendingFetch>,
    next_request: u64,
    tx: Sender<FetchOutcome>,
    rx: Receiver<FetchOutcome>,
}

impl AuthRelay {
    pub fn new(allow_list: AllowList, provider: Arc<dyn TokenProvider>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            allow_list,
            provider,
            attached: BTreeMap::new(),
            pending: BTreeMap::new(),
            next_request: 0,
            tx,
            rx,
        }
    }

    pub fn allow_list(&self) -> &AllowList {
        &self.allow_list
    }

    /// Start listening on behalf of an open window.
    pub fn attach(&mut self, window: WindowId, origin: Origin) {
        tracing::debug!(window_id = %window, %origin, "auth relay attached");
        self.attached.insert(window, origin);
    }

    /// Stop listening for a closed window. Fetches still in flight for it
    /// are abandoned so nothing reaches a surface after it is torn down.
    pub fn detach(&mut self, window: &WindowId) {
        if self.attached.remove(window).is_some() {
            tracing::debug!(window_id = %window, "auth relay detached");
        }
        self.pending.retain(|_, fetch| fetch.window != *window);
    }

    pub fn is_attached(&self, window: &WindowId) -> bool {
        self.attached.contains_key(window)
    }

    /// Number of token fetches whose result has not been delivered yet.
    pub fn in_flight(&self) -> usize {
        self.pending.len()
    }

    fn trusted_window(&self, origin: &Origin) -> Option<WindowId> {
        if !self.allow_list.contains(origin) {
            return None;
        }
        self.attached
            .iter()
            .find(|(_, attached)| *attached == origin)
            .map(|(id, _)| id.clone())
    }

    /// Entry point of the shared listener: every message posted to the host
    /// passes through here.
    pub fn handle_message(&mut self, event: MessageEvent) -> Disposition {
        let Some(window) = self.trusted_window(&event.origin) else {
            // Origin only; the payload is attacker-controlled.
            tracing::trace!(origin = %event.origin, "dropped message from untrusted origin");
            return Disposition::Untrusted;
        };
        let Ok(message) = serde_json::from_value::<InboundMessage>(event.data) else {
            return Disposition::Unrecognized;
        };
        match message {
            InboundMessage::CheckAuth => {
                let Some(source) = event.source else {
                    tracing::debug!(window_id = %window, "CHECK_AUTH without source; not answering");
                    return Disposition::NoReplyTarget;
                };
                self.start_fetch(
                    window,
                    Delivery::Reply {
                        source,
                        origin: event.origin,
                    },
                );
                Disposition::FetchStarted
            }
        }
    }

    /// The window's surface finished loading: push a token to it without
    /// waiting to be asked. Returns false when the window is not attached.
    pub fn surface_loaded(&mut self, window: &WindowId, target: Arc<dyn MessagePort>) -> bool {
        let Some(origin) = self.attached.get(window).cloned() else {
            return false;
        };
        self.start_fetch(window.clone(), Delivery::Push { target, origin });
        true
    }

    fn start_fetch(&mut self, window: WindowId, delivery: Delivery) {
        self.next_request = self.next_request.wrapping_add(1);
        let request = self.next_request;
        let provider = Arc::clone(&self.provider);
        let tx = self.tx.clone();
        let spawned = std::thread::Builder::new()
            .name("auth-token-fetch".to_string())
            .spawn(move || {
                let result = provider.current_token();
                let _ = tx.send(FetchOutcome { request, result });
            });
        match spawned {
            Ok(_) => {
                self.pending.insert(request, PendingFetch { window, delivery });
            }
            Err(err) => {
                tracing::warn!(window_id = %window, error = %err, "could not start token fetch");
            }
        }
    }

    /// Deliver every completed fetch. Returns how many messages were sent.
    pub fn pump(&mut self) -> usize {
        let mut sent = 0;
        while let Ok(outcome) = self.rx.try_recv() {
            if self.deliver(outcome) {
                sent += 1;
            }
        }
        sent
    }

    /// Like [`pump`](Self::pump), but waits up to `timeout` for in-flight
    /// fetches to finish.
    pub fn pump_blocking(&mut self, timeout: Duration) -> usize {
        let deadline = Instant::now() + timeout;
        let mut sent = self.pump();
        while !self.pending.is_empty() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.rx.recv_timeout(remaining) {
                Ok(outcome) => {
                    if self.deliver(outcome) {
                        sent += 1;
                    }
                }
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        sent
    }

    fn deliver(&mut self, outcome: FetchOutcome) -> bool {
        // Missing entries belong to windows detached mid-fetch.
        let Some(fetch) = self.pending.remove(&outcome.request) else {
            return false;
        };
        let token = match outcome.result {
            Ok(token) => token,
            Err(err) => {
                tracing::warn!(window_id = %fetch.window, error = %err, "token fetch failed");
                return false;
            }
        };
        let (port, origin, message) = match fetch.delivery {
            Delivery::Reply { source, origin } => {
                let (token, uid) = match token {
                    Some(AuthToken { token, uid }) => (Some(token), Some(uid)),
                    None => (None, None),
                };
                (source, origin, OutboundMessage::AuthStatus { token, uid })
            }
            Delivery::Push { target, origin } => {
                let Some(AuthToken { token, uid }) = token else {
                    tracing::debug!(window_id = %fetch.window, "no signed-in user; token push skipped");
                    return false;
                };
                (target, origin, OutboundMessage::FirebaseToken { token, uid })
            }
        };
        match port.post_message(&message, &origin) {
            Ok(()) => {
                tracing::debug!(
                    window_id = %fetch.window,
                    message = message.type_name(),
                    "auth message delivered"
                );
                true
            }
            Err(err) => {
                tracing::warn!(window_id = %fetch.window, error = %err, "auth message not delivered");
                false
            }
        }
    }
}
