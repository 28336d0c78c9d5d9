//! Cross-origin authentication handshake between the shell and the remote
//! surfaces it embeds.
//!
//! Wire format (JSON objects tagged by `type`):
//!
//! - host → surface: `{"type":"FIREBASE_TOKEN","token":..,"uid":..}`
//! - surface → host: `{"type":"CHECK_AUTH"}`
//! - host → surface: `{"type":"AUTH_STATUS","token":..|null,"uid":..|null}`

pub mod endpoint;
pub mod provider;
pub mod relay;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::origin::Origin;
use crate::window::AppKind;

pub use endpoint::{LogDirection, SurfaceEndpoint, SurfaceLogEntry};
pub use provider::{CommandTokenProvider, EnvTokenProvider, StaticTokenProvider, TokenProvider};
pub use relay::{AuthRelay, Disposition};

/// Identity token handed to embedded surfaces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthToken {
    pub token: String,
    pub uid: String,
}

impl AuthToken {
    pub fn new(token: impl Into<String>, uid: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            uid: uid.into(),
        }
    }
}

/// Messages the host sends to a surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutboundMessage {
    FirebaseToken {
        token: String,
        uid: String,
    },
    AuthStatus {
        token: Option<String>,
        uid: Option<String>,
    },
}

impl OutboundMessage {
    pub fn type_name(&self) -> &'static str {
        match self {
            OutboundMessage::FirebaseToken { .. } => "FIREBASE_TOKEN",
            OutboundMessage::AuthStatus { .. } => "AUTH_STATUS",
        }
    }
}

/// Messages a surface may send to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InboundMessage {
    CheckAuth,
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token command is not valid shell syntax: {0}")]
    InvalidCommand(String),
    #[error("failed to run token command `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("token command `{command}` exited with {status}: {stderr}")]
    CommandFailed {
        command: String,
        status: String,
        stderr: String,
    },
    #[error("token command printed malformed JSON: {0}")]
    Malformed(#[from] serde_json::Error),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PortError {
    #[error("target origin {target} does not match surface origin {actual}")]
    OriginMismatch { target: Origin, actual: Origin },
    #[error("surface is no longer loaded")]
    Closed,
}

/// A handle that can receive messages, the equivalent of a browsing
/// context's `postMessage`.
pub trait MessagePort: Send + Sync + fmt::Debug {
    fn post_message(&self, message: &OutboundMessage, target_origin: &Origin)
    -> Result<(), PortError>;
}

/// One inbound message as observed by the host's shared listener.
#[derive(Debug, Clone)]
pub struct MessageEvent {
    pub origin: Origin,
    pub data: serde_json::Value,
    pub source: Option<Arc<dyn MessagePort>>,
}

/// Sending half of the host's single message listener. Surfaces clone it to
/// post messages up to the shell.
#[derive(Debug, Clone)]
pub struct HostInbox {
    tx: Sender<MessageEvent>,
}

impl HostInbox {
    pub fn channel() -> (Self, Receiver<MessageEvent>) {
        let (tx, rx) = mpsc::channel();
        (Self { tx }, rx)
    }

    /// Deliver `event` to the host. Returns false once the shell is gone.
    pub fn post(&self, event: MessageEvent) -> bool {
        self.tx.send(event).is_ok()
    }
}

/// Static mapping of sub-application kind to the one origin trusted to
/// exchange authentication messages with the host.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowList {
    origins: BTreeMap<AppKind, Origin>,
}

impl AllowList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, kind: AppKind, origin: Origin) -> Self {
        self.insert(kind, origin);
        self
    }

    pub fn insert(&mut self, kind: AppKind, origin: Origin) {
        self.origins.insert(kind, origin);
    }

    pub fn origin_for(&self, kind: AppKind) -> Option<&Origin> {
        self.origins.get(&kind)
    }

    /// Exact string comparison; opaque origins are never trusted.
    pub fn contains(&self, origin: &Origin) -> bool {
        !origin.is_opaque() && self.origins.values().any(|o| o == origin)
    }
}
