//! # Encrypted Envelope
//!
//! The unit published on the bus for every request and response.
//!
//! ## Security Properties
//!
//! - **Nonce**: 12 random bytes, regenerated per encrypt call, sent in clear.
//! - **Session binding**: the `session_id` is the AEAD associated data, so an
//!   envelope replayed into another session fails authentication.
//! - **Routing metadata is NOT authenticated**: subjects are hints for the
//!   transport only and must never drive a security decision.

use crate::ids::SessionId;

/// Length of the AEAD nonce in bytes.
pub const NONCE_LEN: usize = 12;

/// Output of a single session encrypt call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedEnvelope {
    /// Session the ciphertext was sealed under.
    pub session_id: SessionId,
    /// One-time nonce. Not secret.
    pub nonce: [u8; NONCE_LEN],
    /// Ciphertext with the 16-byte authentication tag appended.
    pub ciphertext: Vec<u8>,
}

impl EncryptedEnvelope {
    pub fn new(session_id: SessionId, nonce: [u8; NONCE_LEN], ciphertext: Vec<u8>) -> Self {
        Self {
            session_id,
            nonce,
            ciphertext,
        }
    }
}

/// Plaintext routing hints carried next to the ciphertext.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingMetadata {
    /// Subject the message was published on.
    pub subject: String,
    /// Subject the sender expects the reply on, if any.
    pub reply_to: Option<String>,
}

impl RoutingMetadata {
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            reply_to: None,
        }
    }

    #[must_use]
    pub fn with_reply_to(mut self, reply_to: impl Into<String>) -> Self {
        self.reply_to = Some(reply_to.into());
        self
    }
}

/// An envelope as it travels on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireEnvelope {
    /// Wire format version.
    pub version: u16,
    pub envelope: EncryptedEnvelope,
    pub routing: Option<RoutingMetadata>,
}

impl WireEnvelope {
    /// Current wire format version.
    pub const CURRENT_VERSION: u16 = 1;

    pub fn new(envelope: EncryptedEnvelope) -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            envelope,
            routing: None,
        }
    }

    #[must_use]
    pub fn with_routing(mut self, routing: RoutingMetadata) -> Self {
        self.routing = Some(routing);
        self
    }
}

impl From<EncryptedEnvelope> for WireEnvelope {
    fn from(envelope: EncryptedEnvelope) -> Self {
        Self::new(envelope)
    }
}
