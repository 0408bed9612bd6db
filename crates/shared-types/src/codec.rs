//! # Envelope Codec
//!
//! Stateless mapping between [`WireEnvelope`] and the bus byte payload.
//!
//! Wire format (one JSON object per published message):
//!
//! ```text
//! { "session_id": "...",
//!   "nonce": base64(12 bytes),
//!   "ciphertext": base64(bytes),
//!   "routing": { "subject": "...", "reply_to": "..." } }   // optional
//! ```
//!
//! A `"version"` field is written only for envelopes whose version differs
//! from [`WireEnvelope::CURRENT_VERSION`]. A missing field decodes as the
//! current version; any other value is rejected.

use crate::envelope::{EncryptedEnvelope, RoutingMetadata, WireEnvelope, NONCE_LEN};
use crate::errors::CodecError;
use crate::ids::SessionId;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Length of the Poly1305 authentication tag appended to every ciphertext.
pub const TAG_LEN: usize = 16;

/// Default upper bound on an encoded envelope.
pub const MAX_ENVELOPE_BYTES: usize = 1024 * 1024;

#[derive(Serialize, Deserialize)]
struct RawEnvelope {
    #[serde(default = "default_version", skip_serializing_if = "is_current_version")]
    version: u16,
    session_id: String,
    nonce: String,
    ciphertext: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    routing: Option<RawRouting>,
}

#[derive(Serialize, Deserialize)]
struct RawRouting {
    subject: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    reply_to: Option<String>,
}

fn default_version() -> u16 {
    WireEnvelope::CURRENT_VERSION
}

fn is_current_version(version: &u16) -> bool {
    *version == WireEnvelope::CURRENT_VERSION
}

/// Encoder/decoder for wire envelopes.
#[derive(Debug, Clone, Copy)]
pub struct EnvelopeCodec {
    max_bytes: usize,
}

impl Default for EnvelopeCodec {
    fn default() -> Self {
        Self {
            max_bytes: MAX_ENVELOPE_BYTES,
        }
    }
}

impl EnvelopeCodec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Codec with a custom size limit.
    pub fn with_max_bytes(max_bytes: usize) -> Self {
        Self { max_bytes }
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Serialize an envelope to bus bytes.
    ///
    /// # Errors
    ///
    /// - `CodecError::PayloadTooLarge` if the encoding exceeds the limit
    pub fn encode(&self, wire: &WireEnvelope) -> Result<Vec<u8>, CodecError> {
        let raw = RawEnvelope {
            version: wire.version,
            session_id: wire.envelope.session_id.as_str().to_string(),
            nonce: STANDARD.encode(wire.envelope.nonce),
            ciphertext: STANDARD.encode(&wire.envelope.ciphertext),
            routing: wire.routing.as_ref().map(|r| RawRouting {
                subject: r.subject.clone(),
                reply_to: r.reply_to.clone(),
            }),
        };

        let bytes = serde_json::to_vec(&raw).map_err(|e| CodecError::Malformed(e.to_string()))?;
        if bytes.len() > self.max_bytes {
            warn!(
                size = bytes.len(),
                limit = self.max_bytes,
                "Refusing to encode oversized envelope"
            );
            return Err(CodecError::PayloadTooLarge {
                size: bytes.len(),
                limit: self.max_bytes,
            });
        }
        Ok(bytes)
    }

    /// Parse bus bytes into an envelope.
    ///
    /// Structural checks only. Authenticity is established later by the AEAD.
    ///
    /// # Errors
    ///
    /// - `CodecError::PayloadTooLarge` before any parsing
    /// - `CodecError::Malformed` / `InvalidBase64` for syntax problems
    /// - `CodecError::InvalidNonceLength` unless the nonce is 12 bytes
    /// - `CodecError::EmptySessionId`, `CiphertextTooShort`, `UnsupportedVersion`
    pub fn decode(&self, bytes: &[u8]) -> Result<WireEnvelope, CodecError> {
        if bytes.len() > self.max_bytes {
            warn!(
                size = bytes.len(),
                limit = self.max_bytes,
                "Rejecting oversized envelope"
            );
            return Err(CodecError::PayloadTooLarge {
                size: bytes.len(),
                limit: self.max_bytes,
            });
        }

        let raw: RawEnvelope =
            serde_json::from_slice(bytes).map_err(|e| CodecError::Malformed(e.to_string()))?;

        if raw.version != WireEnvelope::CURRENT_VERSION {
            debug!(received = raw.version, "Rejecting envelope with unsupported version");
            return Err(CodecError::UnsupportedVersion {
                received: raw.version,
                supported: WireEnvelope::CURRENT_VERSION,
            });
        }

        if raw.session_id.is_empty() {
            return Err(CodecError::EmptySessionId);
        }

        let nonce_bytes = STANDARD
            .decode(raw.nonce.as_bytes())
            .map_err(|_| CodecError::InvalidBase64 { field: "nonce" })?;
        let nonce: [u8; NONCE_LEN] =
            nonce_bytes
                .as_slice()
                .try_into()
                .map_err(|_| {
                    debug!(actual = nonce_bytes.len(), "Rejecting envelope with bad nonce length");
                    CodecError::InvalidNonceLength {
                        expected: NONCE_LEN,
                        actual: nonce_bytes.len(),
                    }
                })?;

        let ciphertext = STANDARD
            .decode(raw.ciphertext.as_bytes())
            .map_err(|_| CodecError::InvalidBase64 { field: "ciphertext" })?;
        if ciphertext.len() < TAG_LEN {
            debug!(len = ciphertext.len(), "Rejecting envelope shorter than its tag");
            return Err(CodecError::CiphertextTooShort {
                len: ciphertext.len(),
            });
        }

        Ok(WireEnvelope {
            version: raw.version,
            envelope: EncryptedEnvelope::new(SessionId::new(raw.session_id), nonce, ciphertext),
            routing: raw.routing.map(|r| RoutingMetadata {
                subject: r.subject,
                reply_to: r.reply_to,
            }),
        })
    }

    /// Convenience: encode a bare envelope without routing metadata.
    pub fn encode_envelope(&self, envelope: &EncryptedEnvelope) -> Result<Vec<u8>, CodecError> {
        self.encode(&WireEnvelope::new(envelope.clone()))
    }
}
