//! # Shared Types Crate
//!
//! Types shared by every layer of the vault channel:
//!
//! - **Identifiers**: `SessionId`, `RequestId`
//! - **Envelope**: `EncryptedEnvelope` plus unauthenticated `RoutingMetadata`
//! - **Codec**: `EnvelopeCodec`, the stateless envelope <-> bus bytes mapping
//! - **Payloads**: `VaultRequest` / `VaultResponse` carried inside the ciphertext
//! - **Subjects**: `<namespace>.forVault.<op>` / `<namespace>.forApp.<op>` naming
//! - **Clock**: `SystemClock` and the test-friendly `ManualClock`
//!
//! ## Design Principles
//!
//! - **Only the AEAD tag is a security boundary.** Everything the codec reads
//!   before decryption (session id, routing subjects) is treated as untrusted.
//! - **Typed failures**: codec and subject errors are enums, never strings to
//!   be matched on.

pub mod clock;
pub mod codec;
pub mod envelope;
pub mod errors;
pub mod ids;
pub mod payload;
pub mod subjects;

pub use clock::{Clock, ManualClock, SharedClock, SystemClock};
pub use codec::EnvelopeCodec;
pub use envelope::{EncryptedEnvelope, RoutingMetadata, WireEnvelope, NONCE_LEN};
pub use errors::{CodecError, SubjectError};
pub use ids::{RequestId, SessionId};
pub use payload::{VaultRequest, VaultResponse};
pub use subjects::SubjectPattern;
