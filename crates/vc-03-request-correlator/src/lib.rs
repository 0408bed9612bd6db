//! # VC-03: Request Correlator
//!
//! Request/response over a fire-and-forget bus.
//!
//! ## Responsibilities
//!
//! - Register a pending entry, publish the sealed request and wait for the
//!   response carrying the same request id
//! - Resolve each call exactly once: response, remote failure, timeout or
//!   cancellation
//! - Share one bus subscription per response subject between concurrent
//!   calls and drop it when the last call resolves
//! - Open every inbound response with the session and pass it through the
//!   replay guard before it can complete anything
//!
//! ## Architecture
//!
//! ```text
//! caller ──► RequestCorrelator::call ──► Bus::publish(<ns>.forVault.<op>)
//!                 │  ▲
//!        register │  │ oneshot
//!                 ▼  │
//!        PendingRequestStore ◄── ResponseRouter ◄── listener(<ns>.forApp.>)
//! ```
//!
//! The vault half lives in [`responder`].

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::module_name_repetitions)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod domain;
pub mod listener;
pub mod responder;
pub mod service;

// Re-export public API
pub use domain::config::{ConfigError, CorrelatorConfig};
pub use domain::error::{CorrelationError, ErrorKind};
pub use domain::pending::{CompletedResponse, PendingRequestStore, PendingStatsSnapshot};
pub use listener::{ResponseRouter, RouteOutcome};
pub use responder::{InboundRequest, RequestHandler, VaultResponder};
pub use service::RequestCorrelator;
