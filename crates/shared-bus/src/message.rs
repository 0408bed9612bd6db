//! # Bus Message
//!
//! What a subscriber receives: the concrete subject plus opaque bytes.

/// A message delivered by the bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusMessage {
    /// Concrete subject the message was published on.
    pub subject: String,
    /// Opaque payload (an encoded envelope for vault traffic).
    pub payload: Vec<u8>,
}

impl BusMessage {
    pub fn new(subject: impl Into<String>, payload: Vec<u8>) -> Self {
        Self {
            subject: subject.into(),
            payload,
        }
    }
}
