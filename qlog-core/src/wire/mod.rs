//! Protocol-engine types consumed by the tracer
//!
//! These are the values the QUIC engine hands over when a packet is sent or
//! received: an already-decoded header and the frames it carried. The tracer
//! never encodes or decodes them; it only reads their fields.
//!
//! All types derive serde so a captured exchange can be stored as JSON and
//! replayed into a tracer later (see the `qlog-export` binary).

mod frame;
mod header;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{QlogError, Result};

pub use frame::{AckRange, Frame, StreamType};
pub use header::{Header, HeaderForm, LongHeaderType, Version};

/// Longest connection id QUIC v1 allows
pub const MAX_CONNECTION_ID_LEN: usize = 20;

/// An opaque connection identifier
///
/// Rendered as lowercase hex in every serialized form. Deserialization goes
/// through [`ConnectionId::from_hex`], so ids read from a capture are held to
/// the same length limit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ConnectionId(Vec<u8>);

impl ConnectionId {
    /// Wrap raw connection id bytes
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Parse a connection id from its hex form
    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s).map_err(|e| QlogError::InvalidConnectionId {
            reason: format!("'{}' is not valid hex: {}", s, e),
        })?;
        if bytes.len() > MAX_CONNECTION_ID_LEN {
            return Err(QlogError::InvalidConnectionId {
                reason: format!(
                    "{} bytes exceeds the maximum of {}",
                    bytes.len(),
                    MAX_CONNECTION_ID_LEN
                ),
            });
        }
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Lowercase hex rendering
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl TryFrom<String> for ConnectionId {
    type Error = QlogError;

    fn try_from(s: String) -> Result<Self> {
        Self::from_hex(&s)
    }
}

impl From<ConnectionId> for String {
    fn from(id: ConnectionId) -> Self {
        id.to_hex()
    }
}

impl From<Vec<u8>> for ConnectionId {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&[u8]> for ConnectionId {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl<const N: usize> From<[u8; N]> for ConnectionId {
    fn from(bytes: [u8; N]) -> Self {
        Self(bytes.to_vec())
    }
}

impl AsRef<[u8]> for ConnectionId {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Which endpoint of the connection is recording
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Perspective {
    Client,
    Server,
}

impl Perspective {
    pub fn as_str(&self) -> &'static str {
        match self {
            Perspective::Client => "client",
            Perspective::Server => "server",
        }
    }
}

impl fmt::Display for Perspective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Perspective {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "client" => Ok(Perspective::Client),
            "server" => Ok(Perspective::Server),
            _ => Err(format!("Unknown perspective: {}", s)),
        }
    }
}
