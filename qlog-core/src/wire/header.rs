//! Decoded packet headers

use std::fmt;

use serde::{Deserialize, Serialize};

use super::ConnectionId;

/// A QUIC version number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Version(pub u32);

impl Version {
    /// QUIC version 1 (RFC 9000)
    pub const V1: Version = Version(0x0000_0001);
    /// Version field of a Version Negotiation packet
    pub const NEGOTIATION: Version = Version(0);
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08x}", self.0)
    }
}

/// Long header packet types
///
/// `Unknown` carries a type code the decoder could not classify, e.g. from a
/// version whose type bits this build does not understand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LongHeaderType {
    Initial,
    ZeroRtt,
    Handshake,
    Retry,
    VersionNegotiation,
    Unknown(u8),
}

/// Long- or short-form specific header fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HeaderForm {
    Long {
        packet_type: LongHeaderType,
        version: Version,
        src_connection_id: ConnectionId,
    },
    Short,
}

/// A fully decoded packet header, including the packet number
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub form: HeaderForm,
    pub dest_connection_id: ConnectionId,
    pub packet_number: u64,
}

impl Header {
    /// Create a long header
    pub fn long(
        packet_type: LongHeaderType,
        version: Version,
        dest_connection_id: ConnectionId,
        src_connection_id: ConnectionId,
        packet_number: u64,
    ) -> Self {
        Self {
            form: HeaderForm::Long {
                packet_type,
                version,
                src_connection_id,
            },
            dest_connection_id,
            packet_number,
        }
    }

    /// Create a short (1-RTT) header
    pub fn short(dest_connection_id: ConnectionId, packet_number: u64) -> Self {
        Self {
            form: HeaderForm::Short,
            dest_connection_id,
            packet_number,
        }
    }

    pub fn is_long(&self) -> bool {
        matches!(self.form, HeaderForm::Long { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_display() {
        assert_eq!(Version::V1.to_string(), "00000001");
        assert_eq!(Version(0xff00_001d).to_string(), "ff00001d");
        assert_eq!(Version::NEGOTIATION.to_string(), "00000000");
    }

    #[test]
    fn test_header_from_capture_json() {
        let header: Header = serde_json::from_value(serde_json::json!({
            "form": {
                "kind": "long",
                "packet_type": "handshake",
                "version": 1,
                "src_connection_id": "04030201"
            },
            "dest_connection_id": "0102030405060708",
            "packet_number": 1337
        }))
        .unwrap();

        assert!(header.is_long());
        assert_eq!(header.packet_number, 1337);
        assert_eq!(
            header.form,
            HeaderForm::Long {
                packet_type: LongHeaderType::Handshake,
                version: Version::V1,
                src_connection_id: ConnectionId::from([4, 3, 2, 1]),
            }
        );

        let short: Header = serde_json::from_value(serde_json::json!({
            "form": { "kind": "short" },
            "dest_connection_id": "aa",
            "packet_number": 7
        }))
        .unwrap();
        assert!(!short.is_long());
    }
}
