//! Header transformation and packet-type classification

use std::fmt;

use serde::Serialize;

use crate::error::{QlogError, Result};
use crate::wire::{ConnectionId, Header, HeaderForm, LongHeaderType};

/// Packet type as named by the qlog schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PacketType {
    Initial,
    Handshake,
    ZeroRtt,
    Retry,
    VersionNegotiation,
    OneRtt,
}

impl PacketType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PacketType::Initial => "initial",
            PacketType::Handshake => "handshake",
            PacketType::ZeroRtt => "zero_rtt",
            PacketType::Retry => "retry",
            PacketType::VersionNegotiation => "version_negotiation",
            PacketType::OneRtt => "one_rtt",
        }
    }
}

impl fmt::Display for PacketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The header portion of a packet event
///
/// `scil`, `scid` and `version` only exist for long headers and are left out
/// of the output entirely for short ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeaderRecord {
    pub packet_number: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scil: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scid: Option<ConnectionId>,
    pub dcil: usize,
    pub dcid: ConnectionId,
}

/// Derive the qlog packet type from a header's form and type code
pub fn packet_type(header: &Header) -> Result<PacketType> {
    match &header.form {
        HeaderForm::Short => Ok(PacketType::OneRtt),
        HeaderForm::Long { packet_type, .. } => match packet_type {
            LongHeaderType::Initial => Ok(PacketType::Initial),
            LongHeaderType::Handshake => Ok(PacketType::Handshake),
            LongHeaderType::ZeroRtt => Ok(PacketType::ZeroRtt),
            LongHeaderType::Retry => Ok(PacketType::Retry),
            LongHeaderType::VersionNegotiation => Ok(PacketType::VersionNegotiation),
            LongHeaderType::Unknown(code) => {
                Err(QlogError::UnknownHeaderType { type_code: *code })
            }
        },
    }
}

/// Map a decoded header to its packet type and qlog header record
pub fn transform_header(header: &Header) -> Result<(PacketType, HeaderRecord)> {
    let packet_type = packet_type(header)?;

    let (version, scid) = match &header.form {
        HeaderForm::Long {
            version,
            src_connection_id,
            ..
        } => (Some(version.to_string()), Some(src_connection_id.clone())),
        HeaderForm::Short => (None, None),
    };

    let record = HeaderRecord {
        packet_number: header.packet_number,
        version,
        scil: scid.as_ref().map(ConnectionId::len),
        scid,
        dcil: header.dest_connection_id.len(),
        dcid: header.dest_connection_id.clone(),
    };

    Ok((packet_type, record))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::Version;

    fn long(packet_type: LongHeaderType) -> Header {
        Header::long(
            packet_type,
            Version::V1,
            ConnectionId::from([1, 2, 3, 4, 5, 6, 7, 8]),
            ConnectionId::from([4, 3, 2, 1]),
            1337,
        )
    }

    #[test]
    fn test_long_header_packet_types() {
        let cases = [
            (LongHeaderType::Initial, "initial"),
            (LongHeaderType::Handshake, "handshake"),
            (LongHeaderType::ZeroRtt, "zero_rtt"),
            (LongHeaderType::Retry, "retry"),
            (LongHeaderType::VersionNegotiation, "version_negotiation"),
        ];

        for (long_type, expected) in cases {
            let pt = packet_type(&long(long_type)).unwrap();
            assert_eq!(pt.as_str(), expected);
            assert_eq!(serde_json::to_value(pt).unwrap(), serde_json::json!(expected));
        }
    }

    #[test]
    fn test_short_header_is_one_rtt() {
        let header = Header::short(ConnectionId::from([0xaa, 0xbb]), 9);
        assert_eq!(packet_type(&header).unwrap(), PacketType::OneRtt);
    }

    #[test]
    fn test_unknown_long_header_type() {
        let err = packet_type(&long(LongHeaderType::Unknown(5))).unwrap_err();
        assert!(matches!(err, QlogError::UnknownHeaderType { type_code: 5 }));

        assert!(transform_header(&long(LongHeaderType::Unknown(5))).is_err());
    }

    #[test]
    fn test_long_header_record() {
        let (pt, record) = transform_header(&long(LongHeaderType::Handshake)).unwrap();
        assert_eq!(pt, PacketType::Handshake);

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["packet_number"], 1337);
        assert_eq!(json["dcid"], "0102030405060708");
        assert_eq!(json["dcil"], 8);
        assert_eq!(json["scid"], "04030201");
        assert_eq!(json["scil"], 4);
        assert_eq!(json["version"], "00000001");
    }

    #[test]
    fn test_short_header_record_omits_long_fields() {
        let header = Header::short(ConnectionId::from([0xaa, 0xbb]), 9);
        let (_, record) = transform_header(&header).unwrap();

        let json = serde_json::to_value(&record).unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj.len(), 3);
        assert_eq!(json["dcid"], "aabb");
        assert!(!obj.contains_key("scid"));
        assert!(!obj.contains_key("scil"));
        assert!(!obj.contains_key("version"));
    }
}
