//! Decoded QUIC frames

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::ConnectionId;

/// Direction of streams a MAX_STREAMS / STREAMS_BLOCKED frame refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamType {
    Bidirectional,
    Unidirectional,
}

impl StreamType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamType::Bidirectional => "bidirectional",
            StreamType::Unidirectional => "unidirectional",
        }
    }
}

/// An inclusive range of acknowledged packet numbers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AckRange {
    pub smallest: u64,
    pub largest: u64,
}

impl AckRange {
    pub fn new(smallest: u64, largest: u64) -> Self {
        Self { smallest, largest }
    }

    /// Range covering a single packet number
    pub fn single(packet_number: u64) -> Self {
        Self::new(packet_number, packet_number)
    }
}

/// A frame as produced or consumed by the protocol engine
///
/// `Unknown` is what a decoder yields for a frame type it can skip but not
/// interpret (e.g. an extension negotiated by the peer). The tracer refuses
/// to record it rather than silently leaving it out of the trace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Frame {
    Padding {
        length: u64,
    },
    Ping,
    Ack {
        #[serde(default)]
        ack_delay: Duration,
        /// Ranges in the order the engine holds them (largest first on the wire)
        ranges: Vec<AckRange>,
    },
    ResetStream {
        stream_id: u64,
        error_code: u64,
        final_size: u64,
    },
    StopSending {
        stream_id: u64,
        error_code: u64,
    },
    Crypto {
        offset: u64,
        #[serde(with = "hex")]
        data: Vec<u8>,
    },
    NewToken {
        #[serde(with = "hex")]
        token: Vec<u8>,
    },
    Stream {
        stream_id: u64,
        offset: u64,
        #[serde(with = "hex")]
        data: Vec<u8>,
        #[serde(default)]
        fin: bool,
    },
    MaxData {
        maximum: u64,
    },
    MaxStreamData {
        stream_id: u64,
        maximum: u64,
    },
    MaxStreams {
        stream_type: StreamType,
        maximum: u64,
    },
    DataBlocked {
        limit: u64,
    },
    StreamDataBlocked {
        stream_id: u64,
        limit: u64,
    },
    StreamsBlocked {
        stream_type: StreamType,
        limit: u64,
    },
    NewConnectionId {
        sequence_number: u64,
        retire_prior_to: u64,
        connection_id: ConnectionId,
        #[serde(with = "hex")]
        stateless_reset_token: [u8; 16],
    },
    RetireConnectionId {
        sequence_number: u64,
    },
    PathChallenge {
        #[serde(with = "hex")]
        data: [u8; 8],
    },
    PathResponse {
        #[serde(with = "hex")]
        data: [u8; 8],
    },
    ConnectionClose {
        #[serde(default)]
        is_application_error: bool,
        error_code: u64,
        /// Type of the frame that triggered the error, if known
        #[serde(default)]
        frame_type: Option<u64>,
        #[serde(default)]
        reason: String,
    },
    HandshakeDone,
    Unknown {
        frame_type: u64,
    },
}

impl Frame {
    /// The frame type code as it appears on the wire
    pub fn wire_type(&self) -> u64 {
        match self {
            Frame::Padding { .. } => 0x00,
            Frame::Ping => 0x01,
            Frame::Ack { .. } => 0x02,
            Frame::ResetStream { .. } => 0x04,
            Frame::StopSending { .. } => 0x05,
            Frame::Crypto { .. } => 0x06,
            Frame::NewToken { .. } => 0x07,
            Frame::Stream { offset, fin, .. } => {
                // LEN bit is always set by encoders that produce these frames
                let mut t = 0x08 | 0x02;
                if *offset > 0 {
                    t |= 0x04;
                }
                if *fin {
                    t |= 0x01;
                }
                t
            }
            Frame::MaxData { .. } => 0x10,
            Frame::MaxStreamData { .. } => 0x11,
            Frame::MaxStreams { stream_type, .. } => match stream_type {
                StreamType::Bidirectional => 0x12,
                StreamType::Unidirectional => 0x13,
            },
            Frame::DataBlocked { .. } => 0x14,
            Frame::StreamDataBlocked { .. } => 0x15,
            Frame::StreamsBlocked { stream_type, .. } => match stream_type {
                StreamType::Bidirectional => 0x16,
                StreamType::Unidirectional => 0x17,
            },
            Frame::NewConnectionId { .. } => 0x18,
            Frame::RetireConnectionId { .. } => 0x19,
            Frame::PathChallenge { .. } => 0x1a,
            Frame::PathResponse { .. } => 0x1b,
            Frame::ConnectionClose {
                is_application_error,
                ..
            } => {
                if *is_application_error {
                    0x1d
                } else {
                    0x1c
                }
            }
            Frame::HandshakeDone => 0x1e,
            Frame::Unknown { frame_type } => *frame_type,
        }
    }
}
