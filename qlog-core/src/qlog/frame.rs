//! Frame transformation
//!
//! Maps each [`Frame`] the engine produced to the qlog representation of that
//! frame kind. The match is exhaustive: a new variant in `wire::Frame` will not
//! compile until it has a mapping here, and `Frame::Unknown` is rejected with
//! [`QlogError::UnknownFrameVariant`].

use serde::ser::{Serialize, SerializeSeq, Serializer};

use crate::error::{QlogError, Result};
use crate::wire::{AckRange, ConnectionId, Frame, StreamType};

/// Error space of a CONNECTION_CLOSE frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorSpace {
    Transport,
    Application,
}

/// Error code as rendered in a `connection_close` frame
///
/// Transport errors defined by RFC 9000 use their registered name; anything
/// else keeps its numeric value.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(untagged)]
pub enum ErrorCode {
    Named(String),
    Raw(u64),
}

/// An acknowledged range: `[n]` for a single packet, `[smallest, largest]` otherwise
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AckedRange(pub u64, pub u64);

impl From<&AckRange> for AckedRange {
    fn from(range: &AckRange) -> Self {
        AckedRange(range.smallest, range.largest)
    }
}

impl Serialize for AckedRange {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        if self.0 == self.1 {
            let mut seq = serializer.serialize_seq(Some(1))?;
            seq.serialize_element(&self.0)?;
            seq.end()
        } else {
            let mut seq = serializer.serialize_seq(Some(2))?;
            seq.serialize_element(&self.0)?;
            seq.serialize_element(&self.1)?;
            seq.end()
        }
    }
}

/// A frame as it appears in a qlog packet event, discriminated by `frame_type`
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(tag = "frame_type", rename_all = "snake_case")]
pub enum FrameRecord {
    Padding {
        length: u64,
    },
    Ping,
    Ack {
        /// Milliseconds
        #[serde(skip_serializing_if = "Option::is_none")]
        ack_delay: Option<f64>,
        acked_ranges: Vec<AckedRange>,
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
        length: u64,
    },
    NewToken {
        length: u64,
        token: String,
    },
    Stream {
        stream_id: u64,
        offset: u64,
        length: u64,
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
        length: usize,
        connection_id: ConnectionId,
        stateless_reset_token: String,
    },
    RetireConnectionId {
        sequence_number: u64,
    },
    PathChallenge {
        data: String,
    },
    PathResponse {
        data: String,
    },
    ConnectionClose {
        error_space: ErrorSpace,
        error_code: ErrorCode,
        raw_error_code: u64,
        reason: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        trigger_frame_type: Option<u64>,
    },
    HandshakeDone,
}

impl FrameRecord {
    /// The `frame_type` discriminator this record serializes with
    pub fn frame_type(&self) -> &'static str {
        match self {
            FrameRecord::Padding { .. } => "padding",
            FrameRecord::Ping => "ping",
            FrameRecord::Ack { .. } => "ack",
            FrameRecord::ResetStream { .. } => "reset_stream",
            FrameRecord::StopSending { .. } => "stop_sending",
            FrameRecord::Crypto { .. } => "crypto",
            FrameRecord::NewToken { .. } => "new_token",
            FrameRecord::Stream { .. } => "stream",
            FrameRecord::MaxData { .. } => "max_data",
            FrameRecord::MaxStreamData { .. } => "max_stream_data",
            FrameRecord::MaxStreams { .. } => "max_streams",
            FrameRecord::DataBlocked { .. } => "data_blocked",
            FrameRecord::StreamDataBlocked { .. } => "stream_data_blocked",
            FrameRecord::StreamsBlocked { .. } => "streams_blocked",
            FrameRecord::NewConnectionId { .. } => "new_connection_id",
            FrameRecord::RetireConnectionId { .. } => "retire_connection_id",
            FrameRecord::PathChallenge { .. } => "path_challenge",
            FrameRecord::PathResponse { .. } => "path_response",
            FrameRecord::ConnectionClose { .. } => "connection_close",
            FrameRecord::HandshakeDone => "handshake_done",
        }
    }
}

/// Map a frame to its qlog record
pub fn transform_frame(frame: &Frame) -> Result<FrameRecord> {
    let record = match frame {
        Frame::Padding { length } => FrameRecord::Padding { length: *length },
        Frame::Ping => FrameRecord::Ping,
        Frame::Ack { ack_delay, ranges } => FrameRecord::Ack {
            ack_delay: if ack_delay.is_zero() {
                None
            } else {
                Some(ack_delay.as_nanos() as f64 / 1_000_000.0)
            },
            acked_ranges: ranges.iter().map(AckedRange::from).collect(),
        },
        Frame::ResetStream {
            stream_id,
            error_code,
            final_size,
        } => FrameRecord::ResetStream {
            stream_id: *stream_id,
            error_code: *error_code,
            final_size: *final_size,
        },
        Frame::StopSending {
            stream_id,
            error_code,
        } => FrameRecord::StopSending {
            stream_id: *stream_id,
            error_code: *error_code,
        },
        Frame::Crypto { offset, data } => FrameRecord::Crypto {
            offset: *offset,
            length: data.len() as u64,
        },
        Frame::NewToken { token } => FrameRecord::NewToken {
            length: token.len() as u64,
            token: hex::encode(token),
        },
        Frame::Stream {
            stream_id,
            offset,
            data,
            fin,
        } => FrameRecord::Stream {
            stream_id: *stream_id,
            offset: *offset,
            length: data.len() as u64,
            fin: *fin,
        },
        Frame::MaxData { maximum } => FrameRecord::MaxData { maximum: *maximum },
        Frame::MaxStreamData { stream_id, maximum } => FrameRecord::MaxStreamData {
            stream_id: *stream_id,
            maximum: *maximum,
        },
        Frame::MaxStreams {
            stream_type,
            maximum,
        } => FrameRecord::MaxStreams {
            stream_type: *stream_type,
            maximum: *maximum,
        },
        Frame::DataBlocked { limit } => FrameRecord::DataBlocked { limit: *limit },
        Frame::StreamDataBlocked { stream_id, limit } => FrameRecord::StreamDataBlocked {
            stream_id: *stream_id,
            limit: *limit,
        },
        Frame::StreamsBlocked { stream_type, limit } => FrameRecord::StreamsBlocked {
            stream_type: *stream_type,
            limit: *limit,
        },
        Frame::NewConnectionId {
            sequence_number,
            retire_prior_to,
            connection_id,
            stateless_reset_token,
        } => FrameRecord::NewConnectionId {
            sequence_number: *sequence_number,
            retire_prior_to: *retire_prior_to,
            length: connection_id.len(),
            connection_id: connection_id.clone(),
            stateless_reset_token: hex::encode(stateless_reset_token),
        },
        Frame::RetireConnectionId { sequence_number } => FrameRecord::RetireConnectionId {
            sequence_number: *sequence_number,
        },
        Frame::PathChallenge { data } => FrameRecord::PathChallenge {
            data: hex::encode(data),
        },
        Frame::PathResponse { data } => FrameRecord::PathResponse {
            data: hex::encode(data),
        },
        Frame::ConnectionClose {
            is_application_error,
            error_code,
            frame_type,
            reason,
        } => {
            let (error_space, code, trigger_frame_type) = if *is_application_error {
                (ErrorSpace::Application, ErrorCode::Raw(*error_code), None)
            } else {
                let code = match transport_error_name(*error_code) {
                    Some(name) => ErrorCode::Named(name),
                    None => ErrorCode::Raw(*error_code),
                };
                (ErrorSpace::Transport, code, *frame_type)
            };
            FrameRecord::ConnectionClose {
                error_space,
                error_code: code,
                raw_error_code: *error_code,
                reason: reason.clone(),
                trigger_frame_type,
            }
        }
        Frame::HandshakeDone => FrameRecord::HandshakeDone,
        Frame::Unknown { frame_type } => {
            return Err(QlogError::UnknownFrameVariant {
                frame_type: *frame_type,
            })
        }
    };

    Ok(record)
}

/// Transform every frame of a packet, preserving order
///
/// Fails on the first frame that cannot be mapped; no partial list is returned.
pub fn transform_frames(frames: &[Frame]) -> Result<Vec<FrameRecord>> {
    frames.iter().map(transform_frame).collect()
}

/// RFC 9000 section 20.1 transport error names
fn transport_error_name(code: u64) -> Option<String> {
    let name = match code {
        0x00 => "no_error",
        0x01 => "internal_error",
        0x02 => "connection_refused",
        0x03 => "flow_control_error",
        0x04 => "stream_limit_error",
        0x05 => "stream_state_error",
        0x06 => "final_size_error",
        0x07 => "frame_encoding_error",
        0x08 => "transport_parameter_error",
        0x09 => "connection_id_limit_error",
        0x0a => "protocol_violation",
        0x0b => "invalid_token",
        0x0c => "application_error",
        0x0d => "crypto_buffer_exceeded",
        0x0e => "key_update_error",
        0x0f => "aead_limit_reached",
        0x10 => "no_viable_path",
        // TLS alerts carried as transport errors
        0x100..=0x1ff => return Some(format!("crypto_error_{:#x}", code)),
        _ => return None,
    };
    Some(name.to_string())
}
