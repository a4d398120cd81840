//! # qlog-core
//!
//! Records what a QUIC connection sends and receives as a qlog trace:
//!
//! - **wire**: the decoded headers and frames the protocol engine hands over
//! - **qlog**: the transformation of those values into qlog records, the
//!   per-connection [`Tracer`] buffer, and the document encoder
//!
//! ## Core Principle
//!
//! > A trace that is missing a frame must never look complete.
//!
//! Frames or headers the tracer cannot map fail the intake call instead of
//! being dropped, and sink write failures are always returned to the caller.
//!
//! ## Example
//!
//! ```rust
//! use chrono::Utc;
//! use qlog_core::{ConnectionId, Frame, Header, LongHeaderType, Perspective, Tracer, Version};
//!
//! let mut tracer = Tracer::new(Perspective::Server, ConnectionId::from([0xde, 0xad, 0xbe, 0xef]));
//!
//! let header = Header::long(
//!     LongHeaderType::Handshake,
//!     Version::V1,
//!     ConnectionId::from([1, 2, 3, 4, 5, 6, 7, 8]),
//!     ConnectionId::from([4, 3, 2, 1]),
//!     1337,
//! );
//! tracer.record_sent(
//!     Utc::now(),
//!     &header,
//!     &[
//!         Frame::MaxStreamData { stream_id: 42, maximum: 987 },
//!         Frame::Stream { stream_id: 123, offset: 1234, data: b"foobar".to_vec(), fin: true },
//!     ],
//! ).unwrap();
//!
//! let mut out = Vec::new();
//! tracer.export(&mut out).unwrap();
//!
//! let doc: serde_json::Value = serde_json::from_slice(&out).unwrap();
//! assert_eq!(doc["traces"][0]["common_fields"]["ODCID"], "deadbeef");
//! ```

pub mod error;
pub mod qlog;
pub mod wire;

// Re-export main types
pub use error::{ErrorCategory, QlogError, Result};
pub use qlog::{
    ConnectionTracer, Event, EventType, FrameRecord, HeaderRecord, NullTracer, PacketType,
    TraceDocument, Tracer, TracerConfig, EVENT_FIELDS, QLOG_VERSION,
};
#[cfg(feature = "shared")]
pub use qlog::SharedTracer;
pub use wire::{
    AckRange, ConnectionId, Frame, Header, HeaderForm, LongHeaderType, Perspective, StreamType,
    Version,
};
