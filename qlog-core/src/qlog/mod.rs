//! qlog recording for QUIC connections
//!
//! Turns the packets a connection sends and receives into a qlog (draft-02)
//! document that tools like qvis can load.
//!
//! ## Architecture
//!
//! ```text
//! protocol engine                   Tracer                     export
//! ───────────────                   ──────                     ──────
//! (Header, [Frame]) ──► transform_header ─┐
//!                       transform_frame ──┴─► Event ──► Vec<Event> ──► TraceDocument ──► io::Write
//! ```
//!
//! - **Append-only**: events are kept in call order and never removed
//! - **All-or-nothing intake**: an unknown frame or header type fails the
//!   call and records nothing
//! - **Cumulative export**: every export renders the whole buffer; use
//!   [`Tracer::snapshot`] for a point-in-time copy

mod document;
mod event;
mod frame;
mod header;
mod tracer;

#[cfg(feature = "shared")]
mod shared;

pub use document::{
    CommonFields, Configuration, EventField, Trace, TraceDocument, VantagePoint, EVENT_FIELDS,
    QLOG_VERSION, TIME_UNITS,
};
pub use event::{Category, Event, EventData, EventType, PacketEvent};
pub use frame::{transform_frame, transform_frames, AckedRange, ErrorCode, ErrorSpace, FrameRecord};
pub use header::{packet_type, transform_header, HeaderRecord, PacketType};
pub use tracer::{ConnectionTracer, NullTracer, Tracer, TracerConfig, DEFAULT_TITLE};

#[cfg(feature = "shared")]
pub use shared::SharedTracer;
