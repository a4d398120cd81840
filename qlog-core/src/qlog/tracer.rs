//! Per-connection trace recorder
//!
//! The tracer buffers one [`Event`] per sent or received packet and renders
//! the buffer on demand. It is owned by the connection: intake takes
//! `&mut self` and export takes `&self`, so exporting while another thread
//! records requires the caller to pick a synchronization strategy (see
//! `SharedTracer` behind the `shared` feature, or [`Tracer::snapshot`]).
//!
//! The buffer is never pruned. A long-lived connection grows it without
//! bound; callers that care should export and drop the tracer periodically.

use std::borrow::Cow;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::{DateTime, Utc};

use crate::error::{QlogError, Result};
use crate::wire::{ConnectionId, Frame, Header, Perspective};

use super::document::{Trace, TraceDocument};
use super::event::{Event, EventType};

/// Default document title
pub const DEFAULT_TITLE: &str = "qlog-core trace";

/// Tracer configuration
#[derive(Debug, Clone)]
pub struct TracerConfig {
    /// Document title
    pub title: String,
    /// Optional free-form description
    pub description: Option<String>,
    /// Pretty-print the JSON on export
    pub pretty: bool,
}

impl Default for TracerConfig {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            description: None,
            pretty: false,
        }
    }
}

impl TracerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }
}

/// Hook the protocol engine calls as packets move
///
/// Lets a connection hold `Box<dyn ConnectionTracer>` and swap in
/// [`NullTracer`] when tracing is disabled.
pub trait ConnectionTracer: Send {
    /// Record a packet this endpoint sent
    fn sent_packet(&mut self, time: DateTime<Utc>, header: &Header, frames: &[Frame])
        -> Result<()>;

    /// Record a packet this endpoint received
    fn received_packet(
        &mut self,
        time: DateTime<Utc>,
        header: &Header,
        frames: &[Frame],
    ) -> Result<()>;

    /// Write the trace recorded so far
    fn export(&self, sink: &mut dyn Write) -> Result<()>;

    /// Tracer name (for logging)
    fn name(&self) -> &'static str;
}

/// Records qlog events for a single connection
#[derive(Debug, Clone)]
pub struct Tracer {
    perspective: Perspective,
    odcid: ConnectionId,
    config: TracerConfig,
    events: Vec<Event>,
}

impl Tracer {
    /// Create a tracer with the default configuration
    pub fn new(perspective: Perspective, odcid: ConnectionId) -> Self {
        Self::with_config(perspective, odcid, TracerConfig::default())
    }

    pub fn with_config(perspective: Perspective, odcid: ConnectionId, config: TracerConfig) -> Self {
        tracing::debug!("Created {} tracer for connection {}", perspective, odcid);
        Self {
            perspective,
            odcid,
            config,
            events: Vec::new(),
        }
    }

    pub fn perspective(&self) -> Perspective {
        self.perspective
    }

    pub fn original_connection_id(&self) -> &ConnectionId {
        &self.odcid
    }

    pub fn config(&self) -> &TracerConfig {
        &self.config
    }

    /// Events recorded so far, in call order
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Record a sent packet
    ///
    /// If any frame or the header cannot be mapped, the error is returned
    /// and nothing is recorded.
    pub fn record_sent(
        &mut self,
        time: DateTime<Utc>,
        header: &Header,
        frames: &[Frame],
    ) -> Result<()> {
        let event = Event::packet_sent(time, header, frames)
            .map_err(|e| rejected(EventType::PacketSent, header, frames, e))?;
        self.push(event);
        Ok(())
    }

    /// Record a received packet
    pub fn record_received(
        &mut self,
        time: DateTime<Utc>,
        header: &Header,
        frames: &[Frame],
    ) -> Result<()> {
        let event = Event::packet_received(time, header, frames)
            .map_err(|e| rejected(EventType::PacketReceived, header, frames, e))?;
        self.push(event);
        Ok(())
    }

    fn push(&mut self, event: Event) {
        tracing::trace!(
            "{} on {}: pn {}, {} frames",
            event.event_type(),
            self.odcid,
            event.data.packet().header.packet_number,
            event.data.packet().frames.len()
        );
        self.events.push(event);
    }

    /// Build a document over the current buffer without copying it
    pub fn document(&self) -> TraceDocument<'_> {
        TraceDocument::new(
            Cow::Borrowed(self.config.title.as_str()),
            self.config.description.as_deref().map(Cow::Borrowed),
            Trace::new(
                self.perspective,
                self.odcid.clone(),
                Cow::Borrowed(self.events.as_slice()),
            ),
        )
    }

    /// Point-in-time copy of the trace
    ///
    /// The returned document is unaffected by later intake and can be sent
    /// to another thread for export.
    pub fn snapshot(&self) -> TraceDocument<'static> {
        self.document().into_owned()
    }

    /// Write the qlog document for everything recorded so far
    ///
    /// Repeatable: the buffer is left untouched, so a later export also
    /// contains these events.
    pub fn export<W: Write>(&self, sink: W) -> Result<()> {
        tracing::debug!(
            "Exporting qlog trace for {} ({} events)",
            self.odcid,
            self.events.len()
        );
        self.document().write_to(sink, self.config.pretty)
    }

    /// Export into a newly created (or truncated) file
    pub fn export_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path.as_ref())?;
        self.export(BufWriter::new(file))
    }
}

fn rejected(
    event_type: EventType,
    header: &Header,
    frames: &[Frame],
    err: QlogError,
) -> QlogError {
    let frame_types: Vec<u64> = frames.iter().map(Frame::wire_type).collect();
    tracing::warn!(
        "Rejected {} for pn {} (frame types {:x?}): {}",
        event_type,
        header.packet_number,
        frame_types,
        err
    );
    err
}

impl ConnectionTracer for Tracer {
    fn sent_packet(
        &mut self,
        time: DateTime<Utc>,
        header: &Header,
        frames: &[Frame],
    ) -> Result<()> {
        self.record_sent(time, header, frames)
    }

    fn received_packet(
        &mut self,
        time: DateTime<Utc>,
        header: &Header,
        frames: &[Frame],
    ) -> Result<()> {
        self.record_received(time, header, frames)
    }

    fn export(&self, sink: &mut dyn Write) -> Result<()> {
        Tracer::export(self, sink)
    }

    fn name(&self) -> &'static str {
        "qlog"
    }
}

/// Tracer that discards everything
///
/// Export writes nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullTracer;

impl ConnectionTracer for NullTracer {
    fn sent_packet(&mut self, _: DateTime<Utc>, _: &Header, _: &[Frame]) -> Result<()> {
        Ok(())
    }

    fn received_packet(&mut self, _: DateTime<Utc>, _: &Header, _: &[Frame]) -> Result<()> {
        Ok(())
    }

    fn export(&self, _sink: &mut dyn Write) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "null"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::{LongHeaderType, Version};
    use serde_json::Value;

    fn tracer() -> Tracer {
        Tracer::new(Perspective::Server, ConnectionId::from([0xde, 0xad, 0xbe, 0xef]))
    }

    fn initial(pn: u64) -> Header {
        Header::long(
            LongHeaderType::Initial,
            Version::V1,
            ConnectionId::from([1, 2, 3, 4]),
            ConnectionId::from([5, 6]),
            pn,
        )
    }

    fn export_json(tracer: &Tracer) -> Value {
        let mut buf = Vec::new();
        tracer.export(&mut buf).unwrap();
        serde_json::from_slice(&buf).unwrap()
    }

    #[test]
    fn test_new_tracer_is_empty() {
        let t = tracer();
        assert!(t.is_empty());
        assert_eq!(t.perspective(), Perspective::Server);
        assert_eq!(t.original_connection_id().to_hex(), "deadbeef");

        let json = export_json(&t);
        assert_eq!(json["title"], DEFAULT_TITLE);
        assert_eq!(json["traces"][0]["events"], serde_json::json!([]));
    }

    #[test]
    fn test_records_in_call_order() {
        let mut t = tracer();
        t.record_received(Utc::now(), &initial(0), &[Frame::Ping]).unwrap();
        t.record_sent(Utc::now(), &initial(0), &[]).unwrap();
        t.record_sent(Utc::now(), &initial(1), &[Frame::HandshakeDone]).unwrap();

        assert_eq!(t.len(), 3);
        let json = export_json(&t);
        let events = json["traces"][0]["events"].as_array().unwrap();
        let names: Vec<_> = events.iter().map(|e| e[2].as_str().unwrap()).collect();
        assert_eq!(names, vec!["packet_received", "packet_sent", "packet_sent"]);
        assert_eq!(events[2][3]["header"]["packet_number"], 1);
    }

    #[test]
    fn test_failed_intake_records_nothing() {
        let mut t = tracer();
        let err = t
            .record_sent(
                Utc::now(),
                &initial(0),
                &[Frame::Ping, Frame::Unknown { frame_type: 0x30 }],
            )
            .unwrap_err();
        assert!(matches!(err, QlogError::UnknownFrameVariant { .. }));

        let bad_header = Header::long(
            LongHeaderType::Unknown(4),
            Version::V1,
            ConnectionId::from([1]),
            ConnectionId::from([2]),
            0,
        );
        assert!(t.record_received(Utc::now(), &bad_header, &[]).is_err());
        assert!(t.is_empty());
    }

    #[test]
    fn test_export_is_cumulative() {
        let mut t = tracer();
        t.record_sent(Utc::now(), &initial(0), &[]).unwrap();
        assert_eq!(export_json(&t)["traces"][0]["events"].as_array().unwrap().len(), 1);

        t.record_sent(Utc::now(), &initial(1), &[]).unwrap();
        assert_eq!(export_json(&t)["traces"][0]["events"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_snapshot_is_point_in_time() {
        let mut t = tracer();
        t.record_sent(Utc::now(), &initial(0), &[]).unwrap();
        let snapshot = t.snapshot();

        t.record_sent(Utc::now(), &initial(1), &[]).unwrap();
        assert_eq!(snapshot.event_count(), 1);
        assert_eq!(t.document().event_count(), 2);
    }

    #[test]
    fn test_config_is_applied() {
        let config = TracerConfig::new()
            .title("handshake test")
            .description("client side")
            .pretty(true);
        let t = Tracer::with_config(Perspective::Client, ConnectionId::from([1]), config);

        let mut buf = Vec::new();
        t.export(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("\n  \"qlog_version\""));

        let json: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(json["title"], "handshake test");
        assert_eq!(json["description"], "client side");
        assert_eq!(json["traces"][0]["vantage_point"]["type"], "client");
    }

    #[test]
    fn test_dyn_connection_tracer() {
        let mut tracers: Vec<Box<dyn ConnectionTracer>> =
            vec![Box::new(tracer()), Box::new(NullTracer)];

        for t in tracers.iter_mut() {
            t.sent_packet(Utc::now(), &initial(0), &[Frame::Ping]).unwrap();
        }

        let mut qlog = Vec::new();
        tracers[0].export(&mut qlog).unwrap();
        assert!(!qlog.is_empty());
        assert_eq!(tracers[0].name(), "qlog");

        let mut null = Vec::new();
        tracers[1].export(&mut null).unwrap();
        assert!(null.is_empty());
        assert_eq!(tracers[1].name(), "null");
    }
}
