//! Trace assembly and encoding
//!
//! A [`TraceDocument`] is the top-level qlog object. It either borrows a
//! tracer's event buffer (for a direct export) or owns a copy of it (for a
//! snapshot that outlives further intake).

use std::borrow::Cow;
use std::io::Write;

use serde::Serialize;

use crate::error::Result;
use crate::wire::{ConnectionId, Perspective};

use super::event::Event;

/// qlog schema version this crate emits
pub const QLOG_VERSION: &str = "draft-02-wip";

/// Unit of every event timestamp: milliseconds since the Unix epoch
pub const TIME_UNITS: &str = "ms";

/// Columns of a serialized event tuple
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventField {
    Time,
    Category,
    Event,
    Data,
}

/// Column order of every event tuple
///
/// Events serialize by walking this array, so the declared `event_fields`
/// and the tuples always agree.
pub const EVENT_FIELDS: [EventField; 4] = [
    EventField::Time,
    EventField::Category,
    EventField::Event,
    EventField::Data,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VantagePoint {
    #[serde(rename = "type")]
    pub perspective: Perspective,
}

/// Fields shared by every event of a trace
///
/// Both ids are the original destination connection id; the constructor is
/// the only way to build one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommonFields {
    #[serde(rename = "ODCID")]
    odcid: ConnectionId,
    group_id: ConnectionId,
}

impl CommonFields {
    pub fn new(odcid: ConnectionId) -> Self {
        Self {
            group_id: odcid.clone(),
            odcid,
        }
    }

    pub fn odcid(&self) -> &ConnectionId {
        &self.odcid
    }

    pub fn group_id(&self) -> &ConnectionId {
        &self.group_id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Configuration {
    pub time_units: &'static str,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            time_units: TIME_UNITS,
        }
    }
}

/// One connection's trace
#[derive(Debug, Clone, Serialize)]
pub struct Trace<'a> {
    pub vantage_point: VantagePoint,
    pub common_fields: CommonFields,
    pub configuration: Configuration,
    pub event_fields: &'static [EventField],
    pub events: Cow<'a, [Event]>,
}

impl<'a> Trace<'a> {
    pub fn new(perspective: Perspective, odcid: ConnectionId, events: Cow<'a, [Event]>) -> Self {
        Self {
            vantage_point: VantagePoint { perspective },
            common_fields: CommonFields::new(odcid),
            configuration: Configuration::default(),
            event_fields: &EVENT_FIELDS,
            events,
        }
    }

    pub fn into_owned(self) -> Trace<'static> {
        Trace {
            vantage_point: self.vantage_point,
            common_fields: self.common_fields,
            configuration: self.configuration,
            event_fields: self.event_fields,
            events: Cow::Owned(self.events.into_owned()),
        }
    }
}

/// Top-level qlog document
#[derive(Debug, Clone, Serialize)]
pub struct TraceDocument<'a> {
    pub qlog_version: &'static str,
    pub title: Cow<'a, str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Cow<'a, str>>,
    pub traces: Vec<Trace<'a>>,
}

impl<'a> TraceDocument<'a> {
    /// Build a document holding a single trace
    pub fn new(title: Cow<'a, str>, description: Option<Cow<'a, str>>, trace: Trace<'a>) -> Self {
        Self {
            qlog_version: QLOG_VERSION,
            title,
            description,
            traces: vec![trace],
        }
    }

    /// Number of events across all traces
    pub fn event_count(&self) -> usize {
        self.traces.iter().map(|t| t.events.len()).sum()
    }

    /// Detach the document from the tracer it was built from
    pub fn into_owned(self) -> TraceDocument<'static> {
        TraceDocument {
            qlog_version: self.qlog_version,
            title: Cow::Owned(self.title.into_owned()),
            description: self.description.map(|d| Cow::Owned(d.into_owned())),
            traces: self.traces.into_iter().map(Trace::into_owned).collect(),
        }
    }

    /// Encode as JSON into `sink`, terminated by a newline
    ///
    /// The sink is flushed before returning. Any write failure is returned
    /// as [`QlogError::SinkWrite`](crate::error::QlogError::SinkWrite).
    pub fn write_to<W: Write>(&self, mut sink: W, pretty: bool) -> Result<()> {
        if pretty {
            serde_json::to_writer_pretty(&mut sink, self)?;
        } else {
            serde_json::to_writer(&mut sink, self)?;
        }
        sink.write_all(b"\n")?;
        sink.flush()?;
        Ok(())
    }

    /// Encode as a compact JSON string
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
