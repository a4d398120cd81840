//! qlog event types

use chrono::{DateTime, Utc};
use serde::ser::{Serialize, SerializeSeq, Serializer};

use crate::error::Result;
use crate::wire::{Frame, Header};

use super::document::{EventField, EVENT_FIELDS};
use super::frame::{transform_frames, FrameRecord};
use super::header::{transform_header, HeaderRecord, PacketType};

/// Event categories defined by the qlog QUIC schema that this crate emits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Transport,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Transport => "transport",
        }
    }
}

/// Event names within a category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    PacketSent,
    PacketReceived,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::PacketSent => "packet_sent",
            EventType::PacketReceived => "packet_received",
        }
    }

    pub fn category(&self) -> Category {
        match self {
            EventType::PacketSent | EventType::PacketReceived => Category::Transport,
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for EventType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "packet_sent" => Ok(EventType::PacketSent),
            "packet_received" => Ok(EventType::PacketReceived),
            _ => Err(format!("Unknown event type: {}", s)),
        }
    }
}

/// Payload shared by `packet_sent` and `packet_received`
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct PacketEvent {
    pub packet_type: PacketType,
    pub header: HeaderRecord,
    pub frames: Vec<FrameRecord>,
}

impl PacketEvent {
    /// Transform a header and its frames; fails without a partial result
    pub fn new(header: &Header, frames: &[Frame]) -> Result<Self> {
        let (packet_type, header) = transform_header(header)?;
        let frames = transform_frames(frames)?;
        Ok(Self {
            packet_type,
            header,
            frames,
        })
    }
}

/// Event payload, one variant per event type
#[derive(Debug, Clone, PartialEq)]
pub enum EventData {
    PacketSent(PacketEvent),
    PacketReceived(PacketEvent),
}

impl EventData {
    pub fn event_type(&self) -> EventType {
        match self {
            EventData::PacketSent(_) => EventType::PacketSent,
            EventData::PacketReceived(_) => EventType::PacketReceived,
        }
    }

    pub fn packet(&self) -> &PacketEvent {
        match self {
            EventData::PacketSent(data) | EventData::PacketReceived(data) => data,
        }
    }
}

impl Serialize for EventData {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.packet().serialize(serializer)
    }
}

/// A single recorded event
///
/// Serializes as a positional tuple in [`EVENT_FIELDS`] order.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub time: DateTime<Utc>,
    pub data: EventData,
}

impl Event {
    pub fn packet_sent(time: DateTime<Utc>, header: &Header, frames: &[Frame]) -> Result<Self> {
        Ok(Self {
            time,
            data: EventData::PacketSent(PacketEvent::new(header, frames)?),
        })
    }

    pub fn packet_received(
        time: DateTime<Utc>,
        header: &Header,
        frames: &[Frame],
    ) -> Result<Self> {
        Ok(Self {
            time,
            data: EventData::PacketReceived(PacketEvent::new(header, frames)?),
        })
    }

    pub fn event_type(&self) -> EventType {
        self.data.event_type()
    }

    pub fn category(&self) -> Category {
        self.event_type().category()
    }

    /// Milliseconds since the Unix epoch, microsecond resolution
    pub fn time_ms(&self) -> f64 {
        self.time.timestamp_micros() as f64 / 1000.0
    }
}

impl Serialize for Event {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(EVENT_FIELDS.len()))?;
        for field in EVENT_FIELDS {
            match field {
                EventField::Time => seq.serialize_element(&self.time_ms())?,
                EventField::Category => seq.serialize_element(self.category().as_str())?,
                EventField::Event => seq.serialize_element(self.event_type().as_str())?,
                EventField::Data => seq.serialize_element(&self.data)?,
            }
        }
        seq.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::{ConnectionId, LongHeaderType, Version};
    use chrono::TimeZone;
    use serde_json::json;

    fn handshake_header() -> Header {
        Header::long(
            LongHeaderType::Handshake,
            Version::V1,
            ConnectionId::from([1, 2, 3, 4, 5, 6, 7, 8]),
            ConnectionId::from([4, 3, 2, 1]),
            1337,
        )
    }

    #[test]
    fn test_event_tuple_layout() {
        let time = Utc.timestamp_opt(1_600_000_000, 250_000_000).unwrap();
        let event = Event::packet_sent(
            time,
            &handshake_header(),
            &[Frame::MaxStreamData {
                stream_id: 42,
                maximum: 987,
            }],
        )
        .unwrap();

        let json = serde_json::to_value(&event).unwrap();
        let tuple = json.as_array().unwrap();
        assert_eq!(tuple.len(), 4);
        assert_eq!(tuple[0], json!(1_600_000_000_250.0));
        assert_eq!(tuple[1], "transport");
        assert_eq!(tuple[2], "packet_sent");
        assert_eq!(tuple[3]["packet_type"], "handshake");
        assert_eq!(tuple[3]["header"]["packet_number"], 1337);
        assert_eq!(tuple[3]["frames"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_received_event() {
        let event = Event::packet_received(
            Utc::now(),
            &Header::short(ConnectionId::from([9, 9]), 3),
            &[Frame::Ping],
        )
        .unwrap();

        assert_eq!(event.event_type(), EventType::PacketReceived);
        assert_eq!(event.category(), Category::Transport);

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json[2], "packet_received");
        assert_eq!(json[3]["packet_type"], "one_rtt");
    }

    #[test]
    fn test_sub_millisecond_time() {
        let time = Utc.timestamp_opt(0, 1_500_000).unwrap();
        let event = Event::packet_sent(time, &handshake_header(), &[]).unwrap();
        assert_eq!(event.time_ms(), 1.5);
    }

    #[test]
    fn test_event_rejects_unknown_frame() {
        let result = Event::packet_sent(
            Utc::now(),
            &handshake_header(),
            &[Frame::Ping, Frame::Unknown { frame_type: 0x31 }],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_event_type_parsing() {
        assert_eq!(
            "packet_sent".parse::<EventType>().unwrap(),
            EventType::PacketSent
        );
        assert_eq!(EventType::PacketReceived.to_string(), "packet_received");
        assert!("packet_lost".parse::<EventType>().is_err());
    }

    #[test]
    fn test_category_and_name_slots_use_schema_strings() {
        let event =
            Event::packet_received(Utc::now(), &handshake_header(), &[Frame::Ping]).unwrap();
        assert_eq!(event.category(), Category::Transport);

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json[1], Category::Transport.as_str());
        assert_eq!(json[1], "transport");
        assert_eq!(json[2], EventType::PacketReceived.as_str());
    }
}
