//! Record types
//!
//! A `Reading` is what the parser extracts from one line. A `Record` is a
//! reading stamped with the moment the relay observed it, and is the unit that
//! is retained in history and pushed to viewers.

use chrono::{DateTime, Local};
use serde::{Serialize, Serializer};

/// Format of the `timestamp` field in serialized records (local time)
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Fields parsed from a single device line
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    /// Identifier reported by the device
    pub id: u64,
    /// Elapsed time reported by the device, in seconds
    pub time: f64,
}

impl Reading {
    pub fn new(id: u64, time: f64) -> Self {
        Self { id, time }
    }
}

/// One telemetry event, immutable once created
///
/// Serializes as `{ "id": 42, "time": 1.234, "timestamp": "2024-01-01 12:00:00" }`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Record {
    /// Identifier reported by the device (not checked for uniqueness)
    pub id: u64,
    /// Elapsed seconds reported by the device
    pub time: f64,
    /// When the relay parsed the line
    #[serde(rename = "timestamp", serialize_with = "serialize_timestamp")]
    pub observed_at: DateTime<Local>,
}

impl Record {
    /// Stamp a reading with the given observation time
    pub fn observed(reading: Reading, observed_at: DateTime<Local>) -> Self {
        Self {
            id: reading.id,
            time: reading.time,
            observed_at,
        }
    }

    /// Observation time in the wire format
    pub fn timestamp(&self) -> String {
        self.observed_at.format(TIMESTAMP_FORMAT).to_string()
    }
}

fn serialize_timestamp<S>(at: &DateTime<Local>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_str(&at.format(TIMESTAMP_FORMAT))
}

/// Event pushed to live viewers
///
/// Serializes as `{ "event": "new_data", "data": { ...record... } }`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum PushEvent {
    /// A record, either replayed from history or newly published
    NewData(Record),
}

impl From<Record> for PushEvent {
    fn from(record: Record) -> Self {
        PushEvent::NewData(record)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn fixed_time() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap()
    }

    #[test]
    fn test_record_json_shape() {
        let record = Record::observed(Reading::new(42, 1.234), fixed_time());
        let json = serde_json::to_value(record).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "id": 42,
                "time": 1.234,
                "timestamp": "2024-03-09 14:05:07",
            })
        );
    }

    #[test]
    fn test_push_event_envelope() {
        let record = Record::observed(Reading::new(7, 0.5), fixed_time());
        let json = serde_json::to_value(PushEvent::from(record)).unwrap();

        assert_eq!(json["event"], "new_data");
        assert_eq!(json["data"]["id"], 7);
        assert_eq!(json["data"]["time"], 0.5);
    }

    #[test]
    fn test_observed_copies_reading() {
        let record = Record::observed(Reading::new(3, 9.75), Local::now());

        assert_eq!((record.id, record.time), (3, 9.75));
        assert_eq!(record.timestamp().len(), "YYYY-MM-DD HH:MM:SS".len());
    }
}
