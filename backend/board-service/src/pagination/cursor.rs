//! Opaque continuation token for activity feeds.
//!
//! A cursor is base64 (standard alphabet, padded) over a fixed JSON record:
//!
//! ```text
//! {"last_activity_cursor":"2020-04-15T05:42:00.000000","page_size":10}
//! ```
//!
//! `last_activity_id` is appended only when the page boundary splits items
//! with identical timestamps.

use base64::{engine::general_purpose, Engine as _};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

use super::timestamp::{format_timestamp, parse_timestamp, TimestampError, TimestampPrecision};

#[derive(Debug, Error)]
pub enum CursorError {
    #[error("cursor is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("cursor payload is not a valid cursor record: {0}")]
    Json(#[from] serde_json::Error),

    #[error("cursor timestamp {0}")]
    Timestamp(#[from] TimestampError),

    #[error("cursor page size must be positive")]
    EmptyPage,

    #[error("cursor page size {page_size} exceeds the maximum of {max}")]
    PageTooLarge { page_size: u32, max: u32 },
}

/// Wire record. Field order here is the serialized key order.
#[derive(Serialize, Deserialize)]
struct CursorRecord {
    last_activity_cursor: String,
    page_size: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_activity_id: Option<Uuid>,
}

/// "Resume strictly before `last_activity_cursor`, `page_size` items at a time."
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    last_activity_cursor: NaiveDateTime,
    page_size: u32,
    last_activity_id: Option<Uuid>,
}

impl Cursor {
    /// Build a cursor, refusing timestamps the wire format cannot carry.
    pub fn new(last_activity_cursor: NaiveDateTime, page_size: u32) -> Result<Self, CursorError> {
        if page_size == 0 {
            return Err(CursorError::EmptyPage);
        }
        if !TimestampPrecision::Microseconds.admits(last_activity_cursor) {
            return Err(TimestampError::TooPrecise(last_activity_cursor.to_string()).into());
        }

        Ok(Self {
            last_activity_cursor,
            page_size,
            last_activity_id: None,
        })
    }

    /// Attach the id of the last served item for a boundary inside a tie.
    pub fn with_tie_break(mut self, last_activity_id: Uuid) -> Self {
        self.last_activity_id = Some(last_activity_id);
        self
    }

    pub fn last_activity_cursor(&self) -> NaiveDateTime {
        self.last_activity_cursor
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn last_activity_id(&self) -> Option<Uuid> {
        self.last_activity_id
    }

    pub fn encode(&self) -> Result<String, CursorError> {
        let record = CursorRecord {
            last_activity_cursor: format_timestamp(&self.last_activity_cursor),
            page_size: self.page_size,
            last_activity_id: self.last_activity_id,
        };
        let json = serde_json::to_vec(&record)?;

        Ok(general_purpose::STANDARD.encode(json))
    }

    pub fn decode(encoded: &str) -> Result<Self, CursorError> {
        let json = general_purpose::STANDARD.decode(encoded.trim())?;
        let record: CursorRecord = serde_json::from_slice(&json)?;
        let last_activity_cursor = parse_timestamp(&record.last_activity_cursor)?;

        let cursor = Self::new(last_activity_cursor, record.page_size)?;
        Ok(match record.last_activity_id {
            Some(id) => cursor.with_tie_break(id),
            None => cursor,
        })
    }
}

impl FromStr for Cursor {
    type Err = CursorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(day: u32, micros: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2020, 4, day)
            .unwrap()
            .and_hms_micro_opt(5, 42, 0, micros)
            .unwrap()
    }

    fn decode_json(encoded: &str) -> serde_json::Value {
        let bytes = general_purpose::STANDARD.decode(encoded).unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_encode_matches_legacy_tokens() {
        let cursor = Cursor::new(at(15, 0), 10).unwrap();
        assert_eq!(
            cursor.encode().unwrap(),
            "eyJsYXN0X2FjdGl2aXR5X2N1cnNvciI6IjIwMjAtMDQtMTVUMDU6NDI6MDAuMDAwMDAwIiwicGFnZV9zaXplIjoxMH0="
        );
    }

    #[test]
    fn test_encode_is_deterministic() {
        let cursor = Cursor::new(at(20, 123), 5).unwrap();
        assert_eq!(cursor.encode().unwrap(), cursor.encode().unwrap());
        assert_eq!(
            decode_json(&cursor.encode().unwrap()),
            serde_json::json!({
                "last_activity_cursor": "2020-04-20T05:42:00.000123",
                "page_size": 5,
            })
        );
    }

    #[test]
    fn test_round_trip_keeps_microseconds() {
        for cursor in [
            Cursor::new(at(1, 0), 1).unwrap(),
            Cursor::new(at(1, 1), 10).unwrap(),
            Cursor::new(at(30, 999_999), 100).unwrap(),
            Cursor::new(at(9, 500_000), 7)
                .unwrap()
                .with_tie_break(Uuid::from_u128(42)),
        ] {
            let decoded = Cursor::decode(&cursor.encode().unwrap()).unwrap();
            assert_eq!(decoded, cursor);
        }
    }

    #[test]
    fn test_decode_legacy_cursor_without_fraction() {
        let cursor: Cursor =
            "eyJsYXN0X2FjdGl2aXR5X2N1cnNvciI6IjIwMjAtMDQtMTBUMDU6NDI6MDAiLCJwYWdlX3NpemUiOjEwfQ=="
                .parse()
                .unwrap();

        assert_eq!(cursor.last_activity_cursor(), at(10, 0));
        assert_eq!(cursor.page_size(), 10);
        assert_eq!(cursor.last_activity_id(), None);
    }

    #[test]
    fn test_tie_break_is_serialized_last() {
        let id = Uuid::from_u128(7);
        let encoded = Cursor::new(at(2, 0), 3)
            .unwrap()
            .with_tie_break(id)
            .encode()
            .unwrap();

        let json = String::from_utf8(general_purpose::STANDARD.decode(&encoded).unwrap()).unwrap();
        assert_eq!(
            json,
            format!(
                r#"{{"last_activity_cursor":"2020-04-02T05:42:00.000000","page_size":3,"last_activity_id":"{}"}}"#,
                id
            )
        );
    }

    #[test]
    fn test_decode_rejects_malformed_input() {
        assert!(matches!(
            Cursor::decode("not base64!"),
            Err(CursorError::Base64(_))
        ));

        let not_json = general_purpose::STANDARD.encode("offset:10");
        assert!(matches!(Cursor::decode(&not_json), Err(CursorError::Json(_))));

        let missing_size = general_purpose::STANDARD
            .encode(r#"{"last_activity_cursor":"2020-04-10T05:42:00"}"#);
        assert!(matches!(
            Cursor::decode(&missing_size),
            Err(CursorError::Json(_))
        ));

        let bad_time = general_purpose::STANDARD
            .encode(r#"{"last_activity_cursor":"last tuesday","page_size":10}"#);
        assert!(matches!(
            Cursor::decode(&bad_time),
            Err(CursorError::Timestamp(TimestampError::Malformed(_)))
        ));

        let negative = general_purpose::STANDARD
            .encode(r#"{"last_activity_cursor":"2020-04-10T05:42:00","page_size":-1}"#);
        assert!(matches!(Cursor::decode(&negative), Err(CursorError::Json(_))));

        let zero = general_purpose::STANDARD
            .encode(r#"{"last_activity_cursor":"2020-04-10T05:42:00","page_size":0}"#);
        assert!(matches!(Cursor::decode(&zero), Err(CursorError::EmptyPage)));
    }

    #[test]
    fn test_decode_rejects_sub_microsecond_timestamps() {
        let encoded = general_purpose::STANDARD
            .encode(r#"{"last_activity_cursor":"2020-04-10T05:42:00.0000001","page_size":10}"#);
        assert!(matches!(
            Cursor::decode(&encoded),
            Err(CursorError::Timestamp(TimestampError::TooPrecise(_)))
        ));

        let nanos = at(10, 0) + chrono::Duration::nanoseconds(1);
        assert!(Cursor::new(nanos, 10).is_err());
    }
}
