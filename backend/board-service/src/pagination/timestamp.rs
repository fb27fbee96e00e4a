//! Activity timestamps and the ordering rules built on them.
//!
//! Feeds are ordered by last activity (newest first) with the item id as a
//! tie-breaker. Timestamps travel through the store, the cursor and the
//! comparison at full precision; nothing here ever rounds or truncates.

use chrono::{NaiveDateTime, Timelike};
use serde::Serializer;
use std::cmp::Ordering;
use thiserror::Error;
use uuid::Uuid;

/// Wire format for activity timestamps: ISO-8601, no offset, microseconds.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// Accepts zero to nine fractional digits; the digit count is checked first.
const TIMESTAMP_PARSE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

const MAX_FRACTIONAL_DIGITS: usize = 6;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TimestampError {
    #[error("'{0}' is not an ISO-8601 timestamp without offset")]
    Malformed(String),

    #[error("'{0}' is finer than microsecond precision")]
    TooPrecise(String),
}

/// Fractional-second resolution a store keeps for activity timestamps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TimestampPrecision {
    Milliseconds,
    #[default]
    Microseconds,
}

impl TimestampPrecision {
    pub fn fractional_digits(self) -> u32 {
        match self {
            Self::Milliseconds => 3,
            Self::Microseconds => 6,
        }
    }

    fn nanos_per_unit(self) -> u32 {
        match self {
            Self::Milliseconds => 1_000_000,
            Self::Microseconds => 1_000,
        }
    }

    /// Whether `at` is representable at this precision without loss.
    pub fn admits(self, at: NaiveDateTime) -> bool {
        at.nanosecond() % self.nanos_per_unit() == 0
    }
}

pub fn format_timestamp(at: &NaiveDateTime) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

pub fn parse_timestamp(raw: &str) -> Result<NaiveDateTime, TimestampError> {
    if let Some((_, fraction)) = raw.split_once('.') {
        if fraction.len() > MAX_FRACTIONAL_DIGITS && fraction.bytes().all(|b| b.is_ascii_digit()) {
            return Err(TimestampError::TooPrecise(raw.to_string()));
        }
    }

    NaiveDateTime::parse_from_str(raw, TIMESTAMP_PARSE_FORMAT)
        .map_err(|_| TimestampError::Malformed(raw.to_string()))
}

/// serde helper so response payloads use the same format as cursors.
pub fn serialize_timestamp<S: Serializer>(at: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&format_timestamp(at))
}

/// Position of an item in a feed.
///
/// `Ord` follows feed order: a key that sorts first is shown first, i.e.
/// newer activity before older, equal activity by ascending id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActivityKey {
    pub last_activity_at: NaiveDateTime,
    pub id: Uuid,
}

impl ActivityKey {
    pub fn new(last_activity_at: NaiveDateTime, id: Uuid) -> Self {
        Self {
            last_activity_at,
            id,
        }
    }
}

impl Ord for ActivityKey {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .last_activity_at
            .cmp(&self.last_activity_at)
            .then_with(|| self.id.cmp(&other.id))
    }
}

impl PartialOrd for ActivityKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Lower bound of a continuation page: everything strictly after the last
/// item already served.
///
/// Without a tie-break id the bound is `last_activity_at < before`. With one,
/// items sharing `before` exactly are also admitted when their id sorts after
/// it, which is how true duplicate timestamps are split across pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Boundary {
    pub before: NaiveDateTime,
    pub after_id: Option<Uuid>,
}

impl Boundary {
    pub fn admits(&self, key: &ActivityKey) -> bool {
        if key.last_activity_at < self.before {
            return true;
        }

        match self.after_id {
            Some(after_id) => key.last_activity_at == self.before && key.id > after_id,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(micros: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2020, 4, 15)
            .unwrap()
            .and_hms_micro_opt(5, 42, 0, micros)
            .unwrap()
    }

    #[test]
    fn test_format_always_writes_microseconds() {
        assert_eq!(format_timestamp(&at(0)), "2020-04-15T05:42:00.000000");
        assert_eq!(format_timestamp(&at(1)), "2020-04-15T05:42:00.000001");
        assert_eq!(format_timestamp(&at(123_456)), "2020-04-15T05:42:00.123456");
    }

    #[test]
    fn test_parse_accepts_any_precision_up_to_micros() {
        assert_eq!(parse_timestamp("2020-04-15T05:42:00").unwrap(), at(0));
        assert_eq!(parse_timestamp("2020-04-15T05:42:00.5").unwrap(), at(500_000));
        assert_eq!(parse_timestamp("2020-04-15T05:42:00.000").unwrap(), at(0));
        assert_eq!(
            parse_timestamp("2020-04-15T05:42:00.000001").unwrap(),
            at(1)
        );
    }

    #[test]
    fn test_parse_rejects_nanoseconds_and_garbage() {
        assert_eq!(
            parse_timestamp("2020-04-15T05:42:00.000000001"),
            Err(TimestampError::TooPrecise(
                "2020-04-15T05:42:00.000000001".to_string()
            ))
        );
        assert!(matches!(
            parse_timestamp("yesterday"),
            Err(TimestampError::Malformed(_))
        ));
        assert!(matches!(
            parse_timestamp("2020-04-15T05:42:00Z"),
            Err(TimestampError::Malformed(_))
        ));
    }

    #[test]
    fn test_precision_admits() {
        let millis = at(0) + chrono::Duration::milliseconds(7);
        let micros = at(7);
        let nanos = at(0) + chrono::Duration::nanoseconds(7);

        assert!(TimestampPrecision::Milliseconds.admits(millis));
        assert!(!TimestampPrecision::Milliseconds.admits(micros));
        assert!(TimestampPrecision::Microseconds.admits(micros));
        assert!(!TimestampPrecision::Microseconds.admits(nanos));
    }

    #[test]
    fn test_key_order_is_newest_first_then_id() {
        let newer = ActivityKey::new(at(1), Uuid::from_u128(9));
        let older = ActivityKey::new(at(0), Uuid::from_u128(1));
        let older_tie = ActivityKey::new(at(0), Uuid::from_u128(2));

        let mut keys = vec![older_tie, older, newer];
        keys.sort();
        assert_eq!(keys, vec![newer, older, older_tie]);
    }

    #[test]
    fn test_boundary_is_strict_on_full_precision() {
        let boundary = Boundary {
            before: at(1),
            after_id: None,
        };

        assert!(boundary.admits(&ActivityKey::new(at(0), Uuid::nil())));
        assert!(!boundary.admits(&ActivityKey::new(at(1), Uuid::nil())));
        assert!(!boundary.admits(&ActivityKey::new(at(2), Uuid::nil())));
    }

    #[test]
    fn test_boundary_tie_break_admits_later_ids_only() {
        let boundary = Boundary {
            before: at(0),
            after_id: Some(Uuid::from_u128(5)),
        };

        assert!(!boundary.admits(&ActivityKey::new(at(0), Uuid::from_u128(4))));
        assert!(!boundary.admits(&ActivityKey::new(at(0), Uuid::from_u128(5))));
        assert!(boundary.admits(&ActivityKey::new(at(0), Uuid::from_u128(6))));
        assert!(!boundary.admits(&ActivityKey::new(at(1), Uuid::from_u128(6))));
    }
}
