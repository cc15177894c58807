//! Time-ordered 12-byte identifiers rendered as 24 hex characters.
//!
//! Notes, labels and owners are all addressed by `ObjectId`s. The layout
//! embeds the creation second so ids sort roughly by creation time:
//!
//! ```text
//! 0       4             9        12
//! +-------+-------------+--------+
//! | secs  | process rnd | counter|
//! +-------+-------------+--------+
//!   BE u32    5 bytes     BE u24
//! ```

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use rand::Rng;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Length of the hex rendering.
pub const OBJECT_ID_HEX_LEN: usize = 24;

const COUNTER_MASK: u32 = 0x00FF_FFFF;

static PROCESS_UNIQUE: Lazy<[u8; 5]> = Lazy::new(|| rand::thread_rng().gen());

static COUNTER: Lazy<AtomicU32> =
    Lazy::new(|| AtomicU32::new(rand::thread_rng().gen::<u32>() & COUNTER_MASK));

/// A 12-byte identifier.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId([u8; 12]);

/// Error returned when a string is not a 24-character hex id.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid object id: {0:?}")]
pub struct ParseObjectIdError(pub String);

impl ObjectId {
    /// Generate a new id stamped with the current time.
    pub fn new() -> Self {
        Self::from_timestamp(&Utc::now())
    }

    /// Generate an id stamped with `ts` (second precision).
    pub fn from_timestamp(ts: &DateTime<Utc>) -> Self {
        let secs = ts.timestamp().clamp(0, u32::MAX as i64) as u32;
        let count = COUNTER.fetch_add(1, Ordering::Relaxed) & COUNTER_MASK;

        let mut bytes = [0u8; 12];
        bytes[0..4].copy_from_slice(&secs.to_be_bytes());
        bytes[4..9].copy_from_slice(&*PROCESS_UNIQUE);
        bytes[9..12].copy_from_slice(&count.to_be_bytes()[1..4]);
        Self(bytes)
    }

    /// Lowercase hex rendering.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse a 24-character hex string (either case).
    pub fn parse_str(s: &str) -> Result<Self, ParseObjectIdError> {
        if s.len() != OBJECT_ID_HEX_LEN {
            return Err(ParseObjectIdError(s.to_string()));
        }
        let mut bytes = [0u8; 12];
        hex::decode_to_slice(s, &mut bytes).map_err(|_| ParseObjectIdError(s.to_string()))?;
        Ok(Self(bytes))
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", self.to_hex())
    }
}

impl FromStr for ObjectId {
    type Err = ParseObjectIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_str(s)
    }
}

impl Serialize for ObjectId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ObjectId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse_str(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_hex_is_24_lowercase_chars() {
        let id = ObjectId::new();
        let hex = id.to_hex();
        assert_eq!(hex.len(), OBJECT_ID_HEX_LEN);
        assert!(hex.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn test_parse_accepts_uppercase_and_normalizes() {
        let id: ObjectId = "507F1F77BCF86CD799439011".parse().unwrap();
        assert_eq!(id.to_string(), "507f1f77bcf86cd799439011");
    }

    #[test]
    fn test_parse_rejects_bad_shapes() {
        assert!(ObjectId::parse_str("").is_err());
        assert!(ObjectId::parse_str("507f1f77bcf86cd79943901").is_err());
        assert!(ObjectId::parse_str("507f1f77bcf86cd7994390111").is_err());
        assert!(ObjectId::parse_str("507f1f77bcf86cd79943901z").is_err());
    }

    #[test]
    fn test_ids_are_unique_within_a_second() {
        let ts = Utc::now();
        let a = ObjectId::from_timestamp(&ts);
        let b = ObjectId::from_timestamp(&ts);
        assert_ne!(a, b);
        assert_eq!(a.to_hex()[..18], b.to_hex()[..18]);
    }

    #[test]
    fn test_later_second_sorts_after() {
        let now = Utc::now();
        let earlier = ObjectId::from_timestamp(&(now - Duration::seconds(5)));
        let later = ObjectId::from_timestamp(&now);
        assert!(later > earlier);
    }

    #[test]
    fn test_serde_as_string() {
        let id: ObjectId = "507f1f77bcf86cd799439011".parse().unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"507f1f77bcf86cd799439011\"");

        let back: ObjectId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);

        assert!(serde_json::from_str::<ObjectId>("\"nope\"").is_err());
    }
}
