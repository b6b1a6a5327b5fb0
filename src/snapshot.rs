//! Snapshot data model: content fingerprints, the path → fingerprint
//! mapping captured by one scan, and the timestamp a snapshot is stored under.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{Duration, Local, NaiveDateTime, Timelike};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Format of snapshot keys in the store file.
pub const KEY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// SHA-256 digest of a file's contents.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    pub fn from_digest(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase hex, 64 characters.
    pub fn to_hex(&self) -> String {
        use std::fmt::Write;
        self.0.iter().fold(String::with_capacity(64), |mut acc, b| {
            let _ = write!(acc, "{b:02x}");
            acc
        })
    }

    /// Parse a 64-character hex digest. Returns None for anything else.
    pub fn from_hex(s: &str) -> Option<Self> {
        if s.len() != 64 || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }

        let mut bytes = [0u8; 32];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&s[i * 2..i * 2 + 2], 16).ok()?;
        }
        Some(Self(bytes))
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex = self.to_hex();
        write!(f, "Fingerprint({})", &hex[..16])
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for Fingerprint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Fingerprint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Fingerprint::from_hex(&s)
            .ok_or_else(|| D::Error::custom(format!("invalid sha-256 digest: {s:?}")))
    }
}

/// Integrity state of a directory tree at one point in time.
///
/// Keys are normalized paths (see [`crate::scan::normalize_path`]). A snapshot
/// is built once by the scanner and never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot {
    files: BTreeMap<String, Fingerprint>,
}

impl Snapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn get(&self, path: &str) -> Option<&Fingerprint> {
        self.files.get(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    /// Entries in path order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Fingerprint)> {
        self.files.iter().map(|(path, fp)| (path.as_str(), fp))
    }
}

impl FromIterator<(String, Fingerprint)> for Snapshot {
    fn from_iter<I: IntoIterator<Item = (String, Fingerprint)>>(iter: I) -> Self {
        Self {
            files: iter.into_iter().collect(),
        }
    }
}

/// Second-resolution local timestamp a snapshot is stored under.
///
/// Ordering is by time, not by the rendered string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SnapshotTime(NaiveDateTime);

impl SnapshotTime {
    pub fn now() -> Self {
        Self::from_datetime(Local::now().naive_local())
    }

    /// Truncates to whole seconds.
    pub fn from_datetime(datetime: NaiveDateTime) -> Self {
        Self(datetime.with_nanosecond(0).unwrap_or(datetime))
    }

    pub fn parse(s: &str) -> Result<Self, chrono::ParseError> {
        NaiveDateTime::parse_from_str(s, KEY_FORMAT).map(Self)
    }

    pub fn datetime(&self) -> NaiveDateTime {
        self.0
    }

    pub fn next_second(&self) -> Self {
        Self(self.0 + Duration::seconds(1))
    }
}

impl fmt::Display for SnapshotTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(KEY_FORMAT))
    }
}

impl Serialize for SnapshotTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for SnapshotTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        SnapshotTime::parse(&s)
            .map_err(|e| D::Error::custom(format!("invalid snapshot timestamp {s:?}: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32) -> SnapshotTime {
        let dt = NaiveDate::from_ymd_opt(2024, 3, 9)
            .and_then(|d| d.and_hms_opt(h, m, s))
            .unwrap();
        SnapshotTime::from_datetime(dt)
    }

    #[test]
    fn fingerprint_hex_is_lowercase_and_parses_back() {
        let fp = Fingerprint::from_digest([0xab; 32]);
        let hex = fp.to_hex();
        assert_eq!(hex.len(), 64);
        assert!(hex.starts_with("abab"));
        assert_eq!(Fingerprint::from_hex(&hex), Some(fp));
        assert_eq!(Fingerprint::from_hex(&hex.to_uppercase()), Some(fp));
    }

    #[test]
    fn fingerprint_rejects_malformed_hex() {
        assert!(Fingerprint::from_hex("abc").is_none());
        assert!(Fingerprint::from_hex(&"g".repeat(64)).is_none());
        assert!(Fingerprint::from_hex(&format!("+{}", "a".repeat(63))).is_none());
    }

    #[test]
    fn snapshot_time_orders_by_time() {
        // "9:..." would sort after "10:..." as a plain string without padding
        assert!(at(9, 59, 59) < at(10, 0, 0));
        assert_eq!(at(9, 0, 0).to_string(), "2024-03-09 09:00:00");
    }

    #[test]
    fn snapshot_time_truncates_subseconds() {
        let dt = NaiveDate::from_ymd_opt(2024, 1, 1)
            .and_then(|d| d.and_hms_milli_opt(12, 0, 0, 750))
            .unwrap();
        assert_eq!(SnapshotTime::from_datetime(dt), SnapshotTime::parse("2024-01-01 12:00:00").unwrap());
    }

    #[test]
    fn next_second_rolls_over_minute() {
        assert_eq!(at(9, 59, 59).next_second(), at(10, 0, 0));
    }

    #[test]
    fn snapshot_serializes_as_plain_map() {
        let snapshot: Snapshot = [("a.txt".to_string(), Fingerprint::from_digest([0; 32]))]
            .into_iter()
            .collect();
        let json = serde_json::to_string(&snapshot).unwrap();
        assert_eq!(json, format!("{{\"a.txt\":\"{}\"}}", "0".repeat(64)));

        let back: Snapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snapshot);
    }
}
