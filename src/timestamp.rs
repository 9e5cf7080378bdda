use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime};

/// Scrape instant, always held in UTC. Ordering is chronological.
///
/// Accepted encodings: RFC 3339, `YYYY-MM-DD HH:MM:SS[.fff][+HH:MM]` (space or `T`; without an
/// offset it is read as UTC), and epoch seconds (integer or fractional, as number or string).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(OffsetDateTime);

impl Timestamp {
    pub fn from_unix(secs: i64) -> Option<Self> {
        OffsetDateTime::from_unix_timestamp(secs).ok().map(Self)
    }

    pub fn from_unix_f64(secs: f64) -> Option<Self> {
        if !secs.is_finite() {
            return None;
        }
        let nanos = (secs * 1e9).round() as i128;
        OffsetDateTime::from_unix_timestamp_nanos(nanos).ok().map(Self)
    }

}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.format(&Rfc3339) {
            Ok(s) => f.write_str(&s),
            Err(_) => write!(f, "{}", self.0.unix_timestamp()),
        }
    }
}

impl FromStr for Timestamp {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err("empty timestamp".into());
        }
        if let Ok(dt) = OffsetDateTime::parse(s, &Rfc3339) {
            return Ok(Self(dt.to_offset(time::UtcOffset::UTC)));
        }

        // pandas writes tz-aware values with a space separator: `2024-05-03 12:00:00.123456+00:00`.
        let with_offset = [
            format_description!(
                "[year]-[month]-[day] [hour]:[minute]:[second][optional [.[subsecond]]][offset_hour sign:mandatory]:[offset_minute]"
            ),
            format_description!(
                "[year]-[month]-[day]T[hour]:[minute]:[second][optional [.[subsecond]]][offset_hour sign:mandatory]:[offset_minute]"
            ),
        ];
        for fmt in with_offset.iter() {
            if let Ok(dt) = OffsetDateTime::parse(s, fmt) {
                return Ok(Self(dt.to_offset(time::UtcOffset::UTC)));
            }
        }

        let naive = [
            format_description!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond]"),
            format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
            format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]"),
            format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
        ];
        for fmt in naive.iter() {
            if let Ok(p) = PrimitiveDateTime::parse(s, fmt) {
                return Ok(Self(p.assume_utc()));
            }
        }

        if let Ok(n) = s.parse::<i64>() {
            return Self::from_unix(n).ok_or_else(|| format!("epoch out of range: {s}"));
        }
        if let Ok(f) = s.parse::<f64>() {
            return Self::from_unix_f64(f).ok_or_else(|| format!("epoch out of range: {s}"));
        }
        Err(format!("unrecognized timestamp: {s}"))
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let v = Value::deserialize(deserializer)?;
        timestamp_from_value(&v)
            .ok_or_else(|| de::Error::custom(format!("invalid timestamp: {v}")))
    }
}

/// Lenient conversion used by the raw-record deserializers. `None` for null/unparseable.
pub fn timestamp_from_value(v: &Value) -> Option<Timestamp> {
    match v {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Timestamp::from_unix(i)
            } else {
                n.as_f64().and_then(Timestamp::from_unix_f64)
            }
        }
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}
