//! Lenient column decoders. Scraper CSVs hand us everything as strings, NDJSON exports
//! hand us numbers; raw and annotation records accept both.

use crate::timestamp::{timestamp_from_value, Timestamp};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Text column: strings pass through, numbers/bools are stringified, null stays `None`.
pub fn opt_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    let v = Option::<Value>::deserialize(d)?;
    Ok(v.and_then(|v| match v {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }))
}

/// Integer column: accepts ints, floats (truncated) and numeric strings. Empty/garbage → `None`.
pub fn opt_i64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
    let v = Option::<Value>::deserialize(d)?;
    Ok(v.as_ref().and_then(i64_from_value))
}

pub fn i64_from_value(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f as i64))
        }
        Value::Bool(b) => Some(*b as i64),
        _ => None,
    }
}

/// Timestamp column. Null and blank stay `None`; a present value that does not parse is logged
/// and treated as missing, which ranks it below every dated scrape.
pub fn opt_timestamp<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Timestamp>, D::Error> {
    let v = match Option::<Value>::deserialize(d)? {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => return Ok(None),
        Some(v) => v,
    };
    let ts = timestamp_from_value(&v);
    if ts.is_none() {
        tracing::warn!("unparseable timestamp {}; treating as missing", v);
    }
    Ok(ts)
}

/// List column. Accepts a JSON array, a JSON-encoded array string (`"[\"a\",\"b\"]"`),
/// or a Python list literal (`"['a', 'b']"`) as written by the annotator's CSV export.
/// Null and empty strings become an empty list.
pub fn string_list<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
    let v = Option::<Value>::deserialize(d)?;
    Ok(v.map(|v| list_from_value(&v)).unwrap_or_default())
}

pub fn list_from_value(v: &Value) -> Vec<String> {
    match v {
        Value::Array(items) => items
            .iter()
            .filter_map(|x| match x {
                Value::String(s) => Some(s.clone()),
                Value::Null => None,
                other => Some(other.to_string()),
            })
            .collect(),
        Value::String(s) => parse_list_literal(s),
        _ => Vec::new(),
    }
}

fn parse_list_literal(s: &str) -> Vec<String> {
    let t = s.trim();
    if t.is_empty() {
        return Vec::new();
    }
    if let Ok(Value::Array(items)) = serde_json::from_str::<Value>(t) {
        return list_from_value(&Value::Array(items));
    }
    let inner = match t.strip_prefix('[').and_then(|r| r.strip_suffix(']')) {
        Some(inner) => inner,
        // A bare scalar is a one-element list.
        None => return vec![t.to_string()],
    };
    inner
        .split(',')
        .map(|p| p.trim().trim_matches(|c| c == '\'' || c == '"').trim().to_string())
        .filter(|p| !p.is_empty())
        .collect()
}
