//! Lenient field decoders for log entries.
//!
//! A malformed entry must never halt the pipeline, so every field decodes
//! from an arbitrary JSON value and substitutes a default when the shape is
//! wrong.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::types::{EntryId, EntryType, MAX_DURATION_SECS, Targets};

pub fn epoch() -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH
}

fn value<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Value, D::Error> {
    Ok(Option::<Value>::deserialize(deserializer)?.unwrap_or(Value::Null))
}

fn scalar_to_string(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

pub fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(scalar_to_string(&value(deserializer)?))
}

pub fn lenient_entry_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<EntryId, D::Error> {
    Ok(EntryId(scalar_to_string(&value(deserializer)?)))
}

pub fn lenient_entry_type<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<EntryType, D::Error> {
    let v = value(deserializer)?;
    Ok(v.as_str()
        .and_then(|s| s.parse::<EntryType>().ok())
        .unwrap_or_default())
}

/// Seconds as a non-negative integer. Fractions truncate, anything
/// unparseable is 0, and huge values clamp to [`MAX_DURATION_SECS`].
pub fn lenient_duration<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    Ok(duration_from_value(&value(deserializer)?))
}

fn duration_from_value(v: &Value) -> u64 {
    let secs = match v {
        Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                u
            } else {
                n.as_f64().map_or(0, float_secs)
            }
        }
        Value::String(s) => s.trim().parse::<f64>().map_or(0, float_secs),
        _ => 0,
    };
    secs.min(MAX_DURATION_SECS)
}

/// `as` saturates, so `1e30` and `inf` land on `u64::MAX` before clamping.
fn float_secs(f: f64) -> u64 {
    if f > 0.0 { f.trunc() as u64 } else { 0 }
}

/// RFC 3339 string or epoch milliseconds; anything else is the epoch.
pub fn lenient_timestamp<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<DateTime<Utc>, D::Error> {
    let v = value(deserializer)?;
    let parsed = match &v {
        Value::String(s) => DateTime::parse_from_rfc3339(s.trim())
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        Value::Number(n) => n
            .as_i64()
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
        _ => None,
    };
    Ok(parsed.unwrap_or_else(epoch))
}

pub fn lenient_targets<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Targets, D::Error> {
    let v = value(deserializer)?;
    Ok(match v {
        Value::Array(items) => {
            Targets::agents(items.iter().map(scalar_to_string).filter(|s| !s.is_empty()))
        }
        _ => Targets::default(),
    })
}
