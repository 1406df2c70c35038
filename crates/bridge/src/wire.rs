//! Lenient decoding for integers that platforms send as strings.
//!
//! The commerce platform sends `default_shipping` as `"12"` and the profile
//! platform sends `profile_id` and `total_items` the same way, while other
//! endpoints use real numbers. These helpers accept both.

use std::collections::HashMap;
use std::hash::Hash;

use serde::Deserialize;
use serde::de::{self, DeserializeOwned, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum IntOrString {
    Int(i64),
    Str(String),
}

/// Decode an optional integer id given as a number, a numeric string, `""` or `null`.
pub(crate) fn optional_id<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: From<i32>,
{
    let Some(value) = Option::<IntOrString>::deserialize(deserializer)? else {
        return Ok(None);
    };

    let number = match value {
        IntOrString::Int(n) => i32::try_from(n).map_err(de::Error::custom)?,
        IntOrString::Str(s) if s.trim().is_empty() => return Ok(None),
        IntOrString::Str(s) => s.trim().parse::<i32>().map_err(de::Error::custom)?,
    };

    Ok(Some(T::from(number)))
}

/// Decode a text id given as a string or a bare number.
pub(crate) fn text_id<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: From<String>,
{
    let text = match IntOrString::deserialize(deserializer)? {
        IntOrString::Int(n) => n.to_string(),
        IntOrString::Str(s) => s,
    };
    Ok(T::from(text))
}

/// Optional variant of [`text_id`]; `""` counts as missing.
pub(crate) fn optional_text_id<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: From<String>,
{
    let text = match Option::<IntOrString>::deserialize(deserializer)? {
        Some(IntOrString::Int(n)) => Some(n.to_string()),
        Some(IntOrString::Str(s)) if !s.trim().is_empty() => Some(s),
        _ => None,
    };
    Ok(text.map(T::from))
}

/// Decode a JSON object keyed by integer ids, treating a JSON array as an empty map.
///
/// PHP backends encode an empty associative array as `[]`.
pub(crate) fn map_or_empty_list<'de, D, K, V>(deserializer: D) -> Result<HashMap<K, V>, D::Error>
where
    D: Deserializer<'de>,
    K: From<i32> + Eq + Hash,
    V: DeserializeOwned,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Object(entries) => entries
            .into_iter()
            .map(|(key, value)| {
                let key = key.trim().parse::<i32>().map_err(de::Error::custom)?;
                let value = serde_json::from_value(value).map_err(de::Error::custom)?;
                Ok((K::from(key), value))
            })
            .collect(),
        serde_json::Value::Array(_) | serde_json::Value::Null => Ok(HashMap::new()),
        other => Err(de::Error::custom(format!(
            "expected an object keyed by id, got {other}"
        ))),
    }
}

/// Decode a count given as a number or a numeric string; anything unparsable is `None`.
pub(crate) fn lenient_count<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let count = match Option::<IntOrString>::deserialize(deserializer)? {
        Some(IntOrString::Int(n)) => u64::try_from(n).ok(),
        Some(IntOrString::Str(s)) => s.trim().parse::<u64>().ok(),
        None => None,
    };
    Ok(count)
}
