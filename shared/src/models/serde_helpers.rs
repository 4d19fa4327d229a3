//! Common serde helpers for handling null values from the job source

use serde::{Deserialize, Deserializer};

/// Deserialize any defaultable value, treating null as the default
pub fn null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Text(String),
    Millis(i64),
}

/// Deserialize a timestamp sent either as a string or as epoch milliseconds
///
/// Numbers are kept as their decimal text; null becomes an empty string.
pub fn timestamp_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<RawTimestamp>::deserialize(deserializer)? {
        Some(RawTimestamp::Text(s)) => s,
        Some(RawTimestamp::Millis(ms)) => ms.to_string(),
        None => String::new(),
    })
}
