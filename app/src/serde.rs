use std::fmt::Display;

use serde::Deserialize;

/// Query-string numbers arrive quoted; JSON bodies send them bare. Pagination
/// params accept both through this deserializer.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum MaybeQuoted<T> {
    Quoted(String),
    Bare(T),
}

pub fn deserialize_number<'de, T, D>(deserializer: D) -> Result<T, D::Error>
where
    T: std::str::FromStr + Deserialize<'de>,
    D: serde::Deserializer<'de>,
    T::Err: Display,
{
    match MaybeQuoted::<T>::deserialize(deserializer)? {
        MaybeQuoted::Quoted(raw) => raw
            .parse::<T>()
            .map_err(|e| serde::de::Error::custom(format!("invalid numeric string: {e}"))),
        MaybeQuoted::Bare(n) => Ok(n),
    }
}
