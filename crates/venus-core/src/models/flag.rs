//! Lenient decoding for on/off fields
//!
//! Firmware revisions report flags either as JSON booleans or as 0/1 integers.

use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum RawFlag {
    Bool(bool),
    Int(i64),
}

pub(crate) fn deserialize<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawFlag>::deserialize(deserializer)?;
    Ok(raw.map(|flag| match flag {
        RawFlag::Bool(b) => b,
        RawFlag::Int(i) => i != 0,
    }))
}
