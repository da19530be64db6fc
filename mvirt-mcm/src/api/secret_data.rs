//! Serde adapter rendering secret data values as base64 strings.
//!
//! `{"data": {"userData": "I2Nsb3VkLWNvbmZpZw=="}}` instead of byte arrays.

use std::collections::BTreeMap;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serializer};

pub fn serialize<S>(data: &BTreeMap<String, Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_map(data.iter().map(|(key, value)| (key, STANDARD.encode(value))))
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<BTreeMap<String, Vec<u8>>, D::Error>
where
    D: Deserializer<'de>,
{
    BTreeMap::<String, String>::deserialize(deserializer)?
        .into_iter()
        .map(|(key, value)| {
            let bytes = STANDARD
                .decode(value.trim())
                .map_err(|e| D::Error::custom(format!("data.{}: {}", key, e)))?;
            Ok((key, bytes))
        })
        .collect()
}
