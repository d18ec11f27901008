use serde::{Deserialize, Deserializer, Serialize};

use super::mo::ManagedObject;

/// Helper to deserialize string or number as u64
///
/// APIC reports counters such as `totalCount` as strings.
pub fn string_or_u64<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::{self, Visitor};

    struct StringOrInt;

    impl<'de> Visitor<'de> for StringOrInt {
        type Value = u64;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            formatter.write_str("string or integer")
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
            Ok(v)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
            u64::try_from(v).map_err(de::Error::custom)
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            v.parse().map_err(de::Error::custom)
        }
    }

    deserializer.deserialize_any(StringOrInt)
}

/// Standard APIC response wrapper
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImData {
    #[serde(default, deserialize_with = "string_or_u64")]
    pub total_count: u64,
    #[serde(default)]
    pub imdata: Vec<ManagedObject>,
}

impl ImData {
    /// The `error` object of a failed request, if the body carries one
    pub fn error(&self) -> Option<ApicErrorInfo> {
        self.imdata
            .iter()
            .find(|mo| mo.class == "error")
            .map(|mo| ApicErrorInfo {
                code: mo.attribute("code").unwrap_or_default().to_string(),
                text: mo.attribute("text").unwrap_or_default().to_string(),
            })
    }
}

/// Code and text of an APIC error object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApicErrorInfo {
    pub code: String,
    pub text: String,
}
