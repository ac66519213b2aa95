use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Reads an explicit `null` as the zero value of the field.
fn null_as_default<'de, D, V>(deserializer: D) -> Result<V, D::Error>
where
    D: Deserializer<'de>,
    V: Deserialize<'de> + Default,
{
    Option::<V>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Nested metadata block of a [`Record`].
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Metadata {
    #[serde(deserialize_with = "null_as_default")]
    pub created: String,
    #[serde(deserialize_with = "null_as_default")]
    pub priority: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub active: bool,
}

/// The unit decoded from every element of the input array.
///
/// Only the structural shape is checked: unknown fields are ignored and
/// missing or `null` fields fall back to their zero value.
///
/// ```
/// use stream_batch_rs::item::record::Record;
///
/// let record: Record = serde_json::from_str(r#"{"id": 7, "name": "seven", "extra": null}"#).unwrap();
/// assert_eq!(record.id, 7);
/// assert_eq!(record.name, "seven");
/// assert!(record.tags.is_empty());
/// assert!(!record.metadata.active);
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Record {
    #[serde(deserialize_with = "null_as_default")]
    pub id: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub value: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub metadata: Metadata,
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "id:{}, name:{}, value:{}, tags:[{}], priority:{}",
            self.id,
            self.name,
            self.value,
            self.tags.join(","),
            self.metadata.priority
        )
    }
}
