use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// An indicator value submitted for lookup. Identity is the (type, value)
/// pair; entities are immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Entity {
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    pub value: String,
}

impl Entity {
    pub fn new(entity_type: EntityType, value: impl Into<String>) -> Self {
        Self {
            entity_type,
            value: value.into(),
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum EntityType {
    Ipv4,
    Ipv6,
    Domain,
    Url,
    Hash,
    Email,
    Cve,
}
