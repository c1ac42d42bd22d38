use serde::{Deserialize, Serialize};

/// Data stored in the cache
///
/// Every value kept in a [`CacheStore`](super::CacheStore) is a JSON document
/// wrapped in this envelope. Typed records convert to and from it with
/// `From`/`TryFrom` implementations next to their definitions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CacheData {
    pub value: String,
}

impl CacheData {
    pub(crate) fn from_json<T: Serialize>(value: &T) -> Result<Self, super::StorageError> {
        Ok(Self {
            value: serde_json::to_string(value)?,
        })
    }

    pub(crate) fn to_json<T: for<'de> Deserialize<'de>>(&self) -> Result<T, super::StorageError> {
        Ok(serde_json::from_str(&self.value)?)
    }
}
