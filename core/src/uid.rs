//! Per-request identifiers: a fresh BSON ObjectId rendered as 24 hex
//! characters, so Mongo-backed actors can reuse it as a key.

use std::fmt;

use mongodb::bson::oid::ObjectId;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Uid(String);

impl Uid {
    pub fn generate() -> Self {
        Uid(ObjectId::new().to_hex())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Uid {
    fn from(value: &str) -> Self {
        Uid(value.to_string())
    }
}

impl From<String> for Uid {
    fn from(value: String) -> Self {
        Uid(value)
    }
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_uid_format() {
        let uid = Uid::generate();
        assert_eq!(uid.as_str().len(), 24);
        assert!(uid.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_uids_are_unique() {
        let uids: HashSet<Uid> = (0..10_000).map(|_| Uid::generate()).collect();
        assert_eq!(uids.len(), 10_000);
    }

    #[test]
    fn test_uid_is_an_object_id() {
        let uid = Uid::generate();
        let oid = ObjectId::parse_str(uid.as_str()).unwrap();
        assert_eq!(oid.to_hex(), uid.as_str());
    }
}
