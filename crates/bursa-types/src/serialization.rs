//! Serialization implementations for bursa-types
//!
//! Identifiers serialize as their display strings, so the wire form of
//! an account id is the same Bech32m text a user sees.

use crate::*;

mod serde_impls {
    use super::*;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::str::FromStr;

    impl Serialize for AccountId {
        fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            self.to_string().serialize(serializer)
        }
    }

    impl<'de> Deserialize<'de> for AccountId {
        fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
        where
            D: Deserializer<'de>,
        {
            let s = String::deserialize(deserializer)?;
            AccountId::from_str(&s).map_err(serde::de::Error::custom)
        }
    }
}
