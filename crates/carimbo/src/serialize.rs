#![forbid(unsafe_code)]

//! Serde adapter for [`Identity`].
//!
//! An identity serializes as nothing but its re-encoded PKCS#12 container
//! bytes; there is no field-by-field representation. Deserialization runs
//! the bytes back through [`Identity::load`], so the loader's validation
//! is the only path to a live identity.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::identity::{Identity, INTERNAL_PASSWORD};

impl Serialize for Identity {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_bytes(self.container_bytes())
    }
}

impl<'de> Deserialize<'de> for Identity {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_bytes(ContainerVisitor)
    }
}

struct ContainerVisitor;

impl<'de> Visitor<'de> for ContainerVisitor {
    type Value = Identity;

    fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("PKCS#12 container bytes")
    }

    fn visit_bytes<E>(self, v: &[u8]) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Identity::load(v, Some(INTERNAL_PASSWORD)).map_err(de::Error::custom)
    }

    fn visit_byte_buf<E>(self, v: Vec<u8>) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        self.visit_bytes(&v)
    }

    // Formats without a native bytes type (JSON) deliver a sequence
    fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
    where
        A: de::SeqAccess<'de>,
    {
        let mut bytes = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(b) = seq.next_element::<u8>()? {
            bytes.push(b);
        }
        self.visit_bytes(&bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tampered_container_bytes_fail_deserialization() {
        let json = serde_json::to_string(&[1u8, 2, 3, 4]).unwrap();
        assert!(serde_json::from_str::<Identity>(&json).is_err());
    }
}
