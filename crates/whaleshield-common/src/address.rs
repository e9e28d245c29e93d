//! Base-layer account address

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::Error;

/// Length of an address in bytes
pub const ADDRESS_LEN: usize = 32;

/// Ed25519 public key identifying a base-layer account, displayed in base58
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address([u8; ADDRESS_LEN]);

impl Address {
    /// Create from raw bytes
    pub const fn new(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }

    /// Raw bytes
    pub fn to_bytes(&self) -> [u8; ADDRESS_LEN] {
        self.0
    }

    /// Borrow raw bytes
    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }

    /// Parse from a byte slice
    pub fn from_slice(bytes: &[u8]) -> Result<Self, Error> {
        let bytes: [u8; ADDRESS_LEN] = bytes
            .try_into()
            .map_err(|_| Error::InvalidAddress(format!("expected 32 bytes, got {}", bytes.len())))?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&bs58::encode(self.0).into_string())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({self})")
    }
}

impl FromStr for Address {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = bs58::decode(s)
            .into_vec()
            .map_err(|e| Error::InvalidAddress(format!("{s}: {e}")))?;
        Self::from_slice(&bytes)
    }
}

impl From<ed25519_dalek::VerifyingKey> for Address {
    fn from(key: ed25519_dalek::VerifyingKey) -> Self {
        Self(key.to_bytes())
    }
}

impl TryFrom<Address> for ed25519_dalek::VerifyingKey {
    type Error = Error;

    fn try_from(address: Address) -> Result<Self, Self::Error> {
        ed25519_dalek::VerifyingKey::from_bytes(&address.0)
            .map_err(|e| Error::InvalidAddress(e.to_string()))
    }
}

impl Serialize for Address {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Address::from_str(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_base58() {
        // System program is all zero bytes
        let system = Address::new([0u8; 32]);
        assert_eq!(system.to_string(), "11111111111111111111111111111111");
        assert_eq!(
            Address::from_str("11111111111111111111111111111111").unwrap(),
            system
        );
    }

    #[test]
    fn test_address_rejects_wrong_length() {
        assert!(matches!(
            Address::from_str("3yZe7d"),
            Err(Error::InvalidAddress(_))
        ));
        assert!(Address::from_str("not-base58-0OIl").is_err());
    }
}
