//! Asset identifiers

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::error::Error;

/// Mint address of wrapped SOL, the network's native asset
pub const NATIVE_MINT: &str = "So11111111111111111111111111111111111111112";

/// USDC mint address
pub const USDC_MINT: &str = "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v";

/// Identifier of a swappable asset (its mint address)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(String);

impl AssetId {
    /// The network's native asset
    pub fn native() -> Self {
        Self(NATIVE_MINT.to_string())
    }

    /// USDC
    pub fn usdc() -> Self {
        Self(USDC_MINT.to_string())
    }

    /// Mint address as string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when this is the native asset
    pub fn is_native(&self) -> bool {
        self.0 == NATIVE_MINT
    }
}

impl FromStr for AssetId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.to_ascii_uppercase().as_str() {
            "SOL" => return Ok(Self::native()),
            "USDC" => return Ok(Self::usdc()),
            _ => (),
        }

        // Validates that the mint is a well formed address
        Address::from_str(s).map_err(|_| Error::InvalidAsset(s.to_string()))?;
        Ok(Self(s.to_string()))
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_symbols() {
        assert!(AssetId::from_str("sol").unwrap().is_native());
        assert_eq!(AssetId::from_str("USDC").unwrap(), AssetId::usdc());
        assert!(!AssetId::usdc().is_native());
    }

    #[test]
    fn test_asset_from_mint() {
        let asset = AssetId::from_str(NATIVE_MINT).unwrap();
        assert!(asset.is_native());
        assert!(matches!(
            AssetId::from_str("bogus"),
            Err(Error::InvalidAsset(_))
        ));
    }
}
