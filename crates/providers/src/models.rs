//! Shared model types for the providers crate.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Networks a token price can be resolved on.
///
/// The set is closed: each variant carries its own Alchemy network slug
/// and JSON-RPC host, so an unknown network is a validation error at the
/// edge rather than a silent default.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Ethereum,
    Polygon,
}

impl Network {
    /// Canonical lowercase name, as used in API payloads and storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Ethereum => "ethereum",
            Network::Polygon => "polygon",
        }
    }

    /// Network slug in Alchemy's format (e.g. `eth-mainnet`).
    pub fn alchemy_slug(&self) -> &'static str {
        match self {
            Network::Ethereum => "eth-mainnet",
            Network::Polygon => "polygon-mainnet",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Network {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ethereum" => Ok(Network::Ethereum),
            "polygon" => Ok(Network::Polygon),
            other => Err(format!("unsupported network: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_round_trip() {
        for network in [Network::Ethereum, Network::Polygon] {
            assert_eq!(network.as_str().parse::<Network>().unwrap(), network);
        }
    }

    #[test]
    fn test_network_parse_is_case_insensitive() {
        assert_eq!("Ethereum".parse::<Network>().unwrap(), Network::Ethereum);
        assert_eq!("POLYGON".parse::<Network>().unwrap(), Network::Polygon);
    }

    #[test]
    fn test_unknown_network_is_rejected() {
        assert!("solana".parse::<Network>().is_err());
    }

    #[test]
    fn test_alchemy_slugs() {
        assert_eq!(Network::Ethereum.alchemy_slug(), "eth-mainnet");
        assert_eq!(Network::Polygon.alchemy_slug(), "polygon-mainnet");
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&Network::Ethereum).unwrap();
        assert_eq!(json, "\"ethereum\"");
        let parsed: Network = serde_json::from_str("\"polygon\"").unwrap();
        assert_eq!(parsed, Network::Polygon);
    }
}
