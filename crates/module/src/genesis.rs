//! Genesis configuration for the auction module.
//!
//! This module defines the initial state of the ledger when the chain
//! starts.

use auction_types::Address;
use serde::{Deserialize, Serialize};
use serde_with::{hex::Hex, serde_as};

/// Genesis configuration for the auction module.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AuctionGenesisConfig {
    /// Auctions that exist from block zero, in creation order
    #[serde(default)]
    pub auctions: Vec<GenesisAuction>,
}

/// An auction created at genesis.
#[serde_as]
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GenesisAuction {
    /// Creator address (hex)
    #[serde_as(as = "Hex")]
    pub creator: Address,
}
