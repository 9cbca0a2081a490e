//! RPC parameter types for the mock chain.
//!
//! Auction records, receipts and block info travel as their core types;
//! these wrap the request side.

use serde::{Deserialize, Serialize};

use auction_module::AuctionCall;
use auction_types::AuctionAddress;

/// Parameters for creating an auction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAuctionParams {
    /// Hex-encoded creator account
    pub creator: String,
}

/// Parameters for submitting a call to the ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitCallParams {
    /// Hex-encoded sender account
    pub sender: String,
    pub auction: AuctionAddress,
    pub call: AuctionCall,
}
