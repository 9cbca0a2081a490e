//! Client SDK for bidding in sealed-bid auctions.
//!
//! This crate provides a high-level API for:
//! - Sealing bids under fresh blindings
//! - Keeping bid secrets in a durable local vault
//! - Submitting bid, close and reveal calls to the ledger
//! - Querying auction state

pub mod bid;
pub mod config;
pub mod controller;
pub mod gateway;
pub mod query;
pub mod rpc;
pub mod vault;

pub use bid::{prepare_bid, reveal_call, PreparedBid};
pub use controller::{Attempt, AuctionController, ControllerError, PlacedBid, RevealedBid};
pub use gateway::{GatewayError, LedgerGateway, SubmissionReceipt};
pub use query::ChainQuery;
pub use rpc::RpcLedgerClient;
pub use vault::{SecretVault, VaultEntry, VaultError};
