//! Ledger module for sealed-bid commit/reveal auctions.
//!
//! This module implements the authoritative, shared auction record:
//!
//! - Commitment submission while bidding is open
//! - Closing the bidding phase
//! - Verifying reveals against recorded commitments
//! - Tracking the highest revealed bid and the bid count
//!
//! # Architecture
//!
//! - `call`: Message types for state-changing operations
//! - `handlers`: Business logic for processing calls
//! - `queries`: Read-only state access
//! - `state`: On-chain state structures
//! - `genesis`: Initial configuration
//! - `ledger`: Totally ordered application of calls with receipts
//! - `error`: Error types
//!
//! # Example
//!
//! ```ignore
//! use auction_module::{AuctionCall, Ledger};
//!
//! let mut ledger = Ledger::new();
//! let auction = ledger.create_auction(creator);
//! let receipt = ledger.submit(&auction, bidder, &AuctionCall::Bid { commitment });
//! assert!(receipt.accepted);
//! ```

pub mod call;
pub mod error;
pub mod genesis;
pub mod handlers;
pub mod ledger;
pub mod queries;
pub mod state;

pub use call::AuctionCall;
pub use error::{AuctionError, Operation};
pub use genesis::{AuctionGenesisConfig, GenesisAuction};
pub use handlers::{CallContext, HandlerResult};
pub use ledger::{Ledger, SubmissionReceipt};
pub use queries::{AuctionQuery, AuctionQueryResponse};
pub use state::{AuctionRecord, AuctionState};
