//! Totally ordered application of auction calls.
//!
//! The ledger owns the module state and applies one call at a time. Every
//! submission gets a transaction id and a receipt, whether the state
//! machine accepted it or not.

use auction_types::{
    compute_tx_id, Address, AuctionAddress, AuctionLedgerState, BlockInfo, TxId,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::call::AuctionCall;
use crate::error::AuctionError;
use crate::genesis::AuctionGenesisConfig;
use crate::handlers::{self, CallContext, HandlerResult};
use crate::queries::{self, AuctionQuery, AuctionQueryResponse};
use crate::state::AuctionState as ModuleState;

/// Outcome of one submission.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    pub accepted: bool,
    pub tx_id: TxId,
    pub block_height: u64,
    pub error: Option<AuctionError>,
}

/// In-memory ledger hosting auction records.
#[derive(Debug, Default)]
pub struct Ledger {
    module: ModuleState,
    block_height: u64,
    /// Submissions applied so far, across all blocks
    sequence: u64,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a ledger from a genesis configuration.
    pub fn from_genesis(config: &AuctionGenesisConfig) -> Self {
        let mut ledger = Self::new();
        for auction in &config.auctions {
            ledger.create_auction(auction.creator);
        }
        ledger
    }

    pub fn module(&self) -> &ModuleState {
        &self.module
    }

    pub fn block_info(&self) -> BlockInfo {
        BlockInfo {
            height: self.block_height,
        }
    }

    pub fn advance_block(&mut self) -> BlockInfo {
        self.block_height = self.block_height.saturating_add(1);
        self.block_info()
    }

    fn context(&self, sender: Address) -> CallContext {
        CallContext {
            sender,
            block_height: self.block_height,
        }
    }

    /// Create a new auction record owned by `creator`.
    pub fn create_auction(&mut self, creator: Address) -> AuctionAddress {
        let ctx = self.context(creator);
        let address = handlers::handle_create_auction(&mut self.module, &ctx);
        info!(%address, "Auction created");
        address
    }

    /// Apply one call and return its receipt.
    pub fn submit(
        &mut self,
        auction: &AuctionAddress,
        sender: Address,
        call: &AuctionCall,
    ) -> SubmissionReceipt {
        let ctx = self.context(sender);
        // Serializing into a Vec cannot fail.
        let call_bytes = borsh::to_vec(&(auction, call)).unwrap_or_default();
        let tx_id = compute_tx_id(self.block_height, self.sequence, &call_bytes);
        self.sequence += 1;

        let operation = call.operation();
        let commitment = call.commitment().map(tracing::field::display);
        match handlers::dispatch(&mut self.module, &ctx, auction, call) {
            Ok(()) => {
                info!(%operation, %auction, commitment, tx = %tx_id, "Call accepted");
                SubmissionReceipt {
                    accepted: true,
                    tx_id,
                    block_height: self.block_height,
                    error: None,
                }
            }
            Err(error) => {
                warn!(%operation, %auction, commitment, tx = %tx_id, %error, "Call rejected");
                SubmissionReceipt {
                    accepted: false,
                    tx_id,
                    block_height: self.block_height,
                    error: Some(error),
                }
            }
        }
    }

    /// Answer a read-only query against the current state.
    pub fn query(&self, query: AuctionQuery) -> HandlerResult<AuctionQueryResponse> {
        queries::handle_query(&self.module, query)
    }

    /// Public record of an auction.
    pub fn query_state(&self, auction: &AuctionAddress) -> Option<AuctionLedgerState> {
        queries::get_state(&self.module, auction)
    }

    /// Addresses of all auctions.
    pub fn list_auctions(&self) -> Vec<AuctionAddress> {
        queries::list_auctions(&self.module)
    }
}
