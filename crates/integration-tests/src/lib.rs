//! End-to-end integration tests for sealed-bid auctions.
//!
//! These tests exercise the full auction lifecycle:
//! 1. Auction creation
//! 2. Sealed bids from bidders with their own vaults
//! 3. Closing the bidding phase
//! 4. Reveals checked against recorded commitments
//! 5. Highest bid, bid count and reveal status queries
//!
//! `LocalChain` hosts the ledger in process so the controller runs against
//! the real state machine without an RPC server.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use auction_client::{ChainQuery, GatewayError, LedgerGateway, SubmissionReceipt};
use auction_module::{AuctionCall, AuctionQuery, AuctionQueryResponse, HandlerResult, Ledger};
use auction_types::{Address, AuctionAddress, AuctionLedgerState};

/// In-process ledger shared by every bidder of a test.
#[derive(Clone, Default)]
pub struct LocalChain {
    ledger: Arc<Mutex<Ledger>>,
}

impl LocalChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_auction(&self, creator: Address) -> AuctionAddress {
        self.ledger.lock().create_auction(creator)
    }

    /// Gateway and query handle submitting as `sender`.
    pub fn account(&self, sender: Address) -> LocalAccount {
        LocalAccount {
            ledger: self.ledger.clone(),
            sender,
        }
    }

    /// Submit directly, bypassing any controller.
    pub fn submit(
        &self,
        auction: &AuctionAddress,
        sender: Address,
        call: &AuctionCall,
    ) -> SubmissionReceipt {
        self.ledger.lock().submit(auction, sender, call)
    }

    pub fn state(&self, auction: &AuctionAddress) -> Option<AuctionLedgerState> {
        self.ledger.lock().query_state(auction)
    }

    pub fn advance_block(&self) {
        self.ledger.lock().advance_block();
    }
}

/// One account's view of a `LocalChain`.
#[derive(Clone)]
pub struct LocalAccount {
    ledger: Arc<Mutex<Ledger>>,
    sender: Address,
}

#[async_trait]
impl LedgerGateway for LocalAccount {
    async fn submit(
        &self,
        auction: &AuctionAddress,
        call: AuctionCall,
    ) -> Result<SubmissionReceipt, GatewayError> {
        Ok(self.ledger.lock().submit(auction, self.sender, &call))
    }
}

#[async_trait]
impl ChainQuery for LocalAccount {
    async fn query(
        &self,
        query: AuctionQuery,
    ) -> Result<HandlerResult<AuctionQueryResponse>, GatewayError> {
        Ok(self.ledger.lock().query(query))
    }
}
