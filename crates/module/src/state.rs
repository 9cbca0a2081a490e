//! On-chain state structures for the auction module.

use auction_types::{
    compute_auction_address, Address, AuctionAddress, AuctionLedgerState, BidEntry, Commitment,
    Phase,
};
use std::collections::HashMap;

/// One auction's ledger record.
///
/// Created once at genesis and never deleted. Fields are only mutated by
/// the handlers in [`crate::handlers`].
#[derive(Debug, Clone)]
pub struct AuctionRecord {
    pub address: AuctionAddress,
    pub creator: Address,
    pub created_at: u64,
    pub phase: Phase,
    pub bid_count: u64,
    pub highest_bid: u64,
    pub leading_commitment: Option<Commitment>,

    /// Accepted commitments in bid order
    pub bids: Vec<BidEntry>,

    /// commitment -> position in `bids`
    index: HashMap<Commitment, usize>,
}

impl AuctionRecord {
    /// Fresh record: open, no bids, highest bid zero.
    pub fn genesis(address: AuctionAddress, creator: Address, created_at: u64) -> Self {
        Self {
            address,
            creator,
            created_at,
            phase: Phase::Open,
            bid_count: 0,
            highest_bid: 0,
            leading_commitment: None,
            bids: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn contains(&self, commitment: &Commitment) -> bool {
        self.index.contains_key(commitment)
    }

    pub fn get_bid(&self, commitment: &Commitment) -> Option<&BidEntry> {
        self.index.get(commitment).and_then(|&i| self.bids.get(i))
    }

    pub(crate) fn get_bid_mut(&mut self, commitment: &Commitment) -> Option<&mut BidEntry> {
        let i = *self.index.get(commitment)?;
        self.bids.get_mut(i)
    }

    pub(crate) fn push_bid(&mut self, commitment: Commitment) {
        self.index.insert(commitment, self.bids.len());
        self.bids.push(BidEntry {
            commitment,
            revealed_amount: None,
        });
    }

    /// Public view of the record.
    pub fn snapshot(&self) -> AuctionLedgerState {
        AuctionLedgerState {
            address: self.address,
            creator: self.creator,
            phase: self.phase,
            bid_count: self.bid_count,
            highest_bid: self.highest_bid,
            leading_commitment: self.leading_commitment,
            bids: self.bids.clone(),
        }
    }
}

/// Auction module state.
///
/// In a real ledger these would be persistent storage maps.
/// This is a simplified in-memory representation for development.
#[derive(Debug, Default)]
pub struct AuctionState {
    /// Nonce mixed into the next auction address
    pub next_nonce: u64,

    /// All auctions by address
    pub auctions: HashMap<AuctionAddress, AuctionRecord>,
}

impl AuctionState {
    /// Create a new auction state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the next auction address for `creator` and advance the nonce.
    pub fn allocate_address(&mut self, creator: &Address) -> AuctionAddress {
        let address = compute_auction_address(creator, self.next_nonce);
        self.next_nonce += 1;
        address
    }

    /// Get auction by address.
    pub fn get_auction(&self, address: &AuctionAddress) -> Option<&AuctionRecord> {
        self.auctions.get(address)
    }

    /// Get mutable auction by address.
    pub fn get_auction_mut(&mut self, address: &AuctionAddress) -> Option<&mut AuctionRecord> {
        self.auctions.get_mut(address)
    }
}
