//! Query handlers for the auction module.
//!
//! These functions provide read-only access to auction state.

use crate::error::AuctionError;
use crate::handlers::HandlerResult;
use crate::state::{AuctionRecord, AuctionState as ModuleState};
use auction_types::{AuctionAddress, AuctionLedgerState, Phase};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};

/// Query request types.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "query", rename_all = "snake_case")]
pub enum AuctionQuery {
    /// Full public record of an auction.
    GetState { address: AuctionAddress },

    /// Highest revealed bid.
    GetHighestBid { address: AuctionAddress },

    /// Number of accepted commitments.
    GetBidCount { address: AuctionAddress },

    /// Whether any bid has been revealed.
    IsRevealed { address: AuctionAddress },

    /// All auction addresses.
    ListAuctions,
}

/// Query response types.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum AuctionQueryResponse {
    State(Option<AuctionLedgerState>),
    HighestBid(#[serde_as(as = "DisplayFromStr")] u64),
    BidCount(u64),
    Revealed(bool),
    Auctions(Vec<AuctionAddress>),
}

fn auction<'a>(state: &'a ModuleState, address: &AuctionAddress) -> HandlerResult<&'a AuctionRecord> {
    state
        .get_auction(address)
        .ok_or(AuctionError::AuctionNotFound { address: *address })
}

/// Highest bid; only available once the auction is revealed.
pub fn get_highest_bid(state: &ModuleState, address: &AuctionAddress) -> HandlerResult<u64> {
    let record = auction(state, address)?;
    if record.phase != Phase::Revealed {
        return Err(AuctionError::NotRevealedYet);
    }
    Ok(record.highest_bid)
}

/// Bid count, valid in any phase.
pub fn get_bid_count(state: &ModuleState, address: &AuctionAddress) -> HandlerResult<u64> {
    Ok(auction(state, address)?.bid_count)
}

/// Whether the auction has reached the revealed phase.
pub fn is_revealed(state: &ModuleState, address: &AuctionAddress) -> HandlerResult<bool> {
    Ok(auction(state, address)?.phase == Phase::Revealed)
}

/// Snapshot of one auction.
pub fn get_state(state: &ModuleState, address: &AuctionAddress) -> Option<AuctionLedgerState> {
    state.get_auction(address).map(AuctionRecord::snapshot)
}

/// All auction addresses, ordered by creation height then address.
pub fn list_auctions(state: &ModuleState) -> Vec<AuctionAddress> {
    let mut records: Vec<&AuctionRecord> = state.auctions.values().collect();
    records.sort_by_key(|r| (r.created_at, r.address));
    records.into_iter().map(|r| r.address).collect()
}

/// Handle a query.
pub fn handle_query(state: &ModuleState, query: AuctionQuery) -> HandlerResult<AuctionQueryResponse> {
    Ok(match query {
        AuctionQuery::GetState { address } => AuctionQueryResponse::State(get_state(state, &address)),
        AuctionQuery::GetHighestBid { address } => {
            AuctionQueryResponse::HighestBid(get_highest_bid(state, &address)?)
        }
        AuctionQuery::GetBidCount { address } => {
            AuctionQueryResponse::BidCount(get_bid_count(state, &address)?)
        }
        AuctionQuery::IsRevealed { address } => {
            AuctionQueryResponse::Revealed(is_revealed(state, &address)?)
        }
        AuctionQuery::ListAuctions => AuctionQueryResponse::Auctions(list_auctions(state)),
    })
}
