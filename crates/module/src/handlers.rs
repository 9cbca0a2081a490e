//! Call handlers for the auction module.
//!
//! These functions implement the state machine for each call type. Every
//! handler validates completely before mutating, so a failed call leaves
//! the record untouched.

use crate::call::AuctionCall;
use crate::error::{AuctionError, Operation};
use crate::state::{AuctionRecord, AuctionState as ModuleState};
use auction_crypto::verify_opening;
use auction_types::{Address, AuctionAddress, Blinding, Commitment, Phase};

/// Context provided by the runtime for each call.
#[derive(Debug, Clone, Copy)]
pub struct CallContext {
    /// Sender of the transaction
    pub sender: Address,
    /// Current block height
    pub block_height: u64,
}

/// Result type for handlers.
pub type HandlerResult<T> = Result<T, AuctionError>;

fn auction_mut<'a>(
    state: &'a mut ModuleState,
    address: &AuctionAddress,
) -> HandlerResult<&'a mut AuctionRecord> {
    state
        .get_auction_mut(address)
        .ok_or(AuctionError::AuctionNotFound { address: *address })
}

fn require_phase(record: &AuctionRecord, operation: Operation, expected: Phase) -> HandlerResult<()> {
    if record.phase != expected {
        return Err(AuctionError::Phase {
            operation,
            expected,
            got: record.phase,
        });
    }
    Ok(())
}

/// Handle auction genesis.
pub fn handle_create_auction(state: &mut ModuleState, ctx: &CallContext) -> AuctionAddress {
    let address = state.allocate_address(&ctx.sender);
    state.auctions.insert(
        address,
        AuctionRecord::genesis(address, ctx.sender, ctx.block_height),
    );
    address
}

/// Handle Bid call. Returns the new bid count.
pub fn handle_bid(
    state: &mut ModuleState,
    _ctx: &CallContext,
    address: &AuctionAddress,
    commitment: Commitment,
) -> HandlerResult<u64> {
    let auction = auction_mut(state, address)?;

    require_phase(auction, Operation::Bid, Phase::Open)?;

    if auction.contains(&commitment) {
        return Err(AuctionError::DuplicateCommitment { commitment });
    }

    let bid_count = auction
        .bid_count
        .checked_add(1)
        .ok_or(AuctionError::CounterOverflow)?;

    auction.push_bid(commitment);
    auction.bid_count = bid_count;

    Ok(bid_count)
}

/// Handle CloseBidding call.
///
/// A repeated close is rejected rather than ignored so double-closing is
/// observable by the caller.
pub fn handle_close_bidding(
    state: &mut ModuleState,
    _ctx: &CallContext,
    address: &AuctionAddress,
) -> HandlerResult<()> {
    let auction = auction_mut(state, address)?;

    require_phase(auction, Operation::CloseBidding, Phase::Open)?;

    auction.phase = Phase::Closed;
    Ok(())
}

/// Handle Reveal call. Returns the highest bid after the reveal.
///
/// Checks run in order: phase, unknown commitment, already revealed,
/// commitment mismatch. The highest bid only moves on a strictly greater
/// amount, so ties stay with the earliest reveal.
pub fn handle_reveal(
    state: &mut ModuleState,
    _ctx: &CallContext,
    address: &AuctionAddress,
    commitment: Commitment,
    amount: u64,
    blinding: &Blinding,
) -> HandlerResult<u64> {
    let auction = auction_mut(state, address)?;

    if auction.phase == Phase::Open {
        return Err(AuctionError::Phase {
            operation: Operation::Reveal,
            expected: Phase::Closed,
            got: Phase::Open,
        });
    }

    let bid = auction
        .get_bid(&commitment)
        .ok_or(AuctionError::UnknownCommitment { commitment })?;

    if bid.is_revealed() {
        return Err(AuctionError::AlreadyRevealed { commitment });
    }

    verify_opening(&commitment, amount, blinding)
        .map_err(|_| AuctionError::CommitmentMismatch { commitment })?;

    if let Some(bid) = auction.get_bid_mut(&commitment) {
        bid.revealed_amount = Some(amount);
    }

    if auction.leading_commitment.is_none() || amount > auction.highest_bid {
        auction.highest_bid = amount;
        auction.leading_commitment = Some(commitment);
    }

    auction.phase = Phase::Revealed;

    Ok(auction.highest_bid)
}

/// Route a call to its handler.
pub fn dispatch(
    state: &mut ModuleState,
    ctx: &CallContext,
    address: &AuctionAddress,
    call: &AuctionCall,
) -> HandlerResult<()> {
    match call {
        AuctionCall::Bid { commitment } => {
            handle_bid(state, ctx, address, *commitment).map(|_| ())
        }
        AuctionCall::CloseBidding => handle_close_bidding(state, ctx, address),
        AuctionCall::Reveal {
            commitment,
            amount,
            blinding,
        } => handle_reveal(state, ctx, address, *commitment, *amount, blinding).map(|_| ()),
    }
}
