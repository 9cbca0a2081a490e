//! Auction module error types.

use std::fmt;

use auction_types::{AuctionAddress, Commitment, Phase};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Ledger operations, named for error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Bid,
    CloseBidding,
    Reveal,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operation::Bid => "bid",
            Operation::CloseBidding => "close_bidding",
            Operation::Reveal => "reveal",
        })
    }
}

/// Errors that can occur in the auction module.
///
/// These cross the RPC boundary inside submission receipts, so they are
/// serializable and carry the offending commitment.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AuctionError {
    #[error("PhaseError: {operation} not allowed in phase {got} (requires {expected})")]
    Phase {
        operation: Operation,
        expected: Phase,
        got: Phase,
    },

    #[error("CommitmentMismatch: opening does not reproduce commitment {commitment}")]
    CommitmentMismatch { commitment: Commitment },

    #[error("UnknownCommitment: {commitment} was never bid")]
    UnknownCommitment { commitment: Commitment },

    #[error("AlreadyRevealed: {commitment} was revealed before")]
    AlreadyRevealed { commitment: Commitment },

    #[error("DuplicateCommitment: {commitment} is already recorded")]
    DuplicateCommitment { commitment: Commitment },

    #[error("NotRevealedYet: highest bid is not available before a reveal")]
    NotRevealedYet,

    #[error("Auction not found: {address}")]
    AuctionNotFound { address: AuctionAddress },

    #[error("Bid counter overflow")]
    CounterOverflow,
}

impl AuctionError {
    /// Short name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            AuctionError::Phase { .. } => "PhaseError",
            AuctionError::CommitmentMismatch { .. } => "CommitmentMismatch",
            AuctionError::UnknownCommitment { .. } => "UnknownCommitment",
            AuctionError::AlreadyRevealed { .. } => "AlreadyRevealed",
            AuctionError::DuplicateCommitment { .. } => "DuplicateCommitment",
            AuctionError::NotRevealedYet => "NotRevealedYet",
            AuctionError::AuctionNotFound { .. } => "AuctionNotFound",
            AuctionError::CounterOverflow => "CounterOverflow",
        }
    }
}
