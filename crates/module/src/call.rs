//! Call message types for the auction module.

use auction_types::{Blinding, Commitment};
use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};

use crate::error::Operation;

/// State-changing calls accepted by an auction record.
///
/// Amounts travel as decimal strings in JSON so that no client rounds them
/// through a floating-point number.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum AuctionCall {
    /// Record a hidden bid.
    Bid { commitment: Commitment },

    /// End the bidding phase.
    CloseBidding,

    /// Open a previously recorded commitment.
    Reveal {
        commitment: Commitment,
        #[serde_as(as = "DisplayFromStr")]
        amount: u64,
        blinding: Blinding,
    },
}

impl AuctionCall {
    /// Operation name as submitted to the gateway.
    pub fn operation(&self) -> Operation {
        match self {
            AuctionCall::Bid { .. } => Operation::Bid,
            AuctionCall::CloseBidding => Operation::CloseBidding,
            AuctionCall::Reveal { .. } => Operation::Reveal,
        }
    }

    /// Commitment the call refers to, if any.
    pub fn commitment(&self) -> Option<&Commitment> {
        match self {
            AuctionCall::Bid { commitment } | AuctionCall::Reveal { commitment, .. } => {
                Some(commitment)
            }
            AuctionCall::CloseBidding => None,
        }
    }
}
