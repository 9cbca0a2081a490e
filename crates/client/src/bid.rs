//! Bid preparation.

use rand::{CryptoRng, RngCore};

use auction_crypto::commit_random;
use auction_module::AuctionCall;
use auction_types::{Commitment, SecretRecord};

/// A sealed bid ready for submission.
#[derive(Debug, Clone)]
pub struct PreparedBid {
    /// Public commitment sent to the ledger
    pub commitment: Commitment,
    /// Opening of the commitment (keep secret until reveal)
    pub secret: SecretRecord,
}

impl PreparedBid {
    /// The call that places this bid.
    pub fn bid_call(&self) -> AuctionCall {
        AuctionCall::Bid {
            commitment: self.commitment,
        }
    }
}

/// Seal `amount` under a fresh blinding drawn from `rng`.
pub fn prepare_bid<R: RngCore + CryptoRng>(amount: u64, rng: &mut R) -> PreparedBid {
    let (commitment, secret) = commit_random(amount, rng);
    PreparedBid { commitment, secret }
}

/// The call that opens `commitment` with a stored secret.
pub fn reveal_call(commitment: Commitment, secret: &SecretRecord) -> AuctionCall {
    AuctionCall::Reveal {
        commitment,
        amount: secret.amount,
        blinding: secret.blinding.clone(),
    }
}
