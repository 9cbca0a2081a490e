//! Error types for cryptographic operations.

use auction_types::Commitment;
use thiserror::Error;

/// Errors that can occur during cryptographic operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    #[error("Commitment mismatch: opening does not reproduce {commitment}")]
    CommitmentMismatch { commitment: Commitment },
}
