//! Submission path from a bidder to the ledger.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use auction_module::AuctionCall;
use auction_types::AuctionAddress;

pub use auction_module::SubmissionReceipt;

/// Failures to reach the ledger or to understand its answer.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Malformed response: {0}")]
    Malformed(String),
}

impl From<jsonrpsee::core::ClientError> for GatewayError {
    fn from(err: jsonrpsee::core::ClientError) -> Self {
        GatewayError::Transport(err.to_string())
    }
}

/// Delivers auction calls to the ledger and waits for a definite outcome.
///
/// Implementations do not retry. A returned receipt means the ledger has
/// ordered the call; `receipt.accepted` says whether it was applied.
#[async_trait]
pub trait LedgerGateway: Send + Sync {
    async fn submit(
        &self,
        auction: &AuctionAddress,
        call: AuctionCall,
    ) -> Result<SubmissionReceipt, GatewayError>;
}

#[async_trait]
impl<T: LedgerGateway + ?Sized> LedgerGateway for Arc<T> {
    async fn submit(
        &self,
        auction: &AuctionAddress,
        call: AuctionCall,
    ) -> Result<SubmissionReceipt, GatewayError> {
        (**self).submit(auction, call).await
    }
}
