//! Read-only access to auction state.

use std::sync::Arc;

use async_trait::async_trait;

use auction_module::{AuctionQuery, AuctionQueryResponse, HandlerResult};
use auction_types::{AuctionAddress, AuctionLedgerState};

use crate::gateway::GatewayError;

/// Query interface for ledger-visible auction data.
///
/// Every call goes to the ledger; nothing is cached client-side.
#[async_trait]
pub trait ChainQuery: Send + Sync {
    /// Answer one query. The outer error is a transport failure; the inner
    /// one is the ledger refusing the query, e.g. `NotRevealedYet`.
    async fn query(
        &self,
        query: AuctionQuery,
    ) -> Result<HandlerResult<AuctionQueryResponse>, GatewayError>;

    /// Public record of an auction, `None` if no such auction exists.
    async fn query_state(
        &self,
        auction: &AuctionAddress,
    ) -> Result<Option<AuctionLedgerState>, GatewayError> {
        match self.query(AuctionQuery::GetState { address: *auction }).await? {
            Ok(AuctionQueryResponse::State(state)) => Ok(state),
            other => Err(GatewayError::Malformed(format!(
                "unexpected answer to get_state: {:?}",
                other
            ))),
        }
    }
}

#[async_trait]
impl<T: ChainQuery + ?Sized> ChainQuery for Arc<T> {
    async fn query(
        &self,
        query: AuctionQuery,
    ) -> Result<HandlerResult<AuctionQueryResponse>, GatewayError> {
        (**self).query(query).await
    }
}
