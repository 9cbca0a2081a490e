//! JSON-RPC binding to the mock chain.

use std::sync::Arc;

use async_trait::async_trait;
use jsonrpsee::core::client::ClientT;
use jsonrpsee::http_client::{HttpClient, HttpClientBuilder};
use tracing::debug;

use auction_module::{AuctionCall, AuctionQuery, AuctionQueryResponse, HandlerResult};
use auction_types::{Address, AuctionAddress, BlockInfo};

use crate::gateway::{GatewayError, LedgerGateway, SubmissionReceipt};
use crate::query::ChainQuery;

/// Ledger gateway and query service over HTTP JSON-RPC.
///
/// Calls are submitted on behalf of `sender`.
#[derive(Clone)]
pub struct RpcLedgerClient {
    client: Arc<HttpClient>,
    sender: Address,
}

impl RpcLedgerClient {
    pub fn connect(url: &str, sender: Address) -> Result<Self, GatewayError> {
        let client = HttpClientBuilder::default().build(url)?;
        Ok(Self {
            client: Arc::new(client),
            sender,
        })
    }

    /// Create an auction owned by this client's sender.
    pub async fn create_auction(&self) -> Result<AuctionAddress, GatewayError> {
        let params = serde_json::json!({ "creator": hex::encode(self.sender) });
        let address = self.client.request("admin_createAuction", vec![params]).await?;
        Ok(address)
    }

    pub async fn list_auctions(&self) -> Result<Vec<AuctionAddress>, GatewayError> {
        match self.query(AuctionQuery::ListAuctions).await? {
            Ok(AuctionQueryResponse::Auctions(auctions)) => Ok(auctions),
            other => Err(GatewayError::Malformed(format!(
                "unexpected answer to list_auctions: {:?}",
                other
            ))),
        }
    }

    pub async fn block_info(&self) -> Result<BlockInfo, GatewayError> {
        let info = self
            .client
            .request("chain_getBlockInfo", Vec::<()>::new())
            .await?;
        Ok(info)
    }

    /// Advance the mock chain by one block.
    pub async fn advance_block(&self) -> Result<BlockInfo, GatewayError> {
        let info = self
            .client
            .request("admin_advanceBlock", Vec::<()>::new())
            .await?;
        Ok(info)
    }
}

#[async_trait]
impl LedgerGateway for RpcLedgerClient {
    async fn submit(
        &self,
        auction: &AuctionAddress,
        call: AuctionCall,
    ) -> Result<SubmissionReceipt, GatewayError> {
        let operation = call.operation();
        let params = serde_json::json!({
            "sender": hex::encode(self.sender),
            "auction": auction,
            "call": call,
        });

        let receipt: SubmissionReceipt = self.client.request("ledger_submit", vec![params]).await?;
        if !receipt.accepted && receipt.error.is_none() {
            return Err(GatewayError::Malformed(format!(
                "transaction {} rejected without a reason",
                receipt.tx_id
            )));
        }

        debug!(%operation, %auction, tx = %receipt.tx_id, accepted = receipt.accepted, "Submission ordered");
        Ok(receipt)
    }
}

#[async_trait]
impl ChainQuery for RpcLedgerClient {
    async fn query(
        &self,
        query: AuctionQuery,
    ) -> Result<HandlerResult<AuctionQueryResponse>, GatewayError> {
        let answer = self.client.request("query_auction", vec![query]).await?;
        Ok(answer)
    }
}
