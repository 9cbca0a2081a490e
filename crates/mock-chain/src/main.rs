//! Mock chain server for local testing of sealed-bid auctions.
//!
//! This provides a JSON-RPC server that hosts the auction ledger in
//! memory and orders submissions the way a chain would, without requiring
//! a real blockchain.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use jsonrpsee::core::async_trait;
use jsonrpsee::proc_macros::rpc;
use jsonrpsee::server::Server;
use jsonrpsee::types::error::INVALID_PARAMS_CODE;
use jsonrpsee::types::ErrorObjectOwned;
use parking_lot::RwLock;
use tracing::info;

use auction_module::{
    AuctionGenesisConfig, AuctionQuery, AuctionQueryResponse, HandlerResult, Ledger,
    SubmissionReceipt,
};
use auction_types::{decode_fixed_hex, Address, AuctionAddress, BlockInfo};

mod types;
use types::*;

#[derive(Parser)]
#[command(name = "mock-chain")]
#[command(about = "In-memory chain hosting sealed-bid auctions")]
struct Cli {
    /// Address to serve JSON-RPC on
    #[arg(long, default_value = "127.0.0.1:9944")]
    listen: SocketAddr,

    /// Genesis configuration (JSON)
    #[arg(long)]
    genesis: Option<PathBuf>,
}

/// RPC API definition for the mock chain.
#[rpc(server)]
pub trait MockChainApi {
    // ============ Admin Methods ============

    /// Create an auction owned by `creator`.
    #[method(name = "admin_createAuction")]
    async fn admin_create_auction(
        &self,
        params: CreateAuctionParams,
    ) -> Result<AuctionAddress, ErrorObjectOwned>;

    /// Advance the chain by one block.
    #[method(name = "admin_advanceBlock")]
    async fn admin_advance_block(&self) -> Result<BlockInfo, ErrorObjectOwned>;

    // ============ Ledger Methods ============

    /// Order and apply one auction call.
    #[method(name = "ledger_submit")]
    async fn ledger_submit(
        &self,
        params: SubmitCallParams,
    ) -> Result<SubmissionReceipt, ErrorObjectOwned>;

    // ============ Query Methods ============

    /// Get current block info.
    #[method(name = "chain_getBlockInfo")]
    async fn chain_get_block_info(&self) -> Result<BlockInfo, ErrorObjectOwned>;

    /// Answer a read-only auction query.
    ///
    /// Ledger-level failures such as `not_revealed_yet` come back inside
    /// the result, not as RPC errors.
    #[method(name = "query_auction")]
    async fn query_auction(
        &self,
        query: AuctionQuery,
    ) -> Result<HandlerResult<AuctionQueryResponse>, ErrorObjectOwned>;
}

/// Implementation of the mock chain RPC server.
struct MockChainServer {
    ledger: Arc<RwLock<Ledger>>,
}

impl MockChainServer {
    fn new(ledger: Ledger) -> Self {
        Self {
            ledger: Arc::new(RwLock::new(ledger)),
        }
    }

    fn invalid_params(msg: String) -> ErrorObjectOwned {
        ErrorObjectOwned::owned(INVALID_PARAMS_CODE, msg, None::<()>)
    }
}

fn parse_account(field: &str, s: &str) -> Result<Address, ErrorObjectOwned> {
    decode_fixed_hex::<32>(s)
        .map_err(|e| MockChainServer::invalid_params(format!("Invalid {}: {}", field, e)))
}

#[async_trait]
impl MockChainApiServer for MockChainServer {
    async fn admin_create_auction(
        &self,
        params: CreateAuctionParams,
    ) -> Result<AuctionAddress, ErrorObjectOwned> {
        let creator = parse_account("creator", &params.creator)?;
        Ok(self.ledger.write().create_auction(creator))
    }

    async fn admin_advance_block(&self) -> Result<BlockInfo, ErrorObjectOwned> {
        let info = self.ledger.write().advance_block();
        info!(height = info.height, "Block advanced");
        Ok(info)
    }

    async fn ledger_submit(
        &self,
        params: SubmitCallParams,
    ) -> Result<SubmissionReceipt, ErrorObjectOwned> {
        let sender = parse_account("sender", &params.sender)?;
        // One write guard per submission gives the total order.
        let receipt = self
            .ledger
            .write()
            .submit(&params.auction, sender, &params.call);
        Ok(receipt)
    }

    async fn chain_get_block_info(&self) -> Result<BlockInfo, ErrorObjectOwned> {
        Ok(self.ledger.read().block_info())
    }

    async fn query_auction(
        &self,
        query: AuctionQuery,
    ) -> Result<HandlerResult<AuctionQueryResponse>, ErrorObjectOwned> {
        Ok(self.ledger.read().query(query))
    }
}

fn load_genesis(cli: &Cli) -> Result<AuctionGenesisConfig> {
    let genesis = match &cli.genesis {
        Some(path) => {
            let bytes = std::fs::read(path)
                .with_context(|| format!("Failed to read genesis file {}", path.display()))?;
            serde_json::from_slice(&bytes)
                .with_context(|| format!("Invalid genesis file {}", path.display()))?
        }
        None => AuctionGenesisConfig::default(),
    };
    Ok(genesis)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("mock_chain=info".parse()?)
                .add_directive("auction_module=info".parse()?)
                .add_directive("jsonrpsee=warn".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let genesis = load_genesis(&cli)?;
    let ledger = Ledger::from_genesis(&genesis);
    for address in ledger.list_auctions() {
        info!(%address, "Genesis auction");
    }

    info!("Starting mock chain server on {}", cli.listen);

    let server = Server::builder().build(cli.listen).await?;
    let handle = server.start(MockChainServer::new(ledger).into_rpc());

    info!("Mock chain server running. Press Ctrl+C to stop.");

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;

    info!("Shutting down...");
    handle.stop()?;
    handle.stopped().await;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use auction_client::{
        AuctionController, ChainQuery, ControllerError, RpcLedgerClient, SecretVault,
    };
    use auction_module::AuctionError;
    use jsonrpsee::core::client::ClientT;
    use jsonrpsee::http_client::HttpClientBuilder;
    use jsonrpsee::server::ServerHandle;
    use tempfile::TempDir;

    async fn spawn(ledger: Ledger) -> (String, ServerHandle) {
        let server = Server::builder().build("127.0.0.1:0").await.unwrap();
        let addr = server.local_addr().unwrap();
        let handle = server.start(MockChainServer::new(ledger).into_rpc());
        (format!("http://{}", addr), handle)
    }

    #[tokio::test]
    async fn test_lifecycle_over_rpc() {
        let (url, _handle) = spawn(Ledger::new()).await;
        let dir = TempDir::new().unwrap();
        let client = RpcLedgerClient::connect(&url, [2u8; 32]).unwrap();

        let auction = client.create_auction().await.unwrap();
        assert_eq!(client.list_auctions().await.unwrap(), vec![auction]);

        let vault = SecretVault::open(dir.path().join("vault.json")).unwrap();
        let controller = AuctionController::new(client.clone(), client.clone(), vault, auction);

        let low = controller.place_bid(50).await.unwrap();
        client.advance_block().await.unwrap();
        let high = controller.place_bid(u64::MAX).await.unwrap();
        controller.close().await.unwrap();

        assert!(matches!(
            controller.place_bid(1).await,
            Err(ControllerError::Rejected {
                error: AuctionError::Phase { .. },
                ..
            })
        ));
        assert!(matches!(
            controller.highest_bid().await,
            Err(ControllerError::NotRevealedYet)
        ));

        controller.reveal_own_bid(&low.commitment).await.unwrap();
        controller.reveal_own_bid(&high.commitment).await.unwrap();

        assert_eq!(controller.highest_bid().await.unwrap(), u64::MAX);
        assert_eq!(controller.bid_count().await.unwrap(), 2);
        assert!(controller.is_revealed().await.unwrap());
        assert_eq!(client.block_info().await.unwrap().height, 1);
    }

    #[tokio::test]
    async fn test_genesis_auctions_visible() {
        let genesis = AuctionGenesisConfig {
            auctions: vec![auction_module::GenesisAuction {
                creator: [1u8; 32],
            }],
        };
        let (url, _handle) = spawn(Ledger::from_genesis(&genesis)).await;
        let client = RpcLedgerClient::connect(&url, [2u8; 32]).unwrap();

        let auctions = client.list_auctions().await.unwrap();
        assert_eq!(auctions.len(), 1);
        let state = client.query_state(&auctions[0]).await.unwrap().unwrap();
        assert_eq!(state.creator, [1u8; 32]);
    }

    #[tokio::test]
    async fn test_query_refusal_is_a_result() {
        let mut ledger = Ledger::new();
        let auction = ledger.create_auction([1u8; 32]);
        let (url, _handle) = spawn(ledger).await;
        let client = RpcLedgerClient::connect(&url, [2u8; 32]).unwrap();

        let answer = client
            .query(AuctionQuery::GetHighestBid { address: auction })
            .await
            .unwrap();
        assert_eq!(answer, Err(AuctionError::NotRevealedYet));

        let answer = client
            .query(AuctionQuery::GetBidCount { address: auction })
            .await
            .unwrap();
        assert_eq!(answer, Ok(AuctionQueryResponse::BidCount(0)));

        let missing = AuctionAddress([9u8; 32]);
        let answer = client
            .query(AuctionQuery::IsRevealed { address: missing })
            .await
            .unwrap();
        assert_eq!(answer, Err(AuctionError::AuctionNotFound { address: missing }));
        assert_eq!(client.query_state(&missing).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_block_info_tracks_height_only() {
        let (url, _handle) = spawn(Ledger::new()).await;
        let http = HttpClientBuilder::default().build(&url).unwrap();

        let info: serde_json::Value = http
            .request("admin_advanceBlock", Vec::<()>::new())
            .await
            .unwrap();
        assert_eq!(info, serde_json::json!({ "height": 1 }));
    }

    #[tokio::test]
    async fn test_rejects_malformed_sender() {
        let (url, _handle) = spawn(Ledger::new()).await;
        let http = HttpClientBuilder::default().build(&url).unwrap();

        let params = serde_json::json!({
            "sender": "not-hex",
            "auction": "03".repeat(32),
            "call": { "op": "close_bidding" },
        });
        let result: Result<SubmissionReceipt, _> =
            http.request("ledger_submit", vec![params]).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_rejects_out_of_range_amount() {
        let (url, _handle) = spawn(Ledger::new()).await;
        let http = HttpClientBuilder::default().build(&url).unwrap();

        let params = serde_json::json!({
            "sender": "02".repeat(32),
            "auction": "03".repeat(32),
            "call": {
                "op": "reveal",
                "commitment": "04".repeat(32),
                "amount": "-1",
                "blinding": "05".repeat(32),
            },
        });
        let result: Result<SubmissionReceipt, _> =
            http.request("ledger_submit", vec![params]).await;
        assert!(result.is_err());
    }
}
