//! Bidder-side orchestration of the commit/reveal lifecycle.
//!
//! The controller owns the bidder's vault. A secret is written only after
//! the ledger has accepted the matching bid, so the vault never holds
//! openings for commitments the ledger does not know.

use std::fmt;
use std::path::PathBuf;

use rand::rngs::OsRng;
use thiserror::Error;
use tracing::{info, warn};

use auction_module::{AuctionCall, AuctionError, AuctionQuery, AuctionQueryResponse};
use auction_types::{AuctionAddress, AuctionLedgerState, Commitment, SecretRecord, TxId};

use crate::bid::{prepare_bid, reveal_call};
use crate::gateway::{GatewayError, LedgerGateway};
use crate::query::ChainQuery;
use crate::vault::{SecretVault, VaultError};

/// The ledger call an operation was making when it failed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Attempt {
    Bid { commitment: Commitment, amount: u64 },
    CloseBidding,
    Reveal { commitment: Commitment, amount: u64 },
}

impl fmt::Display for Attempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Attempt::Bid { commitment, amount } => {
                write!(f, "bid {} (amount {})", commitment, amount)
            }
            Attempt::CloseBidding => f.write_str("close_bidding"),
            Attempt::Reveal { commitment, amount } => {
                write!(f, "reveal {} (amount {})", commitment, amount)
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum ControllerError {
    /// The ledger ordered the call and rejected it.
    #[error("{error} [{attempt}]")]
    Rejected {
        attempt: Attempt,
        #[source]
        error: AuctionError,
    },

    /// The call may or may not have reached the ledger.
    #[error("GatewayError: {error} [{attempt}]")]
    Submission {
        attempt: Attempt,
        #[source]
        error: GatewayError,
    },

    #[error(
        "NoSecretForCommitment: no secret for {commitment} in vault {}; reveal with the vault that placed the bid",
        .vault.display()
    )]
    NoSecretForCommitment {
        commitment: Commitment,
        vault: PathBuf,
    },

    #[error("GatewayError: {0}")]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Vault(#[from] VaultError),

    /// The bid is on the ledger but its opening is only in this error.
    #[error(
        "SecretNotPersisted: bid {commitment} (amount {}) was accepted but its secret could not be stored: {source}",
        .record.amount
    )]
    SecretNotPersisted {
        commitment: Commitment,
        record: SecretRecord,
        #[source]
        source: VaultError,
    },

    #[error("AuctionNotFound: no auction at {0}")]
    AuctionNotFound(AuctionAddress),

    #[error("NotRevealedYet: the highest bid is unavailable until a bid is revealed")]
    NotRevealedYet,
}

/// A bid accepted by the ledger.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlacedBid {
    pub commitment: Commitment,
    pub tx_id: TxId,
}

/// A bid revealed on the ledger.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RevealedBid {
    pub commitment: Commitment,
    pub amount: u64,
    pub tx_id: TxId,
}

/// Drives one auction on behalf of one bidder.
pub struct AuctionController<G, Q> {
    gateway: G,
    query: Q,
    vault: SecretVault,
    auction: AuctionAddress,
}

impl<G: LedgerGateway, Q: ChainQuery> AuctionController<G, Q> {
    pub fn new(gateway: G, query: Q, vault: SecretVault, auction: AuctionAddress) -> Self {
        Self {
            gateway,
            query,
            vault,
            auction,
        }
    }

    pub fn auction(&self) -> &AuctionAddress {
        &self.auction
    }

    pub fn vault(&self) -> &SecretVault {
        &self.vault
    }

    /// Seal `amount`, submit the commitment, then store the opening.
    pub async fn place_bid(&self, amount: u64) -> Result<PlacedBid, ControllerError> {
        let prepared = prepare_bid(amount, &mut OsRng);
        let attempt = Attempt::Bid {
            commitment: prepared.commitment,
            amount,
        };
        let tx_id = self.submit(prepared.bid_call(), attempt).await?;

        let commitment = prepared.commitment;
        if let Err(source) = self.vault.put(&commitment, &prepared.secret) {
            warn!(%commitment, tx = %tx_id, error = %source, "Bid accepted but secret not stored");
            return Err(ControllerError::SecretNotPersisted {
                commitment,
                record: prepared.secret,
                source,
            });
        }

        info!(%commitment, tx = %tx_id, "Bid placed");
        Ok(PlacedBid { commitment, tx_id })
    }

    pub async fn close(&self) -> Result<TxId, ControllerError> {
        let tx_id = self
            .submit(AuctionCall::CloseBidding, Attempt::CloseBidding)
            .await?;
        info!(auction = %self.auction, tx = %tx_id, "Bidding closed");
        Ok(tx_id)
    }

    /// Open a bid placed earlier through this vault.
    pub async fn reveal_own_bid(
        &self,
        commitment: &Commitment,
    ) -> Result<RevealedBid, ControllerError> {
        let record = self.vault.get(commitment)?.ok_or_else(|| {
            ControllerError::NoSecretForCommitment {
                commitment: *commitment,
                vault: self.vault.path().to_path_buf(),
            }
        })?;

        let attempt = Attempt::Reveal {
            commitment: *commitment,
            amount: record.amount,
        };
        let tx_id = self.submit(reveal_call(*commitment, &record), attempt).await?;

        // The reveal is final on the ledger; the audit mark is best effort.
        if let Err(err) = self.vault.mark_revealed(commitment, &tx_id) {
            warn!(%commitment, tx = %tx_id, error = %err, "Revealed bid not marked in vault");
        }

        info!(%commitment, tx = %tx_id, "Bid revealed");
        Ok(RevealedBid {
            commitment: *commitment,
            amount: record.amount,
            tx_id,
        })
    }

    pub async fn query_state(&self) -> Result<AuctionLedgerState, ControllerError> {
        self.query
            .query_state(&self.auction)
            .await?
            .ok_or(ControllerError::AuctionNotFound(self.auction))
    }

    pub async fn highest_bid(&self) -> Result<u64, ControllerError> {
        let address = self.auction;
        match self.ask(AuctionQuery::GetHighestBid { address }).await? {
            AuctionQueryResponse::HighestBid(amount) => Ok(amount),
            other => Err(unexpected(other)),
        }
    }

    pub async fn bid_count(&self) -> Result<u64, ControllerError> {
        let address = self.auction;
        match self.ask(AuctionQuery::GetBidCount { address }).await? {
            AuctionQueryResponse::BidCount(count) => Ok(count),
            other => Err(unexpected(other)),
        }
    }

    pub async fn is_revealed(&self) -> Result<bool, ControllerError> {
        let address = self.auction;
        match self.ask(AuctionQuery::IsRevealed { address }).await? {
            AuctionQueryResponse::Revealed(revealed) => Ok(revealed),
            other => Err(unexpected(other)),
        }
    }

    async fn ask(&self, query: AuctionQuery) -> Result<AuctionQueryResponse, ControllerError> {
        match self.query.query(query).await? {
            Ok(response) => Ok(response),
            Err(AuctionError::NotRevealedYet) => Err(ControllerError::NotRevealedYet),
            Err(AuctionError::AuctionNotFound { address }) => {
                Err(ControllerError::AuctionNotFound(address))
            }
            Err(other) => Err(GatewayError::Malformed(format!("query refused: {}", other)).into()),
        }
    }

    async fn submit(&self, call: AuctionCall, attempt: Attempt) -> Result<TxId, ControllerError> {
        let receipt = match self.gateway.submit(&self.auction, call).await {
            Ok(receipt) => receipt,
            Err(error) => return Err(ControllerError::Submission { attempt, error }),
        };
        if receipt.accepted {
            return Ok(receipt.tx_id);
        }
        match receipt.error {
            Some(error) => Err(ControllerError::Rejected { attempt, error }),
            None => Err(ControllerError::Submission {
                attempt,
                error: GatewayError::Malformed(format!(
                    "transaction {} rejected without a reason",
                    receipt.tx_id
                )),
            }),
        }
    }
}

fn unexpected(response: AuctionQueryResponse) -> ControllerError {
    GatewayError::Malformed(format!("unexpected query answer: {:?}", response)).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::SubmissionReceipt;
    use async_trait::async_trait;
    use auction_crypto::commit_random;
    use auction_module::{HandlerResult, Ledger, Operation};
    use auction_types::Phase;
    use parking_lot::Mutex;
    use std::sync::Arc;
    use tempfile::TempDir;

    const CREATOR: [u8; 32] = [1u8; 32];
    const BIDDER: [u8; 32] = [2u8; 32];

    /// In-memory ledger shared by gateway and query side.
    #[derive(Clone)]
    struct FakeChain {
        ledger: Arc<Mutex<Ledger>>,
        submissions: Arc<Mutex<Vec<AuctionCall>>>,
    }

    impl FakeChain {
        fn new() -> (Self, AuctionAddress) {
            let mut ledger = Ledger::new();
            let auction = ledger.create_auction(CREATOR);
            let chain = Self {
                ledger: Arc::new(Mutex::new(ledger)),
                submissions: Arc::new(Mutex::new(Vec::new())),
            };
            (chain, auction)
        }
    }

    #[async_trait]
    impl LedgerGateway for FakeChain {
        async fn submit(
            &self,
            auction: &AuctionAddress,
            call: AuctionCall,
        ) -> Result<SubmissionReceipt, GatewayError> {
            self.submissions.lock().push(call.clone());
            Ok(self.ledger.lock().submit(auction, BIDDER, &call))
        }
    }

    #[async_trait]
    impl ChainQuery for FakeChain {
        async fn query(
            &self,
            query: AuctionQuery,
        ) -> Result<HandlerResult<AuctionQueryResponse>, GatewayError> {
            Ok(self.ledger.lock().query(query))
        }
    }

    /// Gateway whose transport always fails.
    struct Unreachable;

    #[async_trait]
    impl LedgerGateway for Unreachable {
        async fn submit(
            &self,
            _auction: &AuctionAddress,
            _call: AuctionCall,
        ) -> Result<SubmissionReceipt, GatewayError> {
            Err(GatewayError::Transport("connection refused".into()))
        }
    }

    fn controller(dir: &TempDir) -> (AuctionController<FakeChain, FakeChain>, FakeChain) {
        let (chain, auction) = FakeChain::new();
        let vault = SecretVault::open(dir.path().join("vault.json")).unwrap();
        (
            AuctionController::new(chain.clone(), chain.clone(), vault, auction),
            chain,
        )
    }

    #[tokio::test]
    async fn test_place_bid_persists_after_acceptance() {
        let dir = TempDir::new().unwrap();
        let (controller, _chain) = controller(&dir);

        let placed = controller.place_bid(100).await.unwrap();

        let record = controller.vault().get(&placed.commitment).unwrap().unwrap();
        assert_eq!(record.amount, 100);
        assert_eq!(controller.bid_count().await.unwrap(), 1);
        assert!(!controller.is_revealed().await.unwrap());
    }

    #[tokio::test]
    async fn test_full_lifecycle() {
        let dir = TempDir::new().unwrap();
        let (controller, _chain) = controller(&dir);

        let low = controller.place_bid(50).await.unwrap();
        let high = controller.place_bid(100).await.unwrap();
        controller.close().await.unwrap();

        assert!(matches!(
            controller.highest_bid().await,
            Err(ControllerError::NotRevealedYet)
        ));

        let revealed = controller.reveal_own_bid(&high.commitment).await.unwrap();
        assert_eq!(revealed.amount, 100);
        controller.reveal_own_bid(&low.commitment).await.unwrap();

        assert_eq!(controller.highest_bid().await.unwrap(), 100);
        assert_eq!(controller.bid_count().await.unwrap(), 2);
        assert!(controller.is_revealed().await.unwrap());

        let entry = controller.vault().entry(&high.commitment).unwrap().unwrap();
        assert_eq!(entry.revealed_tx, Some(revealed.tx_id));
    }

    #[tokio::test]
    async fn test_rejected_bid_leaves_no_secret() {
        let dir = TempDir::new().unwrap();
        let (controller, _chain) = controller(&dir);
        controller.close().await.unwrap();

        let err = controller.place_bid(10).await.unwrap_err();
        assert!(matches!(
            err,
            ControllerError::Rejected {
                attempt: Attempt::Bid { amount: 10, .. },
                error: AuctionError::Phase {
                    operation: Operation::Bid,
                    expected: Phase::Open,
                    got: Phase::Closed,
                },
            }
        ));
        assert!(controller.vault().entries().unwrap().is_empty());
        assert_eq!(controller.bid_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_transport_failure_leaves_no_secret() {
        let dir = TempDir::new().unwrap();
        let (chain, auction) = FakeChain::new();
        let vault = SecretVault::open(dir.path().join("vault.json")).unwrap();
        let controller = AuctionController::new(Unreachable, chain, vault, auction);

        let err = controller.place_bid(10).await.unwrap_err();
        assert!(matches!(
            err,
            ControllerError::Submission {
                error: GatewayError::Transport(_),
                ..
            }
        ));
        assert!(controller.vault().entries().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rejection_names_commitment_and_amount() {
        let dir = TempDir::new().unwrap();
        let (controller, _chain) = controller(&dir);
        controller.close().await.unwrap();

        let err = controller.place_bid(424242).await.unwrap_err();
        let ControllerError::Rejected {
            attempt: Attempt::Bid { commitment, .. },
            ..
        } = &err
        else {
            panic!("unexpected error {:?}", err);
        };
        let msg = err.to_string();
        assert!(msg.starts_with("PhaseError:"), "{}", msg);
        assert!(msg.contains("424242"), "{}", msg);
        assert!(msg.contains(&commitment.to_string()), "{}", msg);
    }

    #[tokio::test]
    async fn test_transport_failure_names_commitment_and_amount() {
        let dir = TempDir::new().unwrap();
        let (chain, auction) = FakeChain::new();
        let vault = SecretVault::open(dir.path().join("vault.json")).unwrap();
        let controller = AuctionController::new(Unreachable, chain, vault, auction);

        let msg = controller.place_bid(31337).await.unwrap_err().to_string();
        assert!(msg.starts_with("GatewayError:"), "{}", msg);
        assert!(msg.contains("connection refused"), "{}", msg);
        assert!(msg.contains("(amount 31337)"), "{}", msg);

        let close = controller.close().await.unwrap_err().to_string();
        assert!(close.contains("close_bidding"), "{}", close);
    }

    #[tokio::test]
    async fn test_secret_not_persisted() {
        let dir = TempDir::new().unwrap();
        let (controller, _chain) = controller(&dir);
        std::fs::write(controller.vault().lock_path(), "1\n").unwrap();

        let err = controller.place_bid(77).await.unwrap_err();
        let ControllerError::SecretNotPersisted {
            commitment, record, ..
        } = err
        else {
            panic!("unexpected error {:?}", err);
        };

        // The ledger has the bid and the error carries a valid opening.
        assert_eq!(record.amount, 77);
        assert!(auction_crypto::verify_opening(&commitment, 77, &record.blinding).is_ok());
        assert_eq!(controller.bid_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_reveal_without_secret() {
        let dir = TempDir::new().unwrap();
        let (controller, chain) = controller(&dir);

        // Bid placed by someone else, whose secret is not in this vault.
        let (commitment, _) = commit_random(30, &mut OsRng);
        chain
            .ledger
            .lock()
            .submit(controller.auction(), BIDDER, &AuctionCall::Bid { commitment });
        controller.close().await.unwrap();
        let before = chain.submissions.lock().len();

        let err = controller.reveal_own_bid(&commitment).await.unwrap_err();
        assert!(matches!(
            err,
            ControllerError::NoSecretForCommitment { commitment: c, .. } if c == commitment
        ));
        assert_eq!(chain.submissions.lock().len(), before);
    }

    #[tokio::test]
    async fn test_reveal_before_close() {
        let dir = TempDir::new().unwrap();
        let (controller, _chain) = controller(&dir);
        let placed = controller.place_bid(20).await.unwrap();

        let err = controller.reveal_own_bid(&placed.commitment).await.unwrap_err();
        assert!(matches!(
            err,
            ControllerError::Rejected {
                error: AuctionError::Phase { .. },
                ..
            }
        ));
        assert!(err.to_string().contains("(amount 20)"));
        let entry = controller.vault().entry(&placed.commitment).unwrap().unwrap();
        assert_eq!(entry.revealed_tx, None);
    }

    #[tokio::test]
    async fn test_double_reveal() {
        let dir = TempDir::new().unwrap();
        let (controller, _chain) = controller(&dir);
        let placed = controller.place_bid(20).await.unwrap();
        controller.close().await.unwrap();
        controller.reveal_own_bid(&placed.commitment).await.unwrap();

        let err = controller.reveal_own_bid(&placed.commitment).await.unwrap_err();
        assert!(matches!(
            err,
            ControllerError::Rejected {
                attempt: Attempt::Reveal { amount: 20, .. },
                error: AuctionError::AlreadyRevealed { .. },
            }
        ));
        assert_eq!(controller.highest_bid().await.unwrap(), 20);
    }

    #[tokio::test]
    async fn test_unknown_auction() {
        let dir = TempDir::new().unwrap();
        let (chain, _) = FakeChain::new();
        let vault = SecretVault::open(dir.path().join("vault.json")).unwrap();
        let missing = AuctionAddress([9u8; 32]);
        let controller = AuctionController::new(chain.clone(), chain, vault, missing);

        assert!(matches!(
            controller.bid_count().await,
            Err(ControllerError::AuctionNotFound(address)) if address == missing
        ));
        assert!(matches!(
            controller.highest_bid().await,
            Err(ControllerError::AuctionNotFound(address)) if address == missing
        ));
        assert!(matches!(
            controller.place_bid(1).await,
            Err(ControllerError::Rejected {
                error: AuctionError::AuctionNotFound { .. },
                ..
            })
        ));
    }
}
