//! Core type definitions for sealed-bid commit/reveal auctions.
//!
//! This crate provides the data structures shared by the ledger module,
//! the bidder client and the mock chain: fixed-width byte identifiers,
//! the secret a bidder keeps until reveal, and the public auction record.

use std::fmt;
use std::str::FromStr;

use borsh::{BorshDeserialize, BorshSerialize};
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use serde_with::{hex::Hex, serde_as, DisplayFromStr};
use thiserror::Error;

/// Length of a bid commitment in bytes.
pub const COMMITMENT_LEN: usize = 32;

/// Length of a blinding value in bytes.
pub const BLINDING_LEN: usize = 32;

// =========================
// HEX ENCODING
// =========================

/// Errors parsing a fixed-width hex value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HexError {
    #[error("Invalid hex: {0}")]
    InvalidHex(String),

    #[error("Invalid length: expected {expected} bytes, got {got}")]
    InvalidLength { expected: usize, got: usize },
}

/// Decode a hex string (optionally `0x`-prefixed) into exactly `N` bytes.
pub fn decode_fixed_hex<const N: usize>(s: &str) -> Result<[u8; N], HexError> {
    let bytes = hex::decode(s.trim().trim_start_matches("0x"))
        .map_err(|e| HexError::InvalidHex(e.to_string()))?;
    let got = bytes.len();
    bytes
        .try_into()
        .map_err(|_| HexError::InvalidLength { expected: N, got })
}

/// Implements lowercase-hex `Display` and `FromStr` for a byte newtype.
macro_rules! hex_display {
    ($name:ident, $len:expr) => {
        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&hex::encode(self.0))
            }
        }

        impl FromStr for $name {
            type Err = HexError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                decode_fixed_hex::<$len>(s).map(Self)
            }
        }
    };
}

// =========================
// IDENTIFIERS
// =========================

/// Generic account address (32 bytes)
pub type Address = [u8; 32];

/// Binding identifier of a hidden bid.
#[serde_as]
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    BorshSerialize,
    BorshDeserialize,
    Serialize,
    Deserialize,
)]
pub struct Commitment(#[serde_as(as = "Hex")] pub [u8; COMMITMENT_LEN]);

hex_display!(Commitment, COMMITMENT_LEN);

/// Identifier of one auction record on the ledger.
#[serde_as]
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    BorshSerialize,
    BorshDeserialize,
    Serialize,
    Deserialize,
)]
pub struct AuctionAddress(#[serde_as(as = "Hex")] pub [u8; 32]);

hex_display!(AuctionAddress, 32);

/// Identifier the ledger assigns to every submission.
#[serde_as]
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, BorshSerialize, BorshDeserialize, Serialize, Deserialize,
)]
pub struct TxId(#[serde_as(as = "Hex")] pub [u8; 32]);

hex_display!(TxId, 32);

// =========================
// BIDDER SECRETS
// =========================

/// Random value mixed into a commitment so the amount cannot be guessed.
#[serde_as]
#[derive(Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct Blinding(#[serde_as(as = "Hex")] pub [u8; BLINDING_LEN]);

hex_display!(Blinding, BLINDING_LEN);

impl Blinding {
    /// Draw a fresh blinding value from a cryptographic RNG.
    pub fn random<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        let mut bytes = [0u8; BLINDING_LEN];
        rng.fill_bytes(&mut bytes);
        Self(bytes)
    }
}

// Blindings must never end up in logs.
impl fmt::Debug for Blinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Blinding(<redacted>)")
    }
}

/// Opening of a commitment, held only by the bidder until reveal.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct SecretRecord {
    pub amount: u64,
    pub blinding: Blinding,
}

// =========================
// LEDGER STATE
// =========================

/// Auction lifecycle phase
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    BorshSerialize,
    BorshDeserialize,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Accepting commitments
    Open,
    /// Bidding over, waiting for reveals
    Closed,
    /// At least one bid revealed
    Revealed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Open => "open",
            Phase::Closed => "closed",
            Phase::Revealed => "revealed",
        })
    }
}

/// An accepted commitment and, once revealed, its amount.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct BidEntry {
    pub commitment: Commitment,
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub revealed_amount: Option<u64>,
}

impl BidEntry {
    pub fn is_revealed(&self) -> bool {
        self.revealed_amount.is_some()
    }
}

/// Public auction record as seen through the chain query service.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct AuctionLedgerState {
    pub address: AuctionAddress,
    pub creator: Address,
    pub phase: Phase,
    pub bid_count: u64,

    /// Meaningless until `phase == Revealed`
    #[serde_as(as = "DisplayFromStr")]
    pub highest_bid: u64,

    /// Commitment currently holding `highest_bid`
    pub leading_commitment: Option<Commitment>,

    /// Accepted commitments in bid order
    pub bids: Vec<BidEntry>,
}

impl AuctionLedgerState {
    pub fn is_open(&self) -> bool {
        self.phase == Phase::Open
    }

    pub fn is_revealed(&self) -> bool {
        self.phase == Phase::Revealed
    }

    /// Highest bid, only once it can be trusted.
    pub fn revealed_highest_bid(&self) -> Option<u64> {
        self.is_revealed().then_some(self.highest_bid)
    }

    /// Number of commitments revealed so far.
    pub fn revealed_count(&self) -> usize {
        self.bids.iter().filter(|b| b.is_revealed()).count()
    }
}

/// Block info response.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockInfo {
    pub height: u64,
}

// =========================
// HELPER FUNCTIONS
// =========================

/// Derive the address of a newly created auction.
pub fn compute_auction_address(creator: &Address, nonce: u64) -> AuctionAddress {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(b"SEALED_AUCTION_ADDRESS_V1:");
    hasher.update(creator);
    hasher.update(nonce.to_le_bytes());
    AuctionAddress(hasher.finalize().into())
}

/// Derive the identifier of a submitted transaction.
pub fn compute_tx_id(block_height: u64, sequence: u64, call_bytes: &[u8]) -> TxId {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(b"SEALED_AUCTION_TX_V1:");
    hasher.update(block_height.to_le_bytes());
    hasher.update(sequence.to_le_bytes());
    hasher.update(call_bytes);
    TxId(hasher.finalize().into())
}
