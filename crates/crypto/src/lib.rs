//! Commitment primitives for sealed-bid auctions.
//!
//! A bidder publishes `C = H(tag || amount || blinding)` while bidding is
//! open and later discloses `(amount, blinding)` so anyone can recompute `C`.
//!
//! - **Hiding**: the 256-bit uniformly random blinding makes `C` independent
//!   of the amount to anyone who does not hold it.
//! - **Binding**: opening `C` to a different amount requires a SHA-256
//!   collision.

pub mod commitment;
pub mod error;

pub use commitment::{commit, commit_random, verify_opening};
pub use error::CryptoError;
