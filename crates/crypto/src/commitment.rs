//! SHA-256 commitments to bid amounts.

use auction_types::{Blinding, Commitment, SecretRecord};
use rand::{CryptoRng, RngCore};
use sha2::{Digest, Sha256};

use crate::error::CryptoError;

/// Domain separator for bid commitments.
const COMMITMENT_DOMAIN: &[u8] = b"SEALED_BID_COMMITMENT_V1";

/// Type tag for an amount encoded as 8 little-endian bytes.
const AMOUNT_TAG_U64: u8 = 0x08;

/// Commit to `amount` under `blinding`.
///
/// The amount is always encoded at fixed width behind a type tag, so two
/// openings can only collide through a SHA-256 collision.
pub fn commit(amount: u64, blinding: &Blinding) -> Commitment {
    let mut hasher = Sha256::new();
    hasher.update(COMMITMENT_DOMAIN);
    hasher.update([AMOUNT_TAG_U64]);
    hasher.update(amount.to_le_bytes());
    hasher.update(blinding.0);
    Commitment(hasher.finalize().into())
}

/// Commit to `amount` with a freshly drawn blinding value.
///
/// Returns the commitment together with the secret needed to open it.
pub fn commit_random<R: RngCore + CryptoRng>(amount: u64, rng: &mut R) -> (Commitment, SecretRecord) {
    let blinding = Blinding::random(rng);
    let commitment = commit(amount, &blinding);
    (commitment, SecretRecord { amount, blinding })
}

/// Check that `(amount, blinding)` opens `commitment`.
pub fn verify_opening(
    commitment: &Commitment,
    amount: u64,
    blinding: &Blinding,
) -> Result<(), CryptoError> {
    if commit(amount, blinding) == *commitment {
        Ok(())
    } else {
        Err(CryptoError::CommitmentMismatch {
            commitment: *commitment,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::rngs::OsRng;
    use std::collections::HashSet;

    #[test]
    fn test_commit_verify() {
        let mut rng = OsRng;
        let (commitment, secret) = commit_random(1000, &mut rng);

        assert!(verify_opening(&commitment, 1000, &secret.blinding).is_ok());
        assert_eq!(
            verify_opening(&commitment, 1001, &secret.blinding),
            Err(CryptoError::CommitmentMismatch { commitment })
        );
    }

    #[test]
    fn test_commit_hiding() {
        let mut rng = OsRng;
        let (c1, _) = commit_random(1000, &mut rng);
        let (c2, _) = commit_random(1000, &mut rng);

        // Same value, different blinding -> different commitments
        assert_ne!(c1, c2);
    }

    #[test]
    fn test_commit_binding() {
        let mut rng = OsRng;
        let (c1, s1) = commit_random(1000, &mut rng);
        let (c2, s2) = commit_random(2000, &mut rng);

        assert_ne!(c1, c2);
        assert!(verify_opening(&c1, 2000, &s1.blinding).is_err());
        assert!(verify_opening(&c2, 1000, &s2.blinding).is_err());
    }

    #[test]
    fn test_commit_known_vector_is_stable() {
        let blinding = Blinding([0u8; 32]);
        let mut preimage = Vec::new();
        preimage.extend_from_slice(b"SEALED_BID_COMMITMENT_V1");
        preimage.push(0x08);
        preimage.extend_from_slice(&100u64.to_le_bytes());
        preimage.extend_from_slice(&[0u8; 32]);

        let expected: [u8; 32] = Sha256::digest(&preimage).into();
        assert_eq!(commit(100, &blinding).0, expected);
    }

    #[test]
    fn test_tampered_blinding_fails() {
        let mut rng = OsRng;
        let (commitment, secret) = commit_random(77, &mut rng);
        let mut tampered = secret.blinding.clone();
        tampered.0[31] ^= 0x01;

        assert!(verify_opening(&commitment, 77, &tampered).is_err());
    }

    #[test]
    fn test_no_collisions_across_random_openings() {
        let mut rng = OsRng;
        let mut seen = HashSet::new();
        for _ in 0..10_000 {
            let amount = rng.next_u64();
            let (commitment, _) = commit_random(amount, &mut rng);
            assert!(seen.insert(commitment), "commitment collision");
        }
    }

    proptest! {
        #[test]
        fn commit_is_deterministic(amount in any::<u64>(), bytes in any::<[u8; 32]>()) {
            let blinding = Blinding(bytes);
            prop_assert_eq!(commit(amount, &blinding), commit(amount, &blinding));
            prop_assert!(verify_opening(&commit(amount, &blinding), amount, &blinding).is_ok());
        }

        #[test]
        fn distinct_amounts_do_not_open(
            a in any::<u64>(),
            b in any::<u64>(),
            bytes in any::<[u8; 32]>(),
        ) {
            prop_assume!(a != b);
            let blinding = Blinding(bytes);
            prop_assert!(verify_opening(&commit(a, &blinding), b, &blinding).is_err());
        }
    }
}
