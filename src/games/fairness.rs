//! Commit-reveal draw generation
//!
//! The server seed is hashed and published when a round opens; the draw is
//! derived from HMAC-SHA256 keyed by that seed, so anyone holding the revealed
//! seed, the client seed and the nonce can recompute it.

use crate::errors::{KenoResult, StateError, ValidationError};
use crate::games::types::{FairnessProof, Round, DRAW_COUNT, MAX_NUMBER};
use hmac::{Hmac, Mac};
use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

const SERVER_SEED_BYTES: usize = 32;
const CLIENT_SEED_BYTES: usize = 16;

#[derive(Debug, Clone, Copy, Default)]
pub struct FairnessEngine;

impl FairnessEngine {
    pub fn new() -> Self {
        Self
    }

    /// 32 bytes from the OS RNG, hex encoded
    pub fn generate_server_seed(&self) -> String {
        random_hex(SERVER_SEED_BYTES)
    }

    pub fn generate_client_seed(&self) -> String {
        random_hex(CLIENT_SEED_BYTES)
    }

    /// Hex SHA-256 of the seed string, published as the commitment
    pub fn hash_server_seed(&self, server_seed: &str) -> String {
        hex::encode(Sha256::digest(server_seed.as_bytes()))
    }

    pub fn verify_commitment(&self, server_seed: &str, server_seed_hash: &str) -> bool {
        self.hash_server_seed(server_seed)
            .eq_ignore_ascii_case(server_seed_hash.trim())
    }

    /// Derive 20 distinct numbers in [1, 80], ascending
    pub fn generate_draw(&self, server_seed: &str, client_seed: &str, nonce: u64) -> KenoResult<Vec<u8>> {
        let message = format!("{}:{}", client_seed, nonce);
        let mut seen = [false; MAX_NUMBER as usize + 1];
        let mut numbers = Vec::with_capacity(DRAW_COUNT);

        let mut round: u64 = 0;
        while numbers.len() < DRAW_COUNT {
            let digest = hmac_digest(server_seed, &format!("{}:{}", message, round))?;
            // Eight big-endian u32 words per digest
            for word in digest.chunks_exact(4) {
                let value = u32::from_be_bytes([word[0], word[1], word[2], word[3]]);
                let candidate = (value % MAX_NUMBER as u32) as usize + 1;
                if !seen[candidate] {
                    seen[candidate] = true;
                    numbers.push(candidate as u8);
                    if numbers.len() == DRAW_COUNT {
                        break;
                    }
                }
            }
            round += 1;
        }

        numbers.sort_unstable();
        Ok(numbers)
    }

    /// True iff `numbers`, once sorted, equals the recomputed draw
    pub fn verify_draw(&self, server_seed: &str, client_seed: &str, nonce: u64, numbers: &[u8]) -> bool {
        let mut claimed = numbers.to_vec();
        claimed.sort_unstable();
        matches!(self.generate_draw(server_seed, client_seed, nonce), Ok(draw) if draw == claimed)
    }

    /// Verification bundle for a round whose seed has been revealed
    pub fn proof(&self, round: &Round) -> KenoResult<FairnessProof> {
        if !round.seed_revealed() {
            return Err(StateError::SeedNotRevealed(round.round_id.clone()).into());
        }

        let (Some(server_seed), Some(client_seed)) = (&round.server_seed, &round.client_seed) else {
            return Err(StateError::SeedNotRevealed(round.round_id.clone()).into());
        };

        Ok(FairnessProof {
            round_id: round.round_id.clone(),
            server_seed: server_seed.clone(),
            server_seed_hash: round
                .server_seed_hash
                .clone()
                .unwrap_or_else(|| self.hash_server_seed(server_seed)),
            client_seed: client_seed.clone(),
            nonce: round.nonce,
            numbers: round.numbers_drawn.clone(),
        })
    }
}

fn random_hex(len: usize) -> String {
    let mut bytes = vec![0u8; len];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

fn hmac_digest(key: &str, data: &str) -> KenoResult<[u8; 32]> {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(key.as_bytes())
        .map_err(|e| ValidationError::InvalidSeed(format!("HMAC key rejected: {}", e)))?;
    mac.update(data.as_bytes());
    let mut digest = [0u8; 32];
    digest.copy_from_slice(&mac.finalize().into_bytes());
    Ok(digest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::types::{Amount, RoundStatus};
    use chrono::Utc;

    const GOLDEN: [u8; 20] = [7, 9, 11, 15, 22, 24, 30, 33, 35, 42, 47, 60, 64, 65, 68, 69, 70, 71, 75, 80];

    #[test]
    fn test_golden_vector() {
        let engine = FairnessEngine::new();
        assert_eq!(engine.generate_draw("s", "c", 1).unwrap(), GOLDEN.to_vec());
    }

    #[test]
    fn test_each_input_changes_the_draw() {
        let engine = FairnessEngine::new();
        assert_eq!(
            engine.generate_draw("s", "c", 2).unwrap(),
            vec![2, 3, 6, 16, 21, 26, 27, 30, 32, 35, 41, 45, 46, 51, 57, 58, 62, 67, 68, 76]
        );
        assert_eq!(
            engine.generate_draw("s", "d", 1).unwrap(),
            vec![5, 8, 13, 19, 21, 23, 27, 37, 38, 40, 44, 45, 52, 55, 57, 58, 59, 64, 70, 71]
        );
        assert_ne!(engine.generate_draw("t", "c", 1).unwrap(), GOLDEN.to_vec());
    }

    #[test]
    fn test_draw_shape_over_many_nonces() {
        let engine = FairnessEngine::new();
        let seed = engine.generate_server_seed();
        let client = engine.generate_client_seed();
        for nonce in 0..200 {
            let draw = engine.generate_draw(&seed, &client, nonce).unwrap();
            assert_eq!(draw.len(), 20);
            assert!(draw.windows(2).all(|w| w[0] < w[1]));
            assert!(draw.iter().all(|n| (1..=80).contains(n)));
        }
    }

    #[test]
    fn test_seed_generation_and_hash() {
        let engine = FairnessEngine::new();
        let seed = engine.generate_server_seed();
        assert_eq!(seed.len(), 64);
        assert_eq!(engine.generate_client_seed().len(), 32);
        assert_ne!(seed, engine.generate_server_seed());

        assert_eq!(
            engine.hash_server_seed("s"),
            "043a718774c572bd8a25adbeb1bfcd5c0256ae11cecf9f9c3f925d0e52beaf89"
        );
        assert!(engine.verify_commitment("s", "043A718774C572BD8A25ADBEB1BFCD5C0256AE11CECF9F9C3F925D0E52BEAF89"));
        assert!(!engine.verify_commitment("t", &engine.hash_server_seed("s")));
    }

    #[test]
    fn test_verify_draw() {
        let engine = FairnessEngine::new();
        let mut shuffled = GOLDEN.to_vec();
        shuffled.reverse();
        assert!(engine.verify_draw("s", "c", 1, &shuffled));

        let mut wrong = GOLDEN.to_vec();
        wrong[0] = 8;
        assert!(!engine.verify_draw("s", "c", 1, &wrong));
        assert!(!engine.verify_draw("s", "c", 1, &GOLDEN[..19]));
        assert!(!engine.verify_draw("s", "c", 2, &GOLDEN));
    }

    #[test]
    fn test_empty_and_long_seeds_are_accepted() {
        let engine = FairnessEngine::new();
        assert_eq!(engine.generate_draw("", "c", 1).unwrap().len(), 20);

        let long_seed = "ab".repeat(200);
        let draw = engine.generate_draw(&long_seed, "c", 1).unwrap();
        assert!(engine.verify_draw(&long_seed, "c", 1, &draw));
    }

    #[test]
    fn test_proof_requires_reveal() {
        let engine = FairnessEngine::new();
        let now = Utc::now();
        let mut round = Round {
            round_id: "r-1".to_string(),
            status: RoundStatus::Open,
            scheduled_time: now,
            open_time: now,
            close_time: None,
            draw_time: None,
            server_seed: Some("s".to_string()),
            server_seed_hash: Some(engine.hash_server_seed("s")),
            client_seed: Some("c".to_string()),
            nonce: 1,
            numbers_drawn: vec![],
            total_staked: Amount::ZERO,
            total_paid: Amount::ZERO,
            result_published: false,
        };
        assert!(engine.proof(&round).is_err());

        round.status = RoundStatus::Archived;
        round.numbers_drawn = GOLDEN.to_vec();
        let proof = engine.proof(&round).unwrap();
        assert_eq!(proof.server_seed, "s");
        assert!(engine.verify_draw(&proof.server_seed, &proof.client_seed, proof.nonce, &proof.numbers));
    }
}
