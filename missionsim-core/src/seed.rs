//! Seed derivation for independent trial streams.
//!
//! A run is identified by one user-visible seed. Parallel runs split the
//! trial range into chunks and give every chunk its own stream, derived by
//! keying HMAC-SHA256 with the user seed and tagging it with the chunk index.
use hmac::{Hmac, Mac};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use sha2::Sha256;

const CHUNK_DOMAIN: &[u8] = b"missionsim-chunk-";

/// Derive a 64-bit stream seed from the user seed and a domain tag.
#[must_use]
pub fn derive_stream_seed(user_seed: u64, domain_tag: &[u8]) -> u64 {
    let mut mac =
        Hmac::<Sha256>::new_from_slice(&user_seed.to_le_bytes()).expect("64-bit seed is valid key");
    mac.update(domain_tag);
    let digest = mac.finalize().into_bytes();
    let seed_bytes: [u8; 8] = digest[..8].try_into().expect("digest slice length");
    u64::from_le_bytes(seed_bytes)
}

/// Generator for the chunk at `index` of a run seeded with `user_seed`.
#[must_use]
pub fn chunk_rng(user_seed: u64, index: usize) -> ChaCha20Rng {
    let mut tag = Vec::with_capacity(CHUNK_DOMAIN.len() + 8);
    tag.extend_from_slice(CHUNK_DOMAIN);
    tag.extend_from_slice(&u64::try_from(index).unwrap_or(u64::MAX).to_le_bytes());
    ChaCha20Rng::seed_from_u64(derive_stream_seed(user_seed, &tag))
}

/// Generator for a sequential run.
#[must_use]
pub fn run_rng(user_seed: u64) -> ChaCha20Rng {
    ChaCha20Rng::seed_from_u64(user_seed)
}
