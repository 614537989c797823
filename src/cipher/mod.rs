/*
 * Copyright (c) 2025 sh0rch <sh0rch@iwl.dev>
 * SPDX-License-Identifier: MIT
 */

//! # ChaCha20 engine
//!
//! Original (64-bit nonce, 64-bit block counter) ChaCha20:
//! - [`block`]: the 20-round block function.
//! - [`CipherState`]: constant/key/counter/nonce words and keystream generation.
//! - [`StreamCipher`]: XORs the keystream over data split into arbitrary chunks.
//!
//! There is no authentication: flipped ciphertext bits silently flip the
//! corresponding plaintext bits.

use thiserror::Error;

pub mod block;
mod state;
pub mod stream;

pub use state::CipherState;
pub use stream::{apply, StreamCipher};

pub const KEY_LEN: usize = 32;
pub const NONCE_LEN: usize = 8;
pub const BLOCK_LEN: usize = 64;
pub const BLOCK_WORDS: usize = 16;

/// 20 rounds, run as column/diagonal pairs.
pub const DOUBLE_ROUNDS: usize = 10;

/// `"expand 32-byte k"` as little-endian words.
pub const CONSTANTS: [u32; 4] = [0x6170_7865, 0x3320_646e, 0x7962_2d32, 0x6b20_6574];

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum CipherError {
    #[error("invalid key length: expected 32 bytes, got {0}")]
    InvalidKeyLength(usize),
    #[error("invalid nonce length: expected 8 bytes, got {0}")]
    InvalidNonceLength(usize),
    /// The 64-bit block counter has no room left for the requested keystream.
    #[error("block counter exhausted: keystream limit of 2^64 blocks reached")]
    CounterExhausted,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants_spell_expand_32_byte_k() {
        let mut bytes = Vec::with_capacity(16);
        for w in CONSTANTS {
            bytes.extend_from_slice(&w.to_le_bytes());
        }
        assert_eq!(&bytes, b"expand 32-byte k");
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            CipherError::InvalidKeyLength(31).to_string(),
            "invalid key length: expected 32 bytes, got 31"
        );
        assert_eq!(
            CipherError::InvalidNonceLength(9).to_string(),
            "invalid nonce length: expected 8 bytes, got 9"
        );
    }
}
