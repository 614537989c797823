/*
 * Copyright (c) 2025 sh0rch <sh0rch@iwl.dev>
 * SPDX-License-Identifier: MIT
 */

use super::{block, CipherError, BLOCK_LEN, BLOCK_WORDS, CONSTANTS, KEY_LEN, NONCE_LEN};
use log::{debug, trace};
use std::fmt;
use zeroize::Zeroize;

/// Cursor into one ChaCha20 keystream.
///
/// Block input layout is `[4 constant][8 key][2 counter, low first][2 nonce]`.
/// Key and nonce never change after construction; the counter only moves
/// forward, one step per generated block. Key material is wiped on drop.
///
/// Not `Clone`: two copies of one cursor would hand out the same keystream.
/// Not `Zeroize` either: wiping a live state would rewind the counter.
pub struct CipherState {
    constants: [u32; 4],
    key: [u32; 8],
    counter: [u32; 2],
    nonce: [u32; 2],
}

#[inline(always)]
fn le_words<const N: usize>(bytes: &[u8]) -> [u32; N] {
    let mut words = [0u32; N];
    for (w, c) in words.iter_mut().zip(bytes.chunks_exact(4)) {
        *w = u32::from_le_bytes([c[0], c[1], c[2], c[3]]);
    }
    words
}

impl CipherState {
    /// Creates a state positioned at block 0.
    ///
    /// `key` must be exactly 32 bytes and `nonce` exactly 8 bytes.
    pub fn new(key: &[u8], nonce: &[u8]) -> Result<Self, CipherError> {
        Self::with_counter(key, nonce, 0)
    }

    /// Creates a state positioned at an arbitrary block, e.g. to resume a
    /// stream at byte offset `counter * 64`.
    pub fn with_counter(key: &[u8], nonce: &[u8], counter: u64) -> Result<Self, CipherError> {
        if key.len() != KEY_LEN {
            return Err(CipherError::InvalidKeyLength(key.len()));
        }
        if nonce.len() != NONCE_LEN {
            return Err(CipherError::InvalidNonceLength(nonce.len()));
        }
        trace!("cipher state initialised at block {}", counter);
        Ok(Self {
            constants: CONSTANTS,
            key: le_words(key),
            counter: [counter as u32, (counter >> 32) as u32],
            nonce: le_words(nonce),
        })
    }

    /// Index of the next block to be generated.
    #[inline]
    pub fn counter(&self) -> u64 {
        (u64::from(self.counter[1]) << 32) | u64::from(self.counter[0])
    }

    /// The counter as it appears in the block input: `[low, high]`.
    #[inline]
    pub fn counter_words(&self) -> [u32; 2] {
        self.counter
    }

    /// How many more blocks can be produced before the counter is exhausted.
    #[inline]
    pub fn remaining_blocks(&self) -> u64 {
        u64::MAX - self.counter()
    }

    /// Fails with [`CipherError::CounterExhausted`] unless `blocks` more
    /// blocks can be generated.
    pub(crate) fn ensure_capacity(&self, blocks: u64) -> Result<(), CipherError> {
        if blocks > self.remaining_blocks() {
            return Err(CipherError::CounterExhausted);
        }
        Ok(())
    }

    fn input_block(&self) -> [u32; BLOCK_WORDS] {
        let mut input = [0u32; BLOCK_WORDS];
        input[..4].copy_from_slice(&self.constants);
        input[4..12].copy_from_slice(&self.key);
        input[12..14].copy_from_slice(&self.counter);
        input[14..].copy_from_slice(&self.nonce);
        input
    }

    /// Low word first, carrying into the high word. Leaves the counter
    /// untouched when the high word has nowhere left to go.
    fn advance_counter(&mut self) -> Result<(), CipherError> {
        let (low, carry) = self.counter[0].overflowing_add(1);
        if carry {
            let high = self.counter[1]
                .checked_add(1)
                .ok_or(CipherError::CounterExhausted)?;
            debug!("block counter low word wrapped, high word now {}", high);
            self.counter[1] = high;
        }
        self.counter[0] = low;
        Ok(())
    }

    /// Produces the keystream block for the current counter and advances
    /// the counter by one.
    pub fn next_block(&mut self) -> Result<[u8; BLOCK_LEN], CipherError> {
        let mut input = self.input_block();
        if let Err(e) = self.advance_counter() {
            input.zeroize();
            return Err(e);
        }
        let mut words = block::transform(&input);
        input.zeroize();

        let mut out = [0u8; BLOCK_LEN];
        for (chunk, word) in out.chunks_exact_mut(4).zip(words.iter()) {
            chunk.copy_from_slice(&word.to_le_bytes());
        }
        words.zeroize();
        Ok(out)
    }
}

impl Drop for CipherState {
    fn drop(&mut self) {
        self.key.zeroize();
        self.nonce.zeroize();
        self.counter.zeroize();
    }
}

impl fmt::Debug for CipherState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CipherState")
            .field("counter", &self.counter())
            .field("nonce", &self.nonce)
            .finish_non_exhaustive()
    }
}
