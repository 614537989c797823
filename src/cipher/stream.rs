/*
 * Copyright (c) 2025 sh0rch <sh0rch@iwl.dev>
 * SPDX-License-Identifier: MIT
 */

//! Keystream application over byte streams.
//!
//! A [`StreamCipher`] keeps the unused tail of its last keystream block, so a
//! stream may be fed in chunks of any size and still produce exactly the same
//! output as a single call over the concatenated input.

use super::{CipherError, CipherState, BLOCK_LEN};
use std::fmt;
use zeroize::Zeroize;

pub struct StreamCipher {
    state: CipherState,
    keystream: [u8; BLOCK_LEN],
    /// Next unused byte of `keystream`; `BLOCK_LEN` when nothing is buffered.
    offset: usize,
}

/// XORs one full block word by word, little-endian.
#[inline(always)]
fn xor_block(data: &mut [u8], keystream: &[u8; BLOCK_LEN]) {
    for (d, k) in data.chunks_exact_mut(4).zip(keystream.chunks_exact(4)) {
        let word = u32::from_le_bytes([d[0], d[1], d[2], d[3]])
            ^ u32::from_le_bytes([k[0], k[1], k[2], k[3]]);
        d.copy_from_slice(&word.to_le_bytes());
    }
}

impl StreamCipher {
    pub fn new(key: &[u8], nonce: &[u8]) -> Result<Self, CipherError> {
        CipherState::new(key, nonce).map(Self::from_state)
    }

    pub fn with_counter(key: &[u8], nonce: &[u8], counter: u64) -> Result<Self, CipherError> {
        CipherState::with_counter(key, nonce, counter).map(Self::from_state)
    }

    pub fn from_state(state: CipherState) -> Self {
        Self {
            state,
            keystream: [0u8; BLOCK_LEN],
            offset: BLOCK_LEN,
        }
    }

    pub fn state(&self) -> &CipherState {
        &self.state
    }

    /// Block counter of the underlying state. A partially used block has
    /// already been counted.
    #[inline]
    pub fn counter(&self) -> u64 {
        self.state.counter()
    }

    /// Keystream bytes left over from the last partial block.
    #[inline]
    pub fn buffered(&self) -> usize {
        BLOCK_LEN - self.offset
    }

    fn xor_buffered(&mut self, data: &mut [u8]) {
        for (b, k) in data.iter_mut().zip(self.keystream[self.offset..].iter()) {
            *b ^= *k;
        }
        self.offset += data.len();
        if self.offset == BLOCK_LEN {
            self.keystream.zeroize();
        }
    }

    /// Encrypts or decrypts `data` in place.
    ///
    /// Either the whole slice is processed or, when the counter cannot cover
    /// it, nothing is touched and [`CipherError::CounterExhausted`] is returned.
    pub fn apply_keystream(&mut self, data: &mut [u8]) -> Result<(), CipherError> {
        if data.is_empty() {
            return Ok(());
        }
        let head_len = self.buffered().min(data.len());
        let needed = (data.len() - head_len).div_ceil(BLOCK_LEN) as u64;
        self.state.ensure_capacity(needed)?;

        let (head, tail) = data.split_at_mut(head_len);
        self.xor_buffered(head);

        let mut blocks = tail.chunks_exact_mut(BLOCK_LEN);
        for chunk in &mut blocks {
            let mut keystream = self.state.next_block()?;
            xor_block(chunk, &keystream);
            keystream.zeroize();
        }

        let rest = blocks.into_remainder();
        if !rest.is_empty() {
            self.keystream = self.state.next_block()?;
            self.offset = 0;
            self.xor_buffered(rest);
        }
        Ok(())
    }

    /// Returns the encryption (or decryption) of `data`; same length as the input.
    pub fn apply(&mut self, data: &[u8]) -> Result<Vec<u8>, CipherError> {
        let mut out = data.to_vec();
        self.apply_keystream(&mut out)?;
        Ok(out)
    }
}

impl Drop for StreamCipher {
    fn drop(&mut self) {
        self.keystream.zeroize();
    }
}

impl fmt::Debug for StreamCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamCipher")
            .field("state", &self.state)
            .field("buffered", &self.buffered())
            .finish()
    }
}

/// Applies the next `data.len()` keystream bytes of `cipher` to `data`.
pub fn apply(data: &[u8], cipher: &mut StreamCipher) -> Result<Vec<u8>, CipherError> {
    cipher.apply(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, RngCore};

    const KEY: [u8; 32] = [0x42; 32];
    const NONCE: [u8; 8] = [0x24; 8];

    fn fresh() -> StreamCipher {
        StreamCipher::new(&KEY, &NONCE).unwrap()
    }

    /// Only resolves when `T` has no `Zeroize` impl; otherwise the `_`
    /// in `check` calls is ambiguous and the tests stop compiling.
    trait NotZeroize<A> {
        fn check() {}
    }
    impl<T: ?Sized> NotZeroize<()> for T {}
    struct HasZeroize;
    impl<T: ?Sized + Zeroize> NotZeroize<HasZeroize> for T {}

    #[test]
    fn test_live_cipher_cannot_be_wiped() {
        <StreamCipher as NotZeroize<_>>::check();
        <CipherState as NotZeroize<_>>::check();
        <crate::config::CipherConfig as NotZeroize<_>>::check();
    }

    #[test]
    fn test_counter_never_decreases() {
        let mut cipher = fresh();
        let mut last = cipher.counter();
        for len in [0usize, 1, 63, 64, 65, 640, 3, 0, 129] {
            let data = vec![0x77u8; len];
            let out = cipher.apply(&data).unwrap();
            if len >= 16 {
                assert_ne!(out, data);
            }
            assert!(cipher.counter() >= last);
            last = cipher.counter();
        }
        let total: u64 = 1 + 63 + 64 + 65 + 640 + 3 + 129;
        assert_eq!(last, total.div_ceil(BLOCK_LEN as u64));
    }

    #[test]
    fn test_xor_reversible() {
        let data = [0xAAu8; 200];
        let ct = fresh().apply(&data).unwrap();
        assert_ne!(&ct[..], &data[..]);
        let pt = fresh().apply(&ct).unwrap();
        assert_eq!(&pt[..], &data[..]);
    }

    #[test]
    fn test_empty_input_keeps_counter() {
        let mut cipher = fresh();
        assert!(cipher.apply(&[]).unwrap().is_empty());
        assert_eq!(cipher.counter(), 0);
        assert!(apply(&[], &mut cipher).unwrap().is_empty());
        assert_eq!(cipher.counter(), 0);
    }

    #[test]
    fn test_short_input_consumes_one_block() {
        for len in 1..BLOCK_LEN {
            let mut cipher = fresh();
            let out = cipher.apply(&vec![0u8; len]).unwrap();
            assert_eq!(out.len(), len);
            assert_eq!(cipher.counter(), 1, "len {}", len);
        }
    }

    #[test]
    fn test_partial_block_is_prefix_of_full_block() {
        let full = fresh().apply(&[0u8; BLOCK_LEN]).unwrap();
        let part = fresh().apply(&[0u8; 10]).unwrap();
        assert_eq!(&part[..], &full[..10]);
    }

    #[test]
    fn test_counter_per_64_bytes() {
        let mut cipher = fresh();
        cipher.apply(&[0u8; 64 * 3]).unwrap();
        assert_eq!(cipher.counter(), 3);
        cipher.apply(&[0u8; 65]).unwrap();
        assert_eq!(cipher.counter(), 5);
        assert_eq!(cipher.buffered(), 63);
        // served entirely from the buffered tail
        cipher.apply(&[0u8; 63]).unwrap();
        assert_eq!(cipher.counter(), 5);
        assert_eq!(cipher.buffered(), 0);
    }

    #[test]
    fn test_granularity_does_not_change_counter() {
        let mut bytewise = fresh();
        for _ in 0..300 {
            bytewise.apply(&[0u8]).unwrap();
        }
        let mut once = fresh();
        once.apply(&[0u8; 300]).unwrap();
        assert_eq!(bytewise.counter(), once.counter());
        assert_eq!(once.counter(), 5);
    }

    #[test]
    fn test_chunk_transparency_random_partitions() {
        let mut rng = rand::rng();
        for _ in 0..50 {
            let len = rng.random_range(0..1000);
            let mut data = vec![0u8; len];
            rng.fill_bytes(&mut data);

            let expected = fresh().apply(&data).unwrap();

            let mut cipher = fresh();
            let mut got = Vec::with_capacity(len);
            let mut rest = &data[..];
            while !rest.is_empty() {
                let n = rng.random_range(0..=rest.len().min(150));
                let (chunk, tail) = rest.split_at(n);
                got.extend(apply(chunk, &mut cipher).unwrap());
                rest = tail;
            }
            assert_eq!(got, expected);
            assert_eq!(cipher.counter(), (len as u64).div_ceil(BLOCK_LEN as u64));
        }
    }

    #[test]
    fn test_in_place_matches_copying() {
        let data: Vec<u8> = (0..=255u8).cycle().take(777).collect();
        let copied = fresh().apply(&data).unwrap();
        let mut in_place = data.clone();
        fresh().apply_keystream(&mut in_place).unwrap();
        assert_eq!(copied, in_place);
    }

    #[test]
    fn test_exhaustion_leaves_data_and_counter_alone() {
        let mut cipher = StreamCipher::with_counter(&KEY, &NONCE, u64::MAX - 2).unwrap();
        let mut data = [0x5Au8; BLOCK_LEN * 3];
        assert_eq!(
            cipher.apply_keystream(&mut data).unwrap_err(),
            CipherError::CounterExhausted
        );
        assert!(data.iter().all(|b| *b == 0x5A));
        assert_eq!(cipher.counter(), u64::MAX - 2);

        // two blocks still fit
        cipher.apply_keystream(&mut data[..BLOCK_LEN + 1]).unwrap();
        assert_eq!(cipher.counter(), u64::MAX);
        // the buffered tail is still usable, fresh blocks are not
        cipher.apply_keystream(&mut data[..BLOCK_LEN - 1]).unwrap();
        assert_eq!(
            cipher.apply(&[0u8; 1]).unwrap_err(),
            CipherError::CounterExhausted
        );
    }

    #[test]
    fn test_rejects_bad_lengths() {
        assert_eq!(
            StreamCipher::new(&[0u8; 33], &NONCE).unwrap_err(),
            CipherError::InvalidKeyLength(33)
        );
        assert_eq!(
            StreamCipher::new(&KEY, &[0u8; 7]).unwrap_err(),
            CipherError::InvalidNonceLength(7)
        );
    }
}
