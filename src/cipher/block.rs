/*
 * Copyright (c) 2025 sh0rch <sh0rch@iwl.dev>
 * SPDX-License-Identifier: MIT
 */

//! The ChaCha20 block function: 20 rounds over sixteen 32-bit words
//! followed by the feed-forward addition of the input.

use super::{BLOCK_WORDS, DOUBLE_ROUNDS};
use zeroize::Zeroize;

#[inline(always)]
fn quarter_round(state: &mut [u32; BLOCK_WORDS], a: usize, b: usize, c: usize, d: usize) {
    state[a] = state[a].wrapping_add(state[b]);
    state[d] ^= state[a];
    state[d] = state[d].rotate_left(16);
    state[c] = state[c].wrapping_add(state[d]);
    state[b] ^= state[c];
    state[b] = state[b].rotate_left(12);
    state[a] = state[a].wrapping_add(state[b]);
    state[d] ^= state[a];
    state[d] = state[d].rotate_left(8);
    state[c] = state[c].wrapping_add(state[d]);
    state[b] ^= state[c];
    state[b] = state[b].rotate_left(7);
}

/// One column round followed by one diagonal round.
#[inline(always)]
fn double_round(state: &mut [u32; BLOCK_WORDS]) {
    // columns
    quarter_round(state, 0, 4, 8, 12);
    quarter_round(state, 1, 5, 9, 13);
    quarter_round(state, 2, 6, 10, 14);
    quarter_round(state, 3, 7, 11, 15);
    // diagonals
    quarter_round(state, 0, 5, 10, 15);
    quarter_round(state, 1, 6, 11, 12);
    quarter_round(state, 2, 7, 8, 13);
    quarter_round(state, 3, 4, 9, 14);
}

/// Maps a 16-word input block to its 16-word keystream block.
///
/// Pure and allocation-free. The intermediate working copy is wiped before
/// returning; only the finished output leaves this function.
pub fn transform(initial: &[u32; BLOCK_WORDS]) -> [u32; BLOCK_WORDS] {
    let mut working = *initial;
    for _ in 0..DOUBLE_ROUNDS {
        double_round(&mut working);
    }

    let mut out = [0u32; BLOCK_WORDS];
    for ((o, w), i) in out.iter_mut().zip(working.iter()).zip(initial.iter()) {
        *o = w.wrapping_add(*i);
    }
    working.zeroize();
    out
}
