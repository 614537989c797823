/*
 * Copyright (c) 2025 sh0rch <sh0rch@iwl.dev>
 * SPDX-License-Identifier: MIT
 */

//! # chacha_file
//!
//! ChaCha20 (64-bit nonce, 64-bit block counter) stream cipher engine and the
//! plumbing to run it over files.
//!
//! ```
//! use chacha_file::cipher::StreamCipher;
//!
//! let key = [0x42u8; 32];
//! let nonce = [0x24u8; 8];
//! let ct = StreamCipher::new(&key, &nonce)?.apply(b"attack at dawn")?;
//! let pt = StreamCipher::new(&key, &nonce)?.apply(&ct)?;
//! assert_eq!(&pt, b"attack at dawn");
//! # Ok::<(), chacha_file::cipher::CipherError>(())
//! ```

pub mod cipher;
pub mod config;
pub mod error;
pub mod stream_io;

pub use error::{Error, Result};
