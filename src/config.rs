/*
 * Copyright (c) 2025 sh0rch <sh0rch@iwl.dev>
 * SPDX-License-Identifier: MIT
 *
 * This module provides configuration parsing for the chacha_file tool.
 * It turns key, nonce and chunk size strings (from flags, environment or an
 * interactive prompt) into a validated CipherConfig.
 */

use crate::cipher::{CipherError, StreamCipher, KEY_LEN, NONCE_LEN};
use std::fmt;
use std::io::{BufRead, Write};
use thiserror::Error;
use zeroize::Zeroize;

/// Bytes read from the input per iteration unless configured otherwise.
pub const DEFAULT_CHUNK_SIZE: usize = 12800;

pub const KEY_ENV: &str = "CHACHA_FILE_KEY";
pub const NONCE_ENV: &str = "CHACHA_FILE_NONCE";
pub const CHUNK_SIZE_ENV: &str = "CHACHA_FILE_CHUNK_SIZE";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{what} is not valid hex: {source}")]
    InvalidHex {
        what: &'static str,
        #[source]
        source: hex::FromHexError,
    },
    #[error("{what} must be {expected} bytes or {} hex digits, got {got}", .expected * 2)]
    InvalidLength {
        what: &'static str,
        expected: usize,
        got: usize,
    },
    #[error("no {0} supplied")]
    Missing(&'static str),
    #[error("invalid chunk size {0:?}: expected a positive integer")]
    InvalidChunkSize(String),
}

/// Holds everything needed to run the cipher over one stream.
pub struct CipherConfig {
    /// 32-byte key.
    pub key: [u8; KEY_LEN],
    /// 8-byte nonce.
    pub nonce: [u8; NONCE_LEN],
    /// Read size used by the stream loop; any positive value works.
    pub chunk_size: usize,
}

impl CipherConfig {
    pub fn new(
        key: [u8; KEY_LEN],
        nonce: [u8; NONCE_LEN],
        chunk_size: usize,
    ) -> Result<Self, ConfigError> {
        if chunk_size == 0 {
            return Err(ConfigError::InvalidChunkSize(chunk_size.to_string()));
        }
        Ok(Self {
            key,
            nonce,
            chunk_size,
        })
    }

    /// A cipher positioned at block 0 for this key and nonce.
    pub fn cipher(&self) -> Result<StreamCipher, CipherError> {
        StreamCipher::new(&self.key, &self.nonce)
    }
}

impl Drop for CipherConfig {
    fn drop(&mut self) {
        self.key.zeroize();
        self.nonce.zeroize();
    }
}

impl fmt::Debug for CipherConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CipherConfig")
            .field("key", &"<redacted>")
            .field("nonce", &hex::encode(self.nonce))
            .field("chunk_size", &self.chunk_size)
            .finish()
    }
}

/// Accepts either exactly `N` raw bytes or exactly `2 * N` hex digits.
fn parse_fixed<const N: usize>(s: &str, what: &'static str) -> Result<[u8; N], ConfigError> {
    let s = s.trim_end_matches(['\r', '\n']);
    let mut out = [0u8; N];
    if s.len() == N * 2 {
        hex::decode_to_slice(s, &mut out)
            .map_err(|source| ConfigError::InvalidHex { what, source })?;
    } else if s.len() == N {
        out.copy_from_slice(s.as_bytes());
    } else {
        return Err(ConfigError::InvalidLength {
            what,
            expected: N,
            got: s.len(),
        });
    }
    Ok(out)
}

/// Parses a key given as 32 raw bytes or 64 hex digits.
pub fn parse_key(s: &str) -> Result<[u8; KEY_LEN], ConfigError> {
    parse_fixed(s, "key")
}

/// Parses a nonce given as 8 raw bytes or 16 hex digits.
pub fn parse_nonce(s: &str) -> Result<[u8; NONCE_LEN], ConfigError> {
    parse_fixed(s, "nonce")
}

pub fn parse_chunk_size(s: &str) -> Result<usize, ConfigError> {
    match s.trim().parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::InvalidChunkSize(s.to_string())),
    }
}

/// Writes `label` to `prompt` and reads one line from `input`.
fn prompt_line<R: BufRead, W: Write>(
    label: &str,
    what: &'static str,
    input: &mut R,
    prompt: &mut W,
) -> crate::Result<String> {
    writeln!(prompt, "{}", label)?;
    prompt.flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err(ConfigError::Missing(what).into());
    }
    let len = line.trim_end_matches(['\r', '\n']).len();
    line.truncate(len);
    Ok(line)
}

/// Builds the config from already-known values, prompting on `input` for
/// whatever is missing. The caller's key and nonce strings are wiped.
pub fn resolve<R: BufRead, W: Write>(
    key: Option<String>,
    nonce: Option<String>,
    chunk_size: usize,
    input: &mut R,
    prompt: &mut W,
) -> crate::Result<CipherConfig> {
    let mut key = match key {
        Some(k) => k,
        None => prompt_line(
            "Insert key (32 bytes or 64 hex digits): ",
            "key",
            input,
            prompt,
        )?,
    };
    let parsed = parse_key(&key);
    key.zeroize();
    let key = parsed?;

    let mut nonce = match nonce {
        Some(n) => n,
        None => prompt_line(
            "Insert nonce (8 bytes or 16 hex digits): ",
            "nonce",
            input,
            prompt,
        )?,
    };
    let parsed = parse_nonce(&nonce);
    nonce.zeroize();
    let nonce = parsed?;

    Ok(CipherConfig::new(key, nonce, chunk_size)?)
}
