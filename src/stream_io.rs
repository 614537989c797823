/*
 * Copyright (c) 2025 sh0rch <sh0rch@iwl.dev>
 *
 * This file is part of chacha_file.
 *
 * Licensed under the MIT License. See LICENSE file in the project root for full license information.
 */

//! # Stream and file driver
//!
//! Pulls chunks from a reader, runs them through one [`StreamCipher`] and
//! writes the result out. The same cipher is reused for the whole stream, so
//! the chunk size does not have to be a multiple of the 64-byte block.
//!
//! Output has no header and no tag; running the same key and nonce over the
//! ciphertext gives back the plaintext.

use crate::cipher::StreamCipher;
use crate::config::CipherConfig;
use crate::error::{Error, Result};
use log::{debug, info, trace, warn};
use std::ffi::OsString;
use std::fmt;
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use zeroize::Zeroize;

/// Suffix appended to the input name when no output path is given.
pub const OUTPUT_SUFFIX: &str = ".chacha";

const MIB: f64 = 1024.0 * 1024.0;

/// Bytes processed and wall time spent doing it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Throughput {
    pub bytes: u64,
    pub elapsed: Duration,
}

impl Throughput {
    pub fn megabytes(&self) -> f64 {
        self.bytes as f64 / MIB
    }

    /// MB/s; 0 when no measurable time elapsed.
    pub fn mb_per_sec(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.megabytes() / secs
        } else {
            0.0
        }
    }
}

impl fmt::Display for Throughput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Time taken {:.2} seconds, file length {:.2} MB",
            self.elapsed.as_secs_f64(),
            self.megabytes()
        )?;
        write!(f, "Average time {:.2} MB/s", self.mb_per_sec())
    }
}

/// `<input>.chacha`
pub fn default_output_path(input: &Path) -> PathBuf {
    let mut name = OsString::from(input.as_os_str());
    name.push(OUTPUT_SUFFIX);
    PathBuf::from(name)
}

/// Runs `cipher` over everything `reader` yields and writes it to `writer`.
///
/// Reads at most `chunk_size` bytes at a time. `Interrupted` reads are
/// retried; every other I/O error is returned unchanged.
pub fn cipher_stream<R: Read, W: Write>(
    reader: &mut R,
    writer: &mut W,
    cipher: &mut StreamCipher,
    chunk_size: usize,
) -> Result<Throughput> {
    let mut buf = vec![0u8; chunk_size.max(1)];
    let start = Instant::now();
    let mut total: u64 = 0;

    let outcome = loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break Ok(()),
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => break Err(Error::from(e)),
        };
        if let Err(e) = cipher.apply_keystream(&mut buf[..n]) {
            break Err(e.into());
        }
        if let Err(e) = writer.write_all(&buf[..n]) {
            break Err(e.into());
        }
        total += n as u64;
        trace!("chunk of {} bytes, counter {}", n, cipher.counter());
    };
    buf.zeroize();
    outcome?;

    writer.flush()?;
    Ok(Throughput {
        bytes: total,
        elapsed: start.elapsed(),
    })
}

/// Encrypts (or decrypts) the file at `input` into `output`.
///
/// An existing `output` is only replaced when `force` is set, and never when
/// it is the input itself.
pub fn cipher_file(
    input: &Path,
    output: &Path,
    config: &CipherConfig,
    force: bool,
) -> Result<Throughput> {
    if output.exists() {
        // hard links and symlinks to the input count as the input
        if same_file::is_same_file(input, output)? {
            return Err(Error::SameFile(output.to_path_buf()));
        }
        if !force {
            return Err(Error::OutputExists(output.to_path_buf()));
        }
        warn!("overwriting {}", output.display());
    }

    let mut reader = File::open(input)?;
    // unbuffered: each chunk is written as one call, and no plaintext is
    // left behind in a writer buffer
    let mut writer = File::create(output)?;
    let mut cipher = config.cipher()?;
    debug!("chunk size {} bytes", config.chunk_size);
    info!("{} -> {}", input.display(), output.display());

    let stats = cipher_stream(&mut reader, &mut writer, &mut cipher, config.chunk_size)?;
    info!(
        "processed {} bytes in {:.3}s ({} blocks)",
        stats.bytes,
        stats.elapsed.as_secs_f64(),
        cipher.counter()
    );
    Ok(stats)
}
