/*
 * Copyright (c) 2025 sh0rch <sh0rch@iwl.dev>
 * SPDX-License-Identifier: MIT
 */

use chacha_file::config::{self, DEFAULT_CHUNK_SIZE};
use chacha_file::stream_io;
use clap::Parser;
use std::io;
use std::path::PathBuf;

/// Encrypt or decrypt a file with ChaCha20.
///
/// Running the tool again on its own output with the same key and nonce
/// restores the original file. Missing key or nonce values are prompted for.
#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Args {
    /// File to process.
    pub input: PathBuf,

    /// Destination file [default: <INPUT>.chacha]
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// 32-byte key, raw or as 64 hex digits.
    #[arg(short, long, env = config::KEY_ENV, hide_env_values = true)]
    pub key: Option<String>,

    /// 8-byte nonce, raw or as 16 hex digits.
    #[arg(short, long, env = config::NONCE_ENV, hide_env_values = true)]
    pub nonce: Option<String>,

    /// Bytes read per iteration.
    #[arg(
        short,
        long,
        env = config::CHUNK_SIZE_ENV,
        default_value_t = DEFAULT_CHUNK_SIZE,
        value_parser = config::parse_chunk_size
    )]
    pub chunk_size: usize,

    /// Replace the output file if it already exists.
    #[arg(short, long)]
    pub force: bool,

    /// Do not print the timing report.
    #[arg(short, long)]
    pub quiet: bool,
}

pub fn run(args: Args) -> chacha_file::Result<()> {
    let Args {
        input,
        output,
        key,
        nonce,
        chunk_size,
        force,
        quiet,
    } = args;

    let stdin = io::stdin();
    let mut prompt = io::stdout();
    let config = config::resolve(key, nonce, chunk_size, &mut stdin.lock(), &mut prompt)?;

    let output = output.unwrap_or_else(|| stream_io::default_output_path(&input));
    let stats = stream_io::cipher_file(&input, &output, &config, force)?;
    if !quiet {
        println!("{}", stats);
    }
    Ok(())
}
