/*
 * Copyright (c) 2025 sh0rch <sh0rch@iwl.dev>
 * SPDX-License-Identifier: MIT
 */

use crate::cipher::CipherError;
use crate::config::ConfigError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Top-level error for the file tool. I/O errors are passed through as-is.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Cipher(#[from] CipherError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("output file {} already exists (use --force to overwrite)", .0.display())]
    OutputExists(PathBuf),
    #[error("input and output refer to the same file: {}", .0.display())]
    SameFile(PathBuf),
}

pub type Result<T> = std::result::Result<T, Error>;
