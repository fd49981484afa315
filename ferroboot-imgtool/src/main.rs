// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Ferroboot Contributors

//! Firmware packaging tool for ferroboot.
//!
//! Usage:
//!   ferroboot-imgtool package firmware.bin update.blob \
//!       --aes-key aes.key --sign-key ecdsa.key --version 2
//!   ferroboot-imgtool inspect update.blob --public-key ecdsa.pub

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let args = cli::Cli::parse();
    cli::run(args)
}
