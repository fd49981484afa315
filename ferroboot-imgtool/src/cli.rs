// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Ferroboot Contributors

//! Command-line interface definitions.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands;

/// Command-line arguments.
#[derive(Parser)]
#[command(name = "ferroboot-imgtool")]
#[command(about = "Firmware packaging tool for ferroboot")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
pub enum Commands {
    /// Encrypt and sign a firmware binary into a staged-update blob
    Package {
        /// Plaintext firmware binary
        #[arg(value_name = "FIRMWARE")]
        firmware: PathBuf,

        /// Output blob (what the application writes into the Download slot)
        #[arg(value_name = "OUTPUT")]
        output: PathBuf,

        /// AES-128 key file (16 raw bytes)
        #[arg(long)]
        aes_key: PathBuf,

        /// ECDSA P-256 signing key file (32 raw bytes, big-endian scalar)
        #[arg(long)]
        sign_key: PathBuf,

        /// Firmware version number recorded in the footer
        #[arg(short, long, default_value = "1")]
        version: u32,

        /// Target slot size the blob must fit into
        #[arg(long, default_value_t = 0x4_0000)]
        slot_size: u32,
    },

    /// Parse a blob's footer and re-verify its hash and signature
    Inspect {
        /// Blob file (or a raw dump of the Download slot)
        #[arg(value_name = "BLOB")]
        blob: PathBuf,

        /// ECDSA P-256 public key file (64 raw bytes, x ‖ y)
        #[arg(long)]
        public_key: PathBuf,
    },
}

/// Execute the parsed CLI command.
pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Package {
            firmware,
            output,
            aes_key,
            sign_key,
            version,
            slot_size,
        } => commands::package(&firmware, &output, &aes_key, &sign_key, version, slot_size),
        Commands::Inspect { blob, public_key } => commands::inspect(&blob, &public_key),
    }
}
