// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Ferroboot Contributors

//! Key material baked into the bootloader binary.
//!
//! These are DEVELOPMENT keys. A production build replaces both constants
//! at provisioning time; the AES key must match the one given to
//! ferroboot-imgtool, and the public key must be the counterpart of the
//! signing key.

use ferroboot_core::KeySet;

/// AES-128 symmetric secret shared with the packaging tool.
const AES_SECRET_KEY: [u8; 16] = [
    0x2B, 0x7E, 0x15, 0x16, 0x28, 0xAE, 0xD2, 0xA6, 0xAB, 0xF7, 0x15, 0x88, 0x09, 0xCF, 0x4F,
    0x3C,
];

/// ECDSA P-256 public key, uncompressed `x ‖ y`.
///
/// This is the curve generator point (the public key of scalar 1), which
/// makes it usable only for bring-up.
const ECDSA_PUBLIC_KEY_XY: [u8; 64] = [
    // x
    0x6B, 0x17, 0xD1, 0xF2, 0xE1, 0x2C, 0x42, 0x47, 0xF8, 0xBC, 0xE6, 0xE5, 0x63, 0xA4, 0x40,
    0xF2, 0x77, 0x03, 0x7D, 0x81, 0x2D, 0xEB, 0x33, 0xA0, 0xF4, 0xA1, 0x39, 0x45, 0xD8, 0x98,
    0xC2, 0x96,
    // y
    0x4F, 0xE3, 0x42, 0xE2, 0xFE, 0x1A, 0x7F, 0x9B, 0x8E, 0xE7, 0xEB, 0x4A, 0x7C, 0x0F, 0x9E,
    0x16, 0x2B, 0xCE, 0x33, 0x57, 0x6B, 0x31, 0x5E, 0xCE, 0xCB, 0xB6, 0x40, 0x68, 0x37, 0xBF,
    0x51, 0xF5,
];

pub fn key_set() -> KeySet {
    KeySet {
        aes: AES_SECRET_KEY,
        ecdsa_pub: ECDSA_PUBLIC_KEY_XY,
    }
}
