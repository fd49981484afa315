// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Ferroboot Contributors

//! Firmware image validation: footer lookup, payload hashing, signature
//! verification.

use crate::crypto::{CryptoOps, AES_BLOCK};
use crate::error::{CryptoError, ImageError};
use crate::footer::{find_footer_addr, FirmwareFooter, FOOTER_LEN, FOOTER_MAGIC};
use crate::platform::Platform;

const HASH_CHUNK: usize = 256;

/// Validate the integrity and authenticity of the image staged in a slot.
///
/// The hash input is exactly the payload (`IV ‖ ciphertext`); the footer is
/// excluded. Returns the parsed footer on success so callers can pick up
/// the payload size and version without re-reading flash.
pub fn validate<P: Platform, C: CryptoOps>(
    platform: &P,
    crypto: &mut C,
    slot_base: u32,
    slot_size: u32,
    pub_key: &[u8; 64],
) -> Result<FirmwareFooter, ImageError> {
    let footer_addr =
        find_footer_addr(platform, slot_base, slot_size).ok_or(ImageError::FooterNotFound)?;

    let mut raw = [0u8; FOOTER_LEN];
    platform.flash_read(footer_addr, &mut raw);
    let footer = FirmwareFooter::from_bytes(&raw);

    if footer.magic != FOOTER_MAGIC {
        return Err(ImageError::FooterBad);
    }
    if footer.size > slot_size {
        return Err(ImageError::ImageSizeBad);
    }
    // The payload must carry at least the IV and align with the cipher
    if (footer.size as usize) < AES_BLOCK || footer.size as usize % AES_BLOCK != 0 {
        return Err(ImageError::ImageSizeBad);
    }

    let digest =
        hash_payload(platform, crypto, slot_base, footer.size).map_err(|_| ImageError::HashFail)?;

    crypto
        .ecdsa_p256_verify(pub_key, &digest, &footer.signature)
        .map_err(|_| ImageError::SigFail)?;

    Ok(footer)
}

/// SHA-256 over `size` bytes starting at `base`, read in small chunks so
/// the digest never needs the whole payload in RAM.
fn hash_payload<P: Platform, C: CryptoOps>(
    platform: &P,
    crypto: &mut C,
    base: u32,
    size: u32,
) -> Result<[u8; 32], CryptoError> {
    crypto.sha256_begin()?;

    let mut chunk = [0u8; HASH_CHUNK];
    let mut remaining = size as usize;
    let mut addr = base;
    while remaining > 0 {
        let n = remaining.min(HASH_CHUNK);
        platform.flash_read(addr, &mut chunk[..n]);
        crypto.sha256_update(&chunk[..n])?;
        addr += n as u32;
        remaining -= n;
    }

    let mut digest = [0u8; 32];
    crypto.sha256_finish(&mut digest)?;
    Ok(digest)
}
