// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Ferroboot Contributors

//! Command implementations: package (encrypt + sign) and inspect.

use std::fs;
use std::path::Path;

use aes::cipher::generic_array::GenericArray;
use aes::cipher::{BlockEncrypt, KeyInit};
use aes::Aes128;
use anyhow::{bail, Context, Result};
use p256::ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};
use p256::ecdsa::{Signature, SigningKey, VerifyingKey};
use rand::RngCore;
use sha2::{Digest, Sha256};

use ferroboot_core::footer::{FirmwareFooter, FOOTER_LEN, FOOTER_MAGIC};

const AES_BLOCK: usize = 16;

/// Encrypt and sign a firmware binary into a staged-update blob.
pub fn package(
    firmware: &Path,
    output: &Path,
    aes_key: &Path,
    sign_key: &Path,
    version: u32,
    slot_size: u32,
) -> Result<()> {
    let mut plaintext = fs::read(firmware)
        .with_context(|| format!("Failed to read {}", firmware.display()))?;
    if plaintext.is_empty() {
        bail!("{} is empty", firmware.display());
    }

    let key = read_key::<16>(aes_key)?;
    let signing_key = SigningKey::from_slice(&read_key::<32>(sign_key)?)
        .context("Invalid ECDSA signing key")?;

    // Pad to the cipher block with erased-flash filler
    let unpadded = plaintext.len();
    while plaintext.len() % AES_BLOCK != 0 {
        plaintext.push(0xFF);
    }

    let mut iv = [0u8; AES_BLOCK];
    rand::rngs::OsRng.fill_bytes(&mut iv);

    let mut payload = iv.to_vec();
    payload.extend_from_slice(&cbc_encrypt(&key, &iv, &plaintext));

    let digest = Sha256::digest(&payload);
    let signature: Signature = signing_key
        .sign_prehash(&digest)
        .context("Signing failed")?;
    let mut sig64 = [0u8; 64];
    sig64.copy_from_slice(&signature.to_bytes());

    let footer = FirmwareFooter {
        version,
        size: payload.len() as u32,
        signature: sig64,
        magic: FOOTER_MAGIC,
    };

    let mut blob = payload;
    blob.extend_from_slice(&footer.to_bytes());

    if blob.len() as u32 > slot_size {
        bail!(
            "Blob ({} bytes) does not fit the {} byte slot",
            blob.len(),
            slot_size
        );
    }

    fs::write(output, &blob).with_context(|| format!("Failed to write {}", output.display()))?;

    println!("Firmware: {} ({} bytes)", firmware.display(), unpadded);
    println!("Payload:  {} bytes (IV + ciphertext)", blob.len() - FOOTER_LEN);
    println!("Version:  {}", version);
    println!("Output:   {} ({} bytes)", output.display(), blob.len());
    Ok(())
}

/// Parse a blob's footer and re-verify hash and signature.
pub fn inspect(blob_path: &Path, public_key: &Path) -> Result<()> {
    let blob =
        fs::read(blob_path).with_context(|| format!("Failed to read {}", blob_path.display()))?;

    let pub_xy = read_key::<64>(public_key)?;
    let mut sec1 = [0u8; 65];
    sec1[0] = 0x04;
    sec1[1..].copy_from_slice(&pub_xy);
    let verifying_key =
        VerifyingKey::from_sec1_bytes(&sec1).context("Invalid ECDSA public key")?;

    let footer_base = find_footer(&blob).context("No footer magic in blob")?;
    let raw: [u8; FOOTER_LEN] = blob[footer_base..footer_base + FOOTER_LEN]
        .try_into()
        .context("Truncated footer")?;
    let footer = FirmwareFooter::from_bytes(&raw);

    println!("Footer at offset 0x{footer_base:X}:");
    println!("  Version: {}", footer.version);
    println!("  Payload: {} bytes", footer.size);

    if footer.size as usize > footer_base {
        bail!("Footer declares a payload larger than the data before it");
    }

    let digest = Sha256::digest(&blob[..footer.size as usize]);
    let signature =
        Signature::from_slice(&footer.signature).context("Malformed signature in footer")?;

    match verifying_key.verify_prehash(&digest, &signature) {
        Ok(()) => {
            println!("  Signature: OK");
            Ok(())
        }
        Err(_) => bail!("Signature verification FAILED"),
    }
}

/// Backward scan for the footer magic, mirroring what the bootloader does
/// over the Download slot.
fn find_footer(blob: &[u8]) -> Option<usize> {
    if blob.len() < FOOTER_LEN {
        return None;
    }
    let mut word_at = (blob.len() - 4) & !3;
    loop {
        let word = u32::from_le_bytes(blob[word_at..word_at + 4].try_into().ok()?);
        if word == FOOTER_MAGIC && word_at + 4 >= FOOTER_LEN {
            return Some(word_at + 4 - FOOTER_LEN);
        }
        if word_at < 4 {
            return None;
        }
        word_at -= 4;
    }
}

fn read_key<const N: usize>(path: &Path) -> Result<[u8; N]> {
    let raw = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let key: [u8; N] = raw
        .as_slice()
        .try_into()
        .map_err(|_| anyhow::anyhow!("{} must be exactly {N} bytes", path.display()))?;
    Ok(key)
}

fn cbc_encrypt(key: &[u8; 16], iv: &[u8; AES_BLOCK], plaintext: &[u8]) -> Vec<u8> {
    let cipher = Aes128::new(GenericArray::from_slice(key));
    let mut prev = *iv;
    let mut out = Vec::with_capacity(plaintext.len());
    for chunk in plaintext.chunks(AES_BLOCK) {
        let mut block = [0u8; AES_BLOCK];
        block.copy_from_slice(chunk);
        for (b, p) in block.iter_mut().zip(prev.iter()) {
            *b ^= p;
        }
        let mut ga = GenericArray::clone_from_slice(&block);
        cipher.encrypt_block(&mut ga);
        out.extend_from_slice(&ga);
        prev.copy_from_slice(&ga);
    }
    out
}
