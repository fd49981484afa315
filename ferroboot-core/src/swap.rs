// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Ferroboot Contributors

//! A/B/scratch swap engine.
//!
//! Four data-movement primitives (raw copy, CBC update decrypt, ECB backup
//! encrypt/decrypt) compose the Update and Rollback transitions. All data
//! moves in 16-byte units aligned with the AES block, and every erase
//! precedes the writes to the same region within a single primitive.
//!
//! There is no journal. A power loss mid-transition leaves the device in
//! one of a small set of states the next boot recovers from: before the
//! backup step Active is intact and simply boots; after it, Active may be
//! damaged but the orchestrator auto-provisions from Download whenever
//! Download still holds a validly signed image. The rollback mid-swap
//! window (Download holds an unsigned backup) is not recoverable.

use crate::bootlog;
use crate::config::{self, BootConfig, SystemStatus};
use crate::crypto::{CryptoOps, KeySet, AES_BLOCK};
use crate::error::{Error, FlashError, ImageError};
use crate::image;
use crate::platform::{read_u32, MemoryMap, Platform};

/// Erase `[dst, dst + len)`, then program a byte-exact copy of
/// `[src, src + len)`. Installs a plaintext image from Scratch into Active.
pub fn raw_copy<P: Platform>(
    platform: &mut P,
    src: u32,
    dst: u32,
    len: u32,
) -> Result<(), Error> {
    if len as usize % AES_BLOCK != 0 {
        return Err(Error::Flash(FlashError::Param));
    }

    platform.flash_erase(dst, len)?;

    let mut block = [0u8; AES_BLOCK];
    let mut offset = 0u32;
    while offset < len {
        platform.flash_read(src + offset, &mut block);
        platform.flash_write(dst + offset, &block)?;
        offset += AES_BLOCK as u32;
    }
    Ok(())
}

/// AES-128-CBC-decrypt a staged update.
///
/// `src` holds `IV (16 bytes) ‖ ciphertext (payload_size - 16 bytes)`; the
/// plaintext is programmed block by block at `dst`.
pub fn decrypt_update_image<P: Platform, C: CryptoOps>(
    platform: &mut P,
    crypto: &mut C,
    key: &[u8; 16],
    src: u32,
    dst: u32,
    payload_size: u32,
) -> Result<(), Error> {
    let payload = payload_size as usize;
    if payload < AES_BLOCK || payload % AES_BLOCK != 0 {
        return Err(Error::Flash(FlashError::Param));
    }
    let ciphertext_len = payload_size - AES_BLOCK as u32;

    platform.flash_erase(dst, ciphertext_len)?;

    // Chaining value: the IV for block 0, then the previous ciphertext block
    let mut prev = [0u8; AES_BLOCK];
    platform.flash_read(src, &mut prev);

    let mut offset = 0u32;
    while offset < ciphertext_len {
        let mut ciphertext = [0u8; AES_BLOCK];
        platform.flash_read(src + AES_BLOCK as u32 + offset, &mut ciphertext);

        let mut plain = [0u8; AES_BLOCK];
        crypto.aes128_decrypt_block(key, &ciphertext, &mut plain)?;
        for (p, c) in plain.iter_mut().zip(prev.iter()) {
            *p ^= c;
        }

        platform.flash_write(dst + offset, &plain)?;
        prev = ciphertext;
        offset += AES_BLOCK as u32;
    }
    Ok(())
}

enum EcbDirection {
    Encrypt,
    Decrypt,
}

/// AES-128-ECB-encrypt the whole Active slot into the Download slot.
///
/// IRQs are masked for the duration: this primitive reads the Active slot
/// while the flash controller is busy writing its peer, and an ISR fetching
/// from Active during that window would stall.
pub fn encrypt_backup<P: Platform, C: CryptoOps>(
    platform: &mut P,
    crypto: &mut C,
    key: &[u8; 16],
    src: u32,
    dst: u32,
    slot_size: u32,
) -> Result<(), Error> {
    platform.irq_disable();
    let result = ecb_slot(platform, crypto, key, src, dst, slot_size, EcbDirection::Encrypt);
    platform.irq_enable();
    result
}

/// Inverse of [`encrypt_backup`]: ECB-decrypt a whole-slot backup, IRQs
/// masked for the same reason.
pub fn decrypt_backup_image<P: Platform, C: CryptoOps>(
    platform: &mut P,
    crypto: &mut C,
    key: &[u8; 16],
    src: u32,
    dst: u32,
    slot_size: u32,
) -> Result<(), Error> {
    platform.irq_disable();
    let result = ecb_slot(platform, crypto, key, src, dst, slot_size, EcbDirection::Decrypt);
    platform.irq_enable();
    result
}

fn ecb_slot<P: Platform, C: CryptoOps>(
    platform: &mut P,
    crypto: &mut C,
    key: &[u8; 16],
    src: u32,
    dst: u32,
    slot_size: u32,
    direction: EcbDirection,
) -> Result<(), Error> {
    if slot_size as usize % AES_BLOCK != 0 {
        return Err(Error::Flash(FlashError::Param));
    }

    platform.flash_erase(dst, slot_size)?;

    let mut input = [0u8; AES_BLOCK];
    let mut output = [0u8; AES_BLOCK];
    let mut offset = 0u32;
    while offset < slot_size {
        platform.flash_read(src + offset, &mut input);
        match direction {
            EcbDirection::Encrypt => crypto.aes128_encrypt_block(key, &input, &mut output)?,
            EcbDirection::Decrypt => crypto.aes128_decrypt_block(key, &input, &mut output)?,
        }
        platform.flash_write(dst + offset, &output)?;
        offset += AES_BLOCK as u32;
    }
    Ok(())
}

/// Install the update staged in the Download slot.
///
/// On success the config is rewritten with the new version and a reset is
/// requested; this function then returns `Ok`. Failure handling follows
/// the dispatch contract: a missing footer aborts without touching the
/// Download slot, any other validation failure erases it, and the caller
/// reverts `system_status` in both cases.
pub fn update<P: Platform, C: CryptoOps>(
    platform: &mut P,
    crypto: &mut C,
    keys: &KeySet,
    config: &mut BootConfig,
) -> Result<(), Error> {
    let mem = platform.memory_map();

    let footer = match image::validate(
        platform,
        crypto,
        mem.app_download_addr,
        mem.slot_size,
        &keys.ecdsa_pub,
    ) {
        Ok(footer) => footer,
        Err(ImageError::FooterNotFound) => {
            bootlog!(platform, "[BL] No footer in Download Slot. Nothing to install.");
            return Err(Error::Image(ImageError::FooterNotFound));
        }
        Err(e) => {
            bootlog!(platform, "[BL] Download image rejected ({:?}). Erasing slot.", e);
            platform.flash_unlock();
            let erased = platform.flash_erase(mem.app_download_addr, mem.slot_size);
            platform.flash_lock();
            erased?;
            return Err(Error::Image(e));
        }
    };

    bootlog!(
        platform,
        "[BL] Installing update v{} ({} byte payload).",
        footer.version,
        footer.size
    );

    platform.flash_unlock();
    let staged = install_update(platform, crypto, keys, &mem, footer.size);
    platform.flash_lock();
    staged?;

    config.status = SystemStatus::Normal;
    config.current_version = footer.version;
    config::write_config(platform, config)?;

    bootlog!(platform, "[BL] Update complete. Resetting.");
    platform.system_reset();
    Ok(())
}

fn install_update<P: Platform, C: CryptoOps>(
    platform: &mut P,
    crypto: &mut C,
    keys: &KeySet,
    mem: &MemoryMap,
    payload_size: u32,
) -> Result<(), Error> {
    bootlog!(platform, "[BL] Decrypting update into Scratch...");
    decrypt_update_image(
        platform,
        crypto,
        &keys.aes,
        mem.app_download_addr,
        mem.scratch_addr,
        payload_size,
    )?;

    // Commit point: this destroys the staged update. From here on Download
    // holds the backup of the outgoing image.
    bootlog!(platform, "[BL] Backing up Active into Download...");
    encrypt_backup(
        platform,
        crypto,
        &keys.aes,
        mem.app_active_addr,
        mem.app_download_addr,
        mem.slot_size,
    )?;

    bootlog!(platform, "[BL] Copying new image into Active...");
    raw_copy(
        platform,
        mem.scratch_addr,
        mem.app_active_addr,
        payload_size - AES_BLOCK as u32,
    )
}

/// Swap Active with the encrypted backup held in the Download slot.
///
/// The candidate is decrypted into Scratch first and its reset vector is
/// checked against the flash base before anything touches Active; an
/// implausible vector aborts with [`ImageError::VectorBad`] and leaves both
/// slots as they were. On success the config is rewritten (the version
/// field intentionally unchanged, since the backup carries no metadata) and a
/// reset is requested.
pub fn rollback<P: Platform, C: CryptoOps>(
    platform: &mut P,
    crypto: &mut C,
    keys: &KeySet,
    config: &mut BootConfig,
) -> Result<(), Error> {
    let mem = platform.memory_map();

    platform.flash_unlock();
    let swapped = swap_in_backup(platform, crypto, keys, &mem);
    platform.flash_lock();
    swapped?;

    config.status = SystemStatus::Normal;
    config::write_config(platform, config)?;

    bootlog!(platform, "[BL] Rollback complete. Resetting.");
    platform.system_reset();
    Ok(())
}

fn swap_in_backup<P: Platform, C: CryptoOps>(
    platform: &mut P,
    crypto: &mut C,
    keys: &KeySet,
    mem: &MemoryMap,
) -> Result<(), Error> {
    bootlog!(platform, "[BL] Decrypting backup into Scratch...");
    decrypt_backup_image(
        platform,
        crypto,
        &keys.aes,
        mem.app_download_addr,
        mem.scratch_addr,
        mem.slot_size,
    )?;

    // Sanity-check the candidate before evicting anything: its reset
    // vector must live in the same flash region as the bootloader
    let reset_vector = read_u32(platform, mem.scratch_addr + 4);
    if reset_vector & 0xFF00_0000 != mem.flash_base & 0xFF00_0000 {
        bootlog!(
            platform,
            "[BL] Backup reset vector 0x{:08X} not in flash. Aborting rollback.",
            reset_vector
        );
        return Err(Error::Image(ImageError::VectorBad));
    }

    bootlog!(platform, "[BL] Backing up Active into Download...");
    encrypt_backup(
        platform,
        crypto,
        &keys.aes,
        mem.app_active_addr,
        mem.app_download_addr,
        mem.slot_size,
    )?;

    bootlog!(platform, "[BL] Copying backup into Active...");
    raw_copy(platform, mem.scratch_addr, mem.app_active_addr, mem.slot_size)
}
