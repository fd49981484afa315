// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Ferroboot Contributors

//! Shared test harness: a RAM-backed `Platform` with flash-accurate
//! programming semantics, plus fixture builders for signed update blobs.

#![allow(dead_code)]

use ferroboot_core::crypto::{CryptoOps, KeySet, SoftCrypto};
use ferroboot_core::error::FlashError;
use ferroboot_core::footer::{FirmwareFooter, FOOTER_MAGIC};
use ferroboot_core::platform::{MemoryMap, Platform};

use p256::ecdsa::signature::hazmat::PrehashSigner;
use p256::ecdsa::{Signature, SigningKey};
use p256::elliptic_curve::sec1::ToEncodedPoint;

// Fixture memory map: STM32F7-style layout, 256KB slots
pub const FLASH_BASE: u32 = 0x0800_0000;
pub const CONFIG_ADDR: u32 = 0x0801_0000;
pub const ACTIVE_ADDR: u32 = 0x0804_0000;
pub const DOWNLOAD_ADDR: u32 = 0x0808_0000;
pub const SCRATCH_ADDR: u32 = 0x080C_0000;
pub const SLOT_SIZE: u32 = 0x0004_0000;
pub const RAM_BASE: u32 = 0x2000_0000;

const FLASH_SPAN: usize = 0x0010_0000;
const ERASE_UNIT: u32 = 0x1000;

pub const TEST_AES_KEY: [u8; 16] = [
    0x2B, 0x7E, 0x15, 0x16, 0x28, 0xAE, 0xD2, 0xA6, 0xAB, 0xF7, 0x15, 0x88, 0x09, 0xCF, 0x4F,
    0x3C,
];

/// RAM-backed platform. Flash programming follows NOR semantics (bits only
/// clear), erase rounds to 4KB units, and every side effect is recorded so
/// tests can assert on resets, jumps, halts, lock pairing, and IRQ balance.
pub struct MockPlatform {
    pub mem: MemoryMap,
    pub flash: Vec<u8>,
    pub locked: bool,
    pub uart: Vec<u8>,
    pub trigger: bool,
    pub irq_depth: i32,
    pub led_toggles: u32,
    pub resets: u32,
    pub jumps: u32,
    pub halted: bool,
    pub ticks: u32,
    /// Fail the first erase whose range covers this address.
    pub fail_erase_at: Option<u32>,
    /// Fail the first write whose range covers this address.
    pub fail_write_at: Option<u32>,
}

impl MockPlatform {
    pub fn new() -> Self {
        Self {
            mem: MemoryMap {
                config_addr: CONFIG_ADDR,
                app_active_addr: ACTIVE_ADDR,
                app_download_addr: DOWNLOAD_ADDR,
                scratch_addr: SCRATCH_ADDR,
                slot_size: SLOT_SIZE,
                flash_base: FLASH_BASE,
                ram_base: RAM_BASE,
            },
            flash: vec![0xFF; FLASH_SPAN],
            locked: true,
            uart: Vec::new(),
            trigger: false,
            irq_depth: 0,
            led_toggles: 0,
            resets: 0,
            jumps: 0,
            halted: false,
            ticks: 0,
            fail_erase_at: None,
            fail_write_at: None,
        }
    }

    fn offset(&self, addr: u32) -> usize {
        assert!(
            addr >= FLASH_BASE && ((addr - FLASH_BASE) as usize) < self.flash.len(),
            "flash access out of range: 0x{addr:08X}"
        );
        (addr - FLASH_BASE) as usize
    }

    /// Place bytes in flash directly, bypassing the programming model.
    pub fn install(&mut self, addr: u32, data: &[u8]) {
        let start = self.offset(addr);
        self.flash[start..start + data.len()].copy_from_slice(data);
    }

    /// Erase a whole region directly (fixture setup).
    pub fn wipe(&mut self, addr: u32, len: u32) {
        let start = self.offset(addr);
        self.flash[start..start + len as usize].fill(0xFF);
    }

    pub fn read_back(&self, addr: u32, len: usize) -> Vec<u8> {
        let start = self.offset(addr);
        self.flash[start..start + len].to_vec()
    }

    pub fn uart_text(&self) -> String {
        String::from_utf8_lossy(&self.uart).into_owned()
    }
}

impl Platform for MockPlatform {
    fn init(&mut self) {}

    fn memory_map(&self) -> MemoryMap {
        self.mem
    }

    fn flash_read(&self, addr: u32, buf: &mut [u8]) {
        let start = self.offset(addr);
        buf.copy_from_slice(&self.flash[start..start + buf.len()]);
    }

    fn flash_unlock(&mut self) {
        self.locked = false;
    }

    fn flash_lock(&mut self) {
        self.locked = true;
    }

    fn flash_erase(&mut self, addr: u32, len: u32) -> Result<(), FlashError> {
        if self.locked {
            return Err(FlashError::Locked);
        }
        if len == 0 {
            return Ok(());
        }
        if let Some(target) = self.fail_erase_at {
            if target >= addr && target < addr + len {
                self.fail_erase_at = None;
                return Err(FlashError::Erase);
            }
        }
        // Erase every erase unit intersecting [addr, addr + len)
        let first = (addr - FLASH_BASE) & !(ERASE_UNIT - 1);
        let last = (addr - FLASH_BASE + len - 1) & !(ERASE_UNIT - 1);
        let end = (last + ERASE_UNIT) as usize;
        self.flash[first as usize..end].fill(0xFF);
        Ok(())
    }

    fn flash_write(&mut self, addr: u32, data: &[u8]) -> Result<(), FlashError> {
        if self.locked {
            return Err(FlashError::Locked);
        }
        if let Some(target) = self.fail_write_at {
            if target >= addr && (target as u64) < addr as u64 + data.len() as u64 {
                self.fail_write_at = None;
                return Err(FlashError::Write);
            }
        }
        let start = self.offset(addr);
        // NOR programming can only clear bits
        for (cell, byte) in self.flash[start..start + data.len()].iter_mut().zip(data) {
            *cell &= byte;
        }
        Ok(())
    }

    fn uart_write(&mut self, data: &[u8]) {
        self.uart.extend_from_slice(data);
    }

    fn trigger_pressed(&mut self) -> bool {
        self.trigger
    }

    fn toggle_led(&mut self) {
        self.led_toggles += 1;
    }

    fn irq_disable(&mut self) {
        self.irq_depth += 1;
    }

    fn irq_enable(&mut self) {
        self.irq_depth -= 1;
    }

    fn delay_ms(&mut self, ms: u32) {
        self.ticks += ms;
    }

    fn ticks(&self) -> u32 {
        self.ticks
    }

    fn system_reset(&mut self) {
        self.resets += 1;
    }

    fn jump_to_app(&mut self) {
        self.jumps += 1;
    }

    fn error_handler(&mut self) {
        self.halted = true;
    }
}

// --- Crypto fixtures ---

pub fn test_signing_key() -> SigningKey {
    SigningKey::from_slice(&[0x01u8; 32]).expect("fixed scalar is a valid key")
}

pub fn test_keys() -> KeySet {
    let point = test_signing_key().verifying_key().to_encoded_point(false);
    let mut ecdsa_pub = [0u8; 64];
    ecdsa_pub.copy_from_slice(&point.as_bytes()[1..65]);
    KeySet {
        aes: TEST_AES_KEY,
        ecdsa_pub,
    }
}

pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut crypto = SoftCrypto::new();
    crypto.sha256_begin().unwrap();
    crypto.sha256_update(data).unwrap();
    let mut digest = [0u8; 32];
    crypto.sha256_finish(&mut digest).unwrap();
    digest
}

/// AES-128-CBC encrypt (the packaging side of `decrypt_update_image`).
pub fn cbc_encrypt(key: &[u8; 16], iv: &[u8; 16], plaintext: &[u8]) -> Vec<u8> {
    assert_eq!(plaintext.len() % 16, 0);
    let mut crypto = SoftCrypto::new();
    let mut prev = *iv;
    let mut out = Vec::with_capacity(plaintext.len());
    for chunk in plaintext.chunks(16) {
        let mut block = [0u8; 16];
        block.copy_from_slice(chunk);
        for (b, p) in block.iter_mut().zip(prev.iter()) {
            *b ^= p;
        }
        let mut cipher = [0u8; 16];
        crypto.aes128_encrypt_block(key, &block, &mut cipher).unwrap();
        out.extend_from_slice(&cipher);
        prev = cipher;
    }
    out
}

/// AES-128-ECB encrypt (what `encrypt_backup` leaves in the Download slot).
pub fn ecb_encrypt(key: &[u8; 16], data: &[u8]) -> Vec<u8> {
    assert_eq!(data.len() % 16, 0);
    let mut crypto = SoftCrypto::new();
    let mut out = Vec::with_capacity(data.len());
    for chunk in data.chunks(16) {
        let mut block = [0u8; 16];
        block.copy_from_slice(chunk);
        let mut cipher = [0u8; 16];
        crypto.aes128_encrypt_block(key, &block, &mut cipher).unwrap();
        out.extend_from_slice(&cipher);
    }
    out
}

pub fn ecb_decrypt_block(key: &[u8; 16], block: &[u8; 16]) -> [u8; 16] {
    let mut crypto = SoftCrypto::new();
    let mut out = [0u8; 16];
    crypto.aes128_decrypt_block(key, block, &mut out).unwrap();
    out
}

pub fn sign_payload(payload: &[u8]) -> [u8; 64] {
    let digest = sha256(payload);
    let signature: Signature = test_signing_key()
        .sign_prehash(&digest)
        .expect("prehash signing");
    let mut sig64 = [0u8; 64];
    sig64.copy_from_slice(&signature.to_bytes());
    sig64
}

/// Build a complete staged-update blob: `IV ‖ CBC(plaintext) ‖ footer`.
pub fn make_signed_image(plaintext: &[u8], version: u32) -> Vec<u8> {
    let iv = [0xA5u8; 16];
    let ciphertext = cbc_encrypt(&TEST_AES_KEY, &iv, plaintext);

    let mut blob = iv.to_vec();
    blob.extend_from_slice(&ciphertext);

    let footer = FirmwareFooter {
        version,
        size: blob.len() as u32,
        signature: sign_payload(&blob),
        magic: FOOTER_MAGIC,
    };
    blob.extend_from_slice(&footer.to_bytes());
    blob
}

/// A plausible application image: vector table (initial SP in RAM, reset
/// handler inside the Active slot) followed by deterministic filler.
pub fn make_app_image(len: usize, seed: u8) -> Vec<u8> {
    assert!(len >= 8 && len % 16 == 0);
    let mut image: Vec<u8> = (0..len)
        .map(|i| (i as u8).wrapping_mul(31).wrapping_add(seed))
        .collect();
    image[0..4].copy_from_slice(&(RAM_BASE + 0x8000).to_le_bytes());
    image[4..8].copy_from_slice(&(ACTIVE_ADDR + 0x415).to_le_bytes());
    image
}

/// Pad an image to a full slot with erased-flash filler.
pub fn pad_to_slot(image: &[u8]) -> Vec<u8> {
    assert!(image.len() <= SLOT_SIZE as usize);
    let mut slot = image.to_vec();
    slot.resize(SLOT_SIZE as usize, 0xFF);
    slot
}
