// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Ferroboot Contributors

//! Swap engine primitives and transitions.

mod common;

use common::{
    ecb_encrypt, make_app_image, make_signed_image, pad_to_slot, test_keys, MockPlatform,
    TEST_AES_KEY, ACTIVE_ADDR, DOWNLOAD_ADDR, SCRATCH_ADDR, SLOT_SIZE,
};
use ferroboot_core::config::{BootConfig, SystemStatus, CONFIG_MAGIC};
use ferroboot_core::crypto::SoftCrypto;
use ferroboot_core::error::{Error, FlashError, ImageError};
use ferroboot_core::swap;

fn unlocked_platform() -> MockPlatform {
    let mut platform = MockPlatform::new();
    platform.locked = false;
    platform
}

// --- Primitives ---

#[test]
fn test_raw_copy_is_byte_exact() {
    let mut platform = unlocked_platform();
    let data = make_app_image(4096, 1);
    platform.install(SCRATCH_ADDR, &data);
    // Stale content in the destination must be erased first
    platform.install(ACTIVE_ADDR, &[0u8; 4096]);

    swap::raw_copy(&mut platform, SCRATCH_ADDR, ACTIVE_ADDR, 4096).unwrap();

    assert_eq!(platform.read_back(ACTIVE_ADDR, 4096), data);
}

#[test]
fn test_raw_copy_rejects_unaligned_length() {
    let mut platform = unlocked_platform();
    assert_eq!(
        swap::raw_copy(&mut platform, SCRATCH_ADDR, ACTIVE_ADDR, 100),
        Err(Error::Flash(FlashError::Param))
    );
}

#[test]
fn test_decrypt_update_image_recovers_plaintext() {
    let mut platform = unlocked_platform();
    let mut crypto = SoftCrypto::new();

    let plaintext = make_app_image(4096, 7);
    let blob = make_signed_image(&plaintext, 1);
    platform.install(DOWNLOAD_ADDR, &blob);

    let payload_size = (16 + plaintext.len()) as u32;
    swap::decrypt_update_image(
        &mut platform,
        &mut crypto,
        &TEST_AES_KEY,
        DOWNLOAD_ADDR,
        SCRATCH_ADDR,
        payload_size,
    )
    .unwrap();

    assert_eq!(platform.read_back(SCRATCH_ADDR, plaintext.len()), plaintext);
}

#[test]
fn test_decrypt_update_image_rejects_bad_payload_size() {
    let mut platform = unlocked_platform();
    let mut crypto = SoftCrypto::new();

    for bad in [0u32, 8, 24] {
        assert_eq!(
            swap::decrypt_update_image(
                &mut platform,
                &mut crypto,
                &TEST_AES_KEY,
                DOWNLOAD_ADDR,
                SCRATCH_ADDR,
                bad,
            ),
            Err(Error::Flash(FlashError::Param)),
            "payload_size {bad}"
        );
    }
}

#[test]
fn test_backup_roundtrip_is_identity() {
    let mut platform = unlocked_platform();
    let mut crypto = SoftCrypto::new();

    let original = pad_to_slot(&make_app_image(8192, 3));
    platform.install(ACTIVE_ADDR, &original);

    swap::encrypt_backup(
        &mut platform,
        &mut crypto,
        &TEST_AES_KEY,
        ACTIVE_ADDR,
        DOWNLOAD_ADDR,
        SLOT_SIZE,
    )
    .unwrap();

    let backup = platform.read_back(DOWNLOAD_ADDR, SLOT_SIZE as usize);
    assert_eq!(backup, ecb_encrypt(&TEST_AES_KEY, &original));
    assert_ne!(backup, original);

    swap::decrypt_backup_image(
        &mut platform,
        &mut crypto,
        &TEST_AES_KEY,
        DOWNLOAD_ADDR,
        SCRATCH_ADDR,
        SLOT_SIZE,
    )
    .unwrap();

    assert_eq!(
        platform.read_back(SCRATCH_ADDR, SLOT_SIZE as usize),
        original
    );
    assert_eq!(platform.irq_depth, 0, "IRQ mask must be balanced");
}

#[test]
fn test_backup_primitives_rebalance_irqs_on_failure() {
    let mut platform = unlocked_platform();
    let mut crypto = SoftCrypto::new();
    platform.fail_write_at = Some(DOWNLOAD_ADDR + 64);

    let result = swap::encrypt_backup(
        &mut platform,
        &mut crypto,
        &TEST_AES_KEY,
        ACTIVE_ADDR,
        DOWNLOAD_ADDR,
        SLOT_SIZE,
    );

    assert_eq!(result, Err(Error::Flash(FlashError::Write)));
    assert_eq!(platform.irq_depth, 0, "IRQ mask must be released on error");
}

// --- Update transition ---

fn update_fixture(active: &[u8], download_blob: &[u8], version_before: u32) -> (MockPlatform, BootConfig) {
    let mut platform = MockPlatform::new();
    platform.install(ACTIVE_ADDR, active);
    platform.install(DOWNLOAD_ADDR, download_blob);
    let config = BootConfig {
        magic: CONFIG_MAGIC,
        status: SystemStatus::UpdateReq,
        current_version: version_before,
    };
    (platform, config)
}

#[test]
fn test_update_installs_new_image_and_backs_up_old() {
    let v1 = pad_to_slot(&make_app_image(4096, 1));
    let v2_plain = make_app_image(0x10000, 2);
    let blob = make_signed_image(&v2_plain, 2);
    let (mut platform, mut config) = update_fixture(&v1, &blob, 1);
    let mut crypto = SoftCrypto::new();

    swap::update(&mut platform, &mut crypto, &test_keys(), &mut config).unwrap();

    // Active carries the new plaintext byte-for-byte
    assert_eq!(platform.read_back(ACTIVE_ADDR, v2_plain.len()), v2_plain);
    // Download carries the ECB backup of the full previous Active slot
    assert_eq!(
        platform.read_back(DOWNLOAD_ADDR, SLOT_SIZE as usize),
        ecb_encrypt(&TEST_AES_KEY, &v1)
    );
    // Config committed with the new version before the reset request
    assert_eq!(config.status, SystemStatus::Normal);
    assert_eq!(config.current_version, 2);
    assert_eq!(platform.resets, 1);
    assert!(platform.locked);
    assert_eq!(platform.irq_depth, 0);
}

#[test]
fn test_update_without_footer_leaves_download_alone() {
    let v1 = pad_to_slot(&make_app_image(4096, 1));
    let (mut platform, mut config) = update_fixture(&v1, &[], 1);
    let mut crypto = SoftCrypto::new();

    let result = swap::update(&mut platform, &mut crypto, &test_keys(), &mut config);

    assert_eq!(result, Err(Error::Image(ImageError::FooterNotFound)));
    assert_eq!(platform.read_back(ACTIVE_ADDR, v1.len()), v1);
    assert_eq!(platform.resets, 0);
}

#[test]
fn test_update_with_bad_signature_erases_download() {
    let v1 = pad_to_slot(&make_app_image(4096, 1));
    let mut blob = make_signed_image(&make_app_image(4096, 2), 2);
    let tampered = blob.len() - 40;
    blob[tampered] ^= 0x10;
    let (mut platform, mut config) = update_fixture(&v1, &blob, 1);
    let mut crypto = SoftCrypto::new();

    let result = swap::update(&mut platform, &mut crypto, &test_keys(), &mut config);

    assert_eq!(result, Err(Error::Image(ImageError::SigFail)));
    assert!(platform
        .read_back(DOWNLOAD_ADDR, SLOT_SIZE as usize)
        .iter()
        .all(|&b| b == 0xFF));
    assert_eq!(platform.read_back(ACTIVE_ADDR, v1.len()), v1);
    assert_eq!(platform.resets, 0);
}

#[test]
fn test_update_aborts_on_flash_write_failure() {
    let v1 = pad_to_slot(&make_app_image(4096, 1));
    let blob = make_signed_image(&make_app_image(4096, 2), 2);
    let (mut platform, mut config) = update_fixture(&v1, &blob, 1);
    platform.fail_write_at = Some(SCRATCH_ADDR + 128);
    let mut crypto = SoftCrypto::new();

    let result = swap::update(&mut platform, &mut crypto, &test_keys(), &mut config);

    assert_eq!(result, Err(Error::Flash(FlashError::Write)));
    // Failure before the backup step leaves Active intact
    assert_eq!(platform.read_back(ACTIVE_ADDR, v1.len()), v1);
    assert!(platform.locked);
    assert_eq!(platform.resets, 0);
}

// --- Rollback transition ---

#[test]
fn test_rollback_swaps_backup_into_active() {
    let v1 = pad_to_slot(&make_app_image(4096, 1));
    let v2 = pad_to_slot(&make_app_image(4096, 2));

    let mut platform = MockPlatform::new();
    platform.install(ACTIVE_ADDR, &v2);
    platform.install(DOWNLOAD_ADDR, &ecb_encrypt(&TEST_AES_KEY, &v1));
    let mut config = BootConfig {
        magic: CONFIG_MAGIC,
        status: SystemStatus::Rollback,
        current_version: 2,
    };
    let mut crypto = SoftCrypto::new();

    swap::rollback(&mut platform, &mut crypto, &test_keys(), &mut config).unwrap();

    assert_eq!(platform.read_back(ACTIVE_ADDR, SLOT_SIZE as usize), v1);
    assert_eq!(
        platform.read_back(DOWNLOAD_ADDR, SLOT_SIZE as usize),
        ecb_encrypt(&TEST_AES_KEY, &v2)
    );
    // The version field is intentionally not updated on rollback
    assert_eq!(config.status, SystemStatus::Normal);
    assert_eq!(config.current_version, 2);
    assert_eq!(platform.resets, 1);
    assert_eq!(platform.irq_depth, 0);
}

#[test]
fn test_rollback_rejects_backup_with_foreign_reset_vector() {
    let v2 = pad_to_slot(&make_app_image(4096, 2));

    // A "backup" whose decrypted reset vector points at RAM, not flash
    let mut bogus = pad_to_slot(&make_app_image(4096, 9));
    bogus[4..8].copy_from_slice(&0x2000_1234u32.to_le_bytes());

    let mut platform = MockPlatform::new();
    platform.install(ACTIVE_ADDR, &v2);
    platform.install(DOWNLOAD_ADDR, &ecb_encrypt(&TEST_AES_KEY, &bogus));
    let mut config = BootConfig {
        magic: CONFIG_MAGIC,
        status: SystemStatus::Rollback,
        current_version: 2,
    };
    let mut crypto = SoftCrypto::new();

    let result = swap::rollback(&mut platform, &mut crypto, &test_keys(), &mut config);

    assert_eq!(result, Err(Error::Image(ImageError::VectorBad)));
    // Active and Download are untouched
    assert_eq!(platform.read_back(ACTIVE_ADDR, SLOT_SIZE as usize), v2);
    assert_eq!(
        platform.read_back(DOWNLOAD_ADDR, SLOT_SIZE as usize),
        ecb_encrypt(&TEST_AES_KEY, &bogus)
    );
    assert_eq!(platform.resets, 0);
    assert!(platform.locked);
}
