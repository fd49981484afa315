// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Ferroboot Contributors

//! Reset-time boot orchestrator.
//!
//! Single-shot sequence: platform init → config read → trigger detection →
//! dispatch on the requested action → reboot or jump. Never reentered.

use crate::bootlog;
use crate::config::{self, BootConfig, SystemStatus};
use crate::crypto::{CryptoOps, KeySet};
use crate::image;
use crate::platform::{read_u32, Platform};
use crate::swap;

const VERSION: (u32, u32) = (1, 7);

/// How a boot pass ended. On hardware `Jumped` and `ResetRequested` are
/// never observed (the jump and the reset do not return); the variants keep
/// the sequence testable on the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BootOutcome {
    /// Control was handed to the application in the Active slot.
    Jumped,
    /// A transition finished (or failed in a way that demands a clean
    /// restart) and a system reset was requested.
    ResetRequested,
    /// An update was aborted; state was reverted and the caller decides
    /// what to do with the still-running bootloader.
    Aborted,
    /// Nothing bootable anywhere; the platform error handler was invoked.
    Halted,
}

/// The top-level state machine tying config store, validator, and swap
/// engine together over one platform.
pub struct Bootloader<P: Platform, C: CryptoOps> {
    platform: P,
    crypto: C,
    keys: KeySet,
}

impl<P: Platform, C: CryptoOps> Bootloader<P, C> {
    pub fn new(platform: P, crypto: C, keys: KeySet) -> Self {
        debug_assert!(platform.memory_map().slots_disjoint());
        Self {
            platform,
            crypto,
            keys,
        }
    }

    /// Release the platform, e.g. to drive the error path from the binary.
    pub fn into_platform(self) -> P {
        self.platform
    }

    /// Run one boot pass.
    pub fn run(&mut self) -> BootOutcome {
        self.platform.init();
        self.platform.toggle_led();

        bootlog!(&mut self.platform, "========================================");
        bootlog!(
            &mut self.platform,
            "Starting Bootloader Version-({},{})",
            VERSION.0,
            VERSION.1
        );
        bootlog!(&mut self.platform, "========================================");

        let (mut config, was_valid) = config::read_config(&self.platform);
        if !was_valid {
            bootlog!(
                &mut self.platform,
                "[BL] Config Invalid/Empty. Initialized to Defaults."
            );
            if config::write_config(&mut self.platform, &config).is_err() {
                bootlog!(&mut self.platform, "[BL] Config write failed; continuing.");
            }
        }

        if self.platform.trigger_pressed() {
            self.trigger_override(&mut config);
        }

        match config.status {
            SystemStatus::UpdateReq => self.dispatch_update(&mut config),
            SystemStatus::Rollback => self.dispatch_rollback(&mut config),
            SystemStatus::Normal => self.normal_boot(&mut config),
        }
    }

    /// The trigger button overrides the stored action: a validly signed
    /// Download requests an update; an erased Download changes nothing;
    /// anything else in Download is assumed to be a prior backup and
    /// requests a rollback.
    fn trigger_override(&mut self, config: &mut BootConfig) {
        bootlog!(&mut self.platform, "[BL] Button Pressed! Determining Mode...");

        let mem = self.platform.memory_map();
        let staged = image::validate(
            &self.platform,
            &mut self.crypto,
            mem.app_download_addr,
            mem.slot_size,
            &self.keys.ecdsa_pub,
        );

        if staged.is_ok() {
            bootlog!(&mut self.platform, " -> Valid Footer Found. Requesting UPDATE.");
            config.status = SystemStatus::UpdateReq;
        } else if read_u32(&self.platform, mem.app_download_addr) == 0xFFFF_FFFF {
            bootlog!(&mut self.platform, " -> Download Slot is Empty. Cannot Swap.");
            config.status = SystemStatus::Normal;
        } else {
            bootlog!(
                &mut self.platform,
                " -> Download Slot has data (Backup). Requesting ROLLBACK."
            );
            config.status = SystemStatus::Rollback;
        }
    }

    fn dispatch_update(&mut self, config: &mut BootConfig) -> BootOutcome {
        bootlog!(&mut self.platform, "[BL] State: UPDATE REQUESTED.");

        match swap::update(&mut self.platform, &mut self.crypto, &self.keys, config) {
            Ok(()) => BootOutcome::ResetRequested,
            Err(e) => {
                bootlog!(
                    &mut self.platform,
                    "[BL] Update failed ({:?}). Clearing state.",
                    e
                );
                config.status = SystemStatus::Normal;
                if config::write_config(&mut self.platform, config).is_err() {
                    return self.halt("Could not clear update state");
                }
                BootOutcome::Aborted
            }
        }
    }

    fn dispatch_rollback(&mut self, config: &mut BootConfig) -> BootOutcome {
        bootlog!(&mut self.platform, "[BL] State: ROLLBACK REQUESTED.");

        match swap::rollback(&mut self.platform, &mut self.crypto, &self.keys, config) {
            // Rollback already requested the reset; stop here instead of
            // falling through to the normal-boot branch
            Ok(()) => BootOutcome::ResetRequested,
            Err(e) => {
                bootlog!(
                    &mut self.platform,
                    "[BL] Rollback Failed ({:?}). Reverting state to NORMAL.",
                    e
                );
                config.status = SystemStatus::Normal;
                // Resetting while the flash still says ROLLBACK would retry
                // the same failing swap on every boot
                if config::write_config(&mut self.platform, config).is_err() {
                    return self.halt("Could not revert rollback state");
                }
                self.platform.system_reset();
                BootOutcome::ResetRequested
            }
        }
    }

    /// Terminal path for a config sector that cannot be rewritten: log,
    /// hand the LED heartbeat to the platform, and report the halt.
    fn halt(&mut self, reason: &str) -> BootOutcome {
        bootlog!(&mut self.platform, "[ERROR] {}. System Halted.", reason);
        self.platform.error_handler();
        BootOutcome::Halted
    }

    /// Default path: boot the Active slot if its reset vector is plausible,
    /// otherwise fall back to auto-provisioning from Download.
    fn normal_boot(&mut self, config: &mut BootConfig) -> BootOutcome {
        bootlog!(
            &mut self.platform,
            "[BL] State: NORMAL. Checking Active Application..."
        );

        let mem = self.platform.memory_map();
        let reset_vector = read_u32(&self.platform, mem.app_active_addr + 4);

        if reset_vector > mem.app_active_addr
            && reset_vector < mem.app_active_addr + mem.slot_size
        {
            bootlog!(
                &mut self.platform,
                "[BL] Valid App found at 0x{:08X}. Jumping...",
                mem.app_active_addr
            );
            // Let the UART drain before the vector table moves
            self.platform.delay_ms(10);
            self.platform.jump_to_app();
            return BootOutcome::Jumped;
        }

        bootlog!(
            &mut self.platform,
            "[BL] Active Slot Empty or Invalid! Checking Download for Auto-Provisioning..."
        );

        let staged = image::validate(
            &self.platform,
            &mut self.crypto,
            mem.app_download_addr,
            mem.slot_size,
            &self.keys.ecdsa_pub,
        );

        if staged.is_ok() {
            bootlog!(
                &mut self.platform,
                "[BL] Valid Image found in Download! Triggering Update..."
            );
            config.status = SystemStatus::UpdateReq;
            // Without the stored request the next boot would land right
            // back here; resetting is pointless if the write failed
            if config::write_config(&mut self.platform, config).is_err() {
                return self.halt("Could not request update");
            }
            self.platform.system_reset();
            BootOutcome::ResetRequested
        } else {
            bootlog!(
                &mut self.platform,
                "[ERROR] No valid app in Active, and no update in Download."
            );
            bootlog!(&mut self.platform, "[ERROR] System Halted.");
            self.platform.error_handler();
            BootOutcome::Halted
        }
    }
}
