// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Ferroboot Contributors

//! Persistent boot-configuration record.
//!
//! The record lives at `config_addr`, packed little-endian, and fits inside
//! a single erase unit. Reading never writes flash; installing defaults
//! after a corrupt read is the orchestrator's call.

use crate::error::Error;
use crate::platform::Platform;

/// Sentinel marking the record as initialized.
pub const CONFIG_MAGIC: u32 = 0xDEAD_BEEF;

/// On-flash size of the record.
pub const CONFIG_LEN: usize = 12;

/// Requested action for the next boot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum SystemStatus {
    Normal = 4,
    UpdateReq = 5,
    Rollback = 6,
}

impl SystemStatus {
    /// Decode the on-flash word. Unknown values fall back to `Normal`,
    /// matching the dispatch default.
    pub fn from_u32(raw: u32) -> Self {
        match raw {
            5 => SystemStatus::UpdateReq,
            6 => SystemStatus::Rollback,
            _ => SystemStatus::Normal,
        }
    }
}

/// Persistent boot configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BootConfig {
    pub magic: u32,
    pub status: SystemStatus,
    pub current_version: u32,
}

impl BootConfig {
    /// Defaults installed when the record is missing or corrupt.
    pub fn defaults() -> Self {
        Self {
            magic: CONFIG_MAGIC,
            status: SystemStatus::Normal,
            current_version: 0,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.magic == CONFIG_MAGIC
    }

    pub fn to_bytes(&self) -> [u8; CONFIG_LEN] {
        let mut raw = [0u8; CONFIG_LEN];
        raw[0..4].copy_from_slice(&self.magic.to_le_bytes());
        raw[4..8].copy_from_slice(&(self.status as u32).to_le_bytes());
        raw[8..12].copy_from_slice(&self.current_version.to_le_bytes());
        raw
    }

    pub fn from_bytes(raw: &[u8; CONFIG_LEN]) -> Self {
        let word = |i: usize| {
            let mut b = [0u8; 4];
            b.copy_from_slice(&raw[i..i + 4]);
            u32::from_le_bytes(b)
        };
        Self {
            magic: word(0),
            status: SystemStatus::from_u32(word(4)),
            current_version: word(8),
        }
    }
}

/// Read the record from flash. Returns the record (defaults if the magic
/// was wrong) and whether the stored copy was valid. Does not write.
pub fn read_config<P: Platform>(platform: &P) -> (BootConfig, bool) {
    let mem = platform.memory_map();
    let mut raw = [0u8; CONFIG_LEN];
    platform.flash_read(mem.config_addr, &mut raw);

    let config = BootConfig::from_bytes(&raw);
    if config.is_valid() {
        (config, true)
    } else {
        (BootConfig::defaults(), false)
    }
}

/// Erase the config erase-unit and program the record. The caller treats a
/// failure as fatal for the current transition.
pub fn write_config<P: Platform>(platform: &mut P, config: &BootConfig) -> Result<(), Error> {
    let mem = platform.memory_map();

    platform.flash_unlock();
    let result = platform
        .flash_erase(mem.config_addr, CONFIG_LEN as u32)
        .and_then(|()| platform.flash_write(mem.config_addr, &config.to_bytes()));
    platform.flash_lock();

    result.map_err(Error::Flash)
}
