// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Ferroboot Contributors

//! RP2040 flash memory map.
//!
//! The bootloader occupies the first 64KB of XIP flash. Three equal 256KB
//! application slots follow the 4KB configuration sector. Only this module
//! and the linker script know these numbers; everything else receives them
//! through `MemoryMap`.

use ferroboot_core::MemoryMap;

pub const FLASH_BASE: u32 = 0x1000_0000;
pub const RAM_BASE: u32 = 0x2000_0000;

pub const CONFIG_ADDR: u32 = 0x1001_0000;
pub const APP_ACTIVE_ADDR: u32 = 0x1004_0000;
pub const APP_DOWNLOAD_ADDR: u32 = 0x1008_0000;
pub const SCRATCH_ADDR: u32 = 0x100C_0000;
pub const SLOT_SIZE: u32 = 0x0004_0000;

pub const FLASH_SECTOR_SIZE: u32 = 4096;
pub const FLASH_PAGE_SIZE: u32 = 256;

pub fn memory_map() -> MemoryMap {
    MemoryMap {
        config_addr: CONFIG_ADDR,
        app_active_addr: APP_ACTIVE_ADDR,
        app_download_addr: APP_DOWNLOAD_ADDR,
        scratch_addr: SCRATCH_ADDR,
        slot_size: SLOT_SIZE,
        flash_base: FLASH_BASE,
        ram_base: RAM_BASE,
    }
}
