// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Ferroboot Contributors

//! RP2040 flash driver built on the chip's mask-ROM routines.
//!
//! The RP2040 has no flash peripheral of its own; erasing and programming
//! are services of the boot ROM, and they only work after execute-in-place
//! has been torn down (`connect_internal_flash` + `flash_exit_xip` before
//! the operation, `flash_flush_cache` + `flash_enter_cmd_xip` to restore
//! it). While XIP is down nothing may fetch from flash, which has two
//! consequences for this module: [`rom_erase`] and [`rom_program`] are
//! placed in `.data` so they execute from RAM, and every ROM entry point
//! they call is resolved ahead of time by [`init`] into a RAM-resident
//! table.
//!
//! Two impedance mismatches with the core are also bridged here: the swap
//! engine erases arbitrary byte ranges while the ROM erases whole 4KB
//! sectors, and the engine programs 16-byte AES blocks while the ROM
//! programs 256-byte pages. [`erase`] widens the range to sector bounds;
//! [`program`] merges each block into a read-back copy of its page before
//! reprogramming it (safe because the engine only writes freshly erased
//! regions, so merged bits only ever clear).

use ferroboot_core::error::FlashError;

use crate::layout::{FLASH_BASE, FLASH_PAGE_SIZE, FLASH_SECTOR_SIZE};

/// Block-erase command forwarded to `flash_range_erase` (4KB sector erase).
const SECTOR_ERASE_CMD: u8 = 0x20;

/// Two-letter codes naming the flash routines in the ROM's function table.
const ROM_TAGS: [[u8; 2]; 6] = [*b"IF", *b"EX", *b"RE", *b"RP", *b"FC", *b"CX"];

// Indices into ROM_ENTRIES, in ROM_TAGS order
const CONNECT_INTERNAL_FLASH: usize = 0;
const FLASH_EXIT_XIP: usize = 1;
const FLASH_RANGE_ERASE: usize = 2;
const FLASH_RANGE_PROGRAM: usize = 3;
const FLASH_FLUSH_CACHE: usize = 4;
const FLASH_ENTER_CMD_XIP: usize = 5;

/// Resolved ROM entry points. Zero until [`init`] runs; calling into the
/// ROM before then is undefined behavior, so `init` must be the first
/// thing the binary does with this module.
static mut ROM_ENTRIES: [usize; 6] = [0; 6];

/// Resolve the ROM entry points for all six flash routines.
///
/// The ROM publishes a halfword pointer to its function table at `0x14`
/// and a lookup routine at `0x18`. Both live in flash-mapped address
/// space, so this must run while XIP is still active; afterwards the
/// resolved addresses are read from RAM only.
pub fn init() {
    unsafe {
        let table = *(0x14 as *const u16) as *const u16;
        let lookup: unsafe extern "C" fn(*const u16, u32) -> usize =
            core::mem::transmute::<usize, unsafe extern "C" fn(*const u16, u32) -> usize>(
                *(0x18 as *const u16) as usize,
            );
        for (i, tag) in ROM_TAGS.iter().enumerate() {
            ROM_ENTRIES[i] = lookup(table, u16::from_le_bytes(*tag) as u32);
        }
    }
}

/// The ROM addresses flash by offset from the start of the chip, not by
/// XIP address.
fn addr_to_offset(abs_addr: u32) -> u32 {
    abs_addr - FLASH_BASE
}

/// Byte-wise volatile read out of the memory-mapped XIP window.
pub fn read(abs_addr: u32, buf: &mut [u8]) {
    for (i, slot) in buf.iter_mut().enumerate() {
        *slot = unsafe { ((abs_addr + i as u32) as *const u8).read_volatile() };
    }
}

/// Erase every 4KB sector intersecting `[abs_addr, abs_addr + len)`.
pub fn erase(abs_addr: u32, len: u32) -> Result<(), FlashError> {
    if len == 0 {
        return Ok(());
    }
    let first = addr_to_offset(abs_addr) & !(FLASH_SECTOR_SIZE - 1);
    let last = (addr_to_offset(abs_addr) + len - 1) & !(FLASH_SECTOR_SIZE - 1);
    unsafe {
        rom_erase(first, last - first + FLASH_SECTOR_SIZE);
    }
    Ok(())
}

/// Program an arbitrary byte range. Each affected 256-byte page is read
/// back, merged with the new bytes, and reprogrammed.
pub fn program(abs_addr: u32, data: &[u8]) -> Result<(), FlashError> {
    let mut written = 0usize;
    while written < data.len() {
        let addr = abs_addr + written as u32;
        let page_base = addr & !(FLASH_PAGE_SIZE - 1);
        let in_page = (addr - page_base) as usize;
        let take = data.len() - written;
        let take = take.min(FLASH_PAGE_SIZE as usize - in_page);

        let mut page = [0xFFu8; FLASH_PAGE_SIZE as usize];
        read(page_base, &mut page);
        page[in_page..in_page + take].copy_from_slice(&data[written..written + take]);

        unsafe {
            rom_program(addr_to_offset(page_base), page.as_ptr(), page.len());
        }
        written += take;
    }
    Ok(())
}

/// One whole ROM erase cycle: XIP down, erase, XIP back up. Interrupts
/// stay masked across the window so nothing fetches from flash meanwhile.
///
/// # Safety
/// [`init`] must have resolved the ROM table first.
#[link_section = ".data"]
#[inline(never)]
unsafe fn rom_erase(offset: u32, size: u32) {
    let connect: unsafe extern "C" fn() =
        core::mem::transmute(ROM_ENTRIES[CONNECT_INTERNAL_FLASH]);
    let exit_xip: unsafe extern "C" fn() = core::mem::transmute(ROM_ENTRIES[FLASH_EXIT_XIP]);
    let range_erase: unsafe extern "C" fn(u32, usize, u32, u8) =
        core::mem::transmute(ROM_ENTRIES[FLASH_RANGE_ERASE]);
    let flush_cache: unsafe extern "C" fn() =
        core::mem::transmute(ROM_ENTRIES[FLASH_FLUSH_CACHE]);
    let enter_xip: unsafe extern "C" fn() =
        core::mem::transmute(ROM_ENTRIES[FLASH_ENTER_CMD_XIP]);

    cortex_m::interrupt::disable();
    connect();
    exit_xip();
    range_erase(offset, size as usize, FLASH_SECTOR_SIZE, SECTOR_ERASE_CMD);
    flush_cache();
    enter_xip();
    cortex_m::interrupt::enable();
}

/// One whole ROM program cycle, same XIP discipline as [`rom_erase`].
///
/// # Safety
/// [`init`] must have resolved the ROM table first.
#[link_section = ".data"]
#[inline(never)]
unsafe fn rom_program(offset: u32, data: *const u8, len: usize) {
    let connect: unsafe extern "C" fn() =
        core::mem::transmute(ROM_ENTRIES[CONNECT_INTERNAL_FLASH]);
    let exit_xip: unsafe extern "C" fn() = core::mem::transmute(ROM_ENTRIES[FLASH_EXIT_XIP]);
    let range_program: unsafe extern "C" fn(u32, *const u8, usize) =
        core::mem::transmute(ROM_ENTRIES[FLASH_RANGE_PROGRAM]);
    let flush_cache: unsafe extern "C" fn() =
        core::mem::transmute(ROM_ENTRIES[FLASH_FLUSH_CACHE]);
    let enter_xip: unsafe extern "C" fn() =
        core::mem::transmute(ROM_ENTRIES[FLASH_ENTER_CMD_XIP]);

    cortex_m::interrupt::disable();
    connect();
    exit_xip();
    range_program(offset, data, len);
    flush_cache();
    enter_xip();
    cortex_m::interrupt::enable();
}
