// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Ferroboot Contributors

//! Platform capability set: memory map, flash I/O, GPIO, reset, and the
//! application trampoline.
//!
//! The core never references a platform constant directly; every address
//! comes from the [`MemoryMap`] and every side effect goes through a
//! [`Platform`] method. Ports implement this trait once (see the rp2040
//! crate); the host tests implement it with a RAM-backed mock.

use crate::error::FlashError;

/// Immutable descriptor of the platform's flash topology.
///
/// The three application slots are disjoint, equal in size, and each is at
/// least one erase unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MemoryMap {
    /// Base of the configuration sector.
    pub config_addr: u32,
    /// Base of the Active slot (plaintext, executable application).
    pub app_active_addr: u32,
    /// Base of the Download/Backup slot.
    pub app_download_addr: u32,
    /// Base of the Scratch slot (transient workspace).
    pub scratch_addr: u32,
    /// Byte size of each of the three application slots.
    pub slot_size: u32,
    /// Flash base address, used to sanity-check reset vectors.
    pub flash_base: u32,
    /// RAM base address, used to sanity-check initial stack pointers.
    pub ram_base: u32,
}

impl MemoryMap {
    /// Check that the three application slots do not overlap.
    pub fn slots_disjoint(&self) -> bool {
        let mut slots = [
            self.app_active_addr,
            self.app_download_addr,
            self.scratch_addr,
        ];
        slots.sort_unstable();
        slots[0] + self.slot_size <= slots[1] && slots[1] + self.slot_size <= slots[2]
    }
}

/// Hardware capability set consumed by the whole core.
///
/// Flash primitives have a total-function contract: they return `Ok` or an
/// error code, and a failed call leaves no partial write behind that the
/// next boot cannot recover from. `erase` erases every erase unit that
/// intersects `[addr, addr + len)`; `unlock`/`lock` are idempotent.
pub trait Platform {
    /// One-time platform bring-up (clocks, UART, GPIO).
    fn init(&mut self);

    /// The platform's flash topology.
    fn memory_map(&self) -> MemoryMap;

    /// Copy `buf.len()` bytes out of flash starting at `addr`.
    fn flash_read(&self, addr: u32, buf: &mut [u8]);

    fn flash_unlock(&mut self);
    fn flash_lock(&mut self);

    /// Erase every erase unit intersecting `[addr, addr + len)`.
    fn flash_erase(&mut self, addr: u32, len: u32) -> Result<(), FlashError>;

    /// Program `data.len()` bytes starting at `addr`.
    fn flash_write(&mut self, addr: u32, data: &[u8]) -> Result<(), FlashError>;

    /// Transmit raw bytes on the log UART.
    fn uart_write(&mut self, data: &[u8]);

    /// Sample the boot trigger button. `true` means pressed.
    fn trigger_pressed(&mut self) -> bool;

    /// Toggle the status LED.
    fn toggle_led(&mut self);

    /// Globally mask interrupts. Paired with [`Platform::irq_enable`].
    fn irq_disable(&mut self);
    fn irq_enable(&mut self);

    /// Blocking millisecond delay.
    fn delay_ms(&mut self, ms: u32);

    /// Millisecond tick counter since reset.
    fn ticks(&self) -> u32;

    /// Request a system reset. On hardware this does not return; the host
    /// mock records the request so transitions stay testable.
    fn system_reset(&mut self);

    /// Tear down peripherals, relocate the vector table to the Active slot,
    /// set MSP, and jump to the application's reset handler. Never returns
    /// on success; returns if the Active slot's initial SP is implausible.
    fn jump_to_app(&mut self);

    /// Terminal failure path: mask IRQs and blink the status LED forever.
    fn error_handler(&mut self);
}

/// Read a little-endian 32-bit word from flash.
pub fn read_u32<P: Platform + ?Sized>(platform: &P, addr: u32) -> u32 {
    let mut raw = [0u8; 4];
    platform.flash_read(addr, &mut raw);
    u32::from_le_bytes(raw)
}
