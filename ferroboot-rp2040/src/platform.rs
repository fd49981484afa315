// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Ferroboot Contributors

//! `Platform` implementation for the RP2040.

use cortex_m::peripheral::SCB;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, StatefulOutputPin};

use ferroboot_core::error::FlashError;
use ferroboot_core::{MemoryMap, Platform};

use crate::flash;
use crate::layout;
use crate::peripherals::Peripherals;

pub struct Rp2040Platform {
    p: Peripherals,
}

impl Rp2040Platform {
    pub fn new(p: Peripherals) -> Self {
        Self { p }
    }
}

impl Platform for Rp2040Platform {
    fn init(&mut self) {
        // Clocks, UART, and GPIO are already up (peripherals::init); the
        // ROM flash pointers are resolved in main before anything runs
    }

    fn memory_map(&self) -> MemoryMap {
        layout::memory_map()
    }

    fn flash_read(&self, addr: u32, buf: &mut [u8]) {
        flash::read(addr, buf);
    }

    fn flash_unlock(&mut self) {
        // The RP2040 flash controller has no lock; the XIP dance inside
        // the ROM wrappers is the whole protocol
    }

    fn flash_lock(&mut self) {}

    fn flash_erase(&mut self, addr: u32, len: u32) -> Result<(), FlashError> {
        flash::erase(addr, len)
    }

    fn flash_write(&mut self, addr: u32, data: &[u8]) -> Result<(), FlashError> {
        flash::program(addr, data)
    }

    fn uart_write(&mut self, data: &[u8]) {
        self.p.uart.write_full_blocking(data);
    }

    fn trigger_pressed(&mut self) -> bool {
        // Active low: the button shorts GP2 to ground
        self.p.button.is_low().unwrap_or(false)
    }

    fn toggle_led(&mut self) {
        let _ = self.p.led.toggle();
    }

    fn irq_disable(&mut self) {
        cortex_m::interrupt::disable();
    }

    fn irq_enable(&mut self) {
        unsafe { cortex_m::interrupt::enable() };
    }

    fn delay_ms(&mut self, ms: u32) {
        self.p.timer.delay_ms(ms);
    }

    fn ticks(&self) -> u32 {
        (self.p.timer.get_counter().ticks() / 1000) as u32
    }

    fn system_reset(&mut self) {
        SCB::sys_reset();
    }

    fn jump_to_app(&mut self) {
        let app_addr = layout::APP_ACTIVE_ADDR;
        let initial_sp = unsafe { (app_addr as *const u32).read_volatile() };
        let reset_vector = unsafe { (app_addr as *const u32).offset(1).read_volatile() };

        // The application's initial SP must land in SRAM, or the image is
        // not something we can hand control to
        if initial_sp & 0xFF00_0000 != layout::RAM_BASE {
            return;
        }

        unsafe {
            cortex_m::interrupt::disable();

            // Quiesce the NVIC so the application starts from a clean slate
            const NVIC_ICER: *mut u32 = 0xE000_E180 as *mut u32;
            const NVIC_ICPR: *mut u32 = 0xE000_E280 as *mut u32;
            NVIC_ICER.write_volatile(0xFFFF_FFFF);
            NVIC_ICPR.write_volatile(0xFFFF_FFFF);

            // Vector table now lives at the Active slot
            const SCB_VTOR: *mut u32 = 0xE000_ED08 as *mut u32;
            SCB_VTOR.write_volatile(app_addr);
            cortex_m::asm::dsb();
            cortex_m::asm::isb();

            core::arch::asm!(
                "msr msp, {sp}",
                "cpsie i",
                "bx {reset}",
                sp = in(reg) initial_sp,
                reset = in(reg) reset_vector,
                options(noreturn)
            );
        }
    }

    fn error_handler(&mut self) {
        cortex_m::interrupt::disable();
        loop {
            let _ = self.p.led.toggle();
            self.p.timer.delay_ms(250u32);
        }
    }
}
