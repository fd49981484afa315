// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Ferroboot Contributors

//! Ferroboot for RP2040: secure A/B/scratch firmware updater.

#![no_std]
#![no_main]

mod flash;
mod keys;
mod layout;
mod peripherals;
mod platform;

use defmt_rtt as _;
use panic_probe as _;

use ferroboot_core::{BootOutcome, Bootloader, SoftCrypto};

defmt::timestamp!("{=u64:us}", { 0 });

use cortex_m_rt::entry;

#[unsafe(link_section = ".boot2")]
#[used]
pub static BOOT2: [u8; 256] = rp2040_boot2::BOOT_LOADER_GENERIC_03H;

#[entry]
fn main() -> ! {
    defmt::println!("ferroboot init");

    flash::init();
    let p = peripherals::init();
    let platform = platform::Rp2040Platform::new(p);

    let mut bootloader = Bootloader::new(platform, SoftCrypto::new(), keys::key_set());

    match bootloader.run() {
        // On hardware a successful jump or reset never comes back; these
        // arms only run when the corresponding trait call returned early
        BootOutcome::Jumped | BootOutcome::ResetRequested => {
            cortex_m::peripheral::SCB::sys_reset()
        }
        BootOutcome::Aborted => {
            defmt::println!("transition aborted, resetting");
            cortex_m::peripheral::SCB::sys_reset()
        }
        BootOutcome::Halted => loop {
            cortex_m::asm::wfi();
        },
    }
}
