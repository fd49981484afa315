// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Ferroboot Contributors

//! Platform-independent core of the ferroboot secure firmware updater.
//!
//! On every reset the bootloader decides whether to boot the installed
//! application, install a pending update, or roll back to the previous
//! image, and performs those transitions atomically with respect to power
//! loss and cryptographically with respect to image authenticity.
//!
//! The crate is `no_std` and touches hardware exclusively through the
//! [`platform::Platform`] and [`crypto::CryptoOps`] capability traits, so
//! the whole state machine runs unmodified against a RAM-backed mock on
//! the host. The `ferroboot-rp2040` crate provides the real port.

#![no_std]

pub mod boot;
pub mod config;
pub mod crypto;
pub mod error;
pub mod footer;
pub mod image;
pub mod logger;
pub mod platform;
pub mod swap;

// Re-export the types most callers need
pub use boot::{BootOutcome, Bootloader};
pub use config::{BootConfig, SystemStatus, CONFIG_MAGIC};
pub use crypto::{CryptoOps, KeySet, SoftCrypto};
pub use error::{CryptoError, Error, FlashError, ImageError};
pub use footer::{FirmwareFooter, FOOTER_LEN, FOOTER_MAGIC};
pub use platform::{MemoryMap, Platform};
