// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Ferroboot Contributors

//! Error taxonomy shared by the validator, swap engine, and orchestrator.

/// Flash storage failures reported by the platform primitives.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlashError {
    /// A sector/erase-unit erase did not complete.
    Erase,
    /// Programming failed or verified back incorrectly.
    Write,
    /// The flash controller is locked.
    Locked,
    /// A platform-defined hardware timeout expired.
    Timeout,
    /// Invalid address/length for the operation.
    Param,
}

/// Cryptographic primitive failures.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CryptoError {
    /// AES key schedule or block operation failed.
    Aes,
    /// SHA-256 digest could not be produced.
    Hash,
    /// ECDSA key or signature material was rejected, or verification failed.
    Ecdsa,
}

/// Firmware image validation failures.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImageError {
    /// No footer magic in the slot.
    FooterNotFound,
    /// A footer was located but its fields are inconsistent.
    FooterBad,
    /// The declared payload size does not fit the slot or the cipher block.
    ImageSizeBad,
    /// The candidate image's reset vector does not point into flash.
    VectorBad,
    /// Hashing the payload failed.
    HashFail,
    /// The ECDSA signature did not verify.
    SigFail,
}

/// Top-level error for a boot transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Error {
    Flash(FlashError),
    Crypto(CryptoError),
    Image(ImageError),
}

impl From<FlashError> for Error {
    fn from(e: FlashError) -> Self {
        Error::Flash(e)
    }
}

impl From<CryptoError> for Error {
    fn from(e: CryptoError) -> Self {
        Error::Crypto(e)
    }
}

impl From<ImageError> for Error {
    fn from(e: ImageError) -> Self {
        Error::Image(e)
    }
}
