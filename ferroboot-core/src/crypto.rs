// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Ferroboot Contributors

//! Crypto facade: byte-oriented operations over raw block primitives.
//!
//! [`SoftCrypto`] is the software baseline usable on any MCU. Ports with
//! AES/SHA/ECC peripherals can supply their own [`CryptoOps`] instead; the
//! core only ever talks to the trait.

use aes::cipher::generic_array::GenericArray;
use aes::cipher::{BlockDecrypt, BlockEncrypt, KeyInit};
use aes::Aes128;
use p256::ecdsa::signature::hazmat::PrehashVerifier;
use p256::ecdsa::{Signature, VerifyingKey};
use sha2::{Digest, Sha256};

use crate::error::CryptoError;

/// AES block size; all slot data movement happens in units of this.
pub const AES_BLOCK: usize = 16;

/// Key material embedded in the bootloader binary.
#[derive(Clone, Copy)]
pub struct KeySet {
    /// AES-128 symmetric secret shared with the image packaging tool.
    pub aes: [u8; 16],
    /// ECDSA P-256 public key, uncompressed `x ‖ y`.
    pub ecdsa_pub: [u8; 64],
}

/// Cryptographic capability set. Return convention mirrors the flash
/// primitives: `Ok` or an error code, no partial output on failure.
pub trait CryptoOps {
    fn aes128_encrypt_block(
        &mut self,
        key: &[u8; 16],
        input: &[u8; 16],
        output: &mut [u8; 16],
    ) -> Result<(), CryptoError>;

    fn aes128_decrypt_block(
        &mut self,
        key: &[u8; 16],
        input: &[u8; 16],
        output: &mut [u8; 16],
    ) -> Result<(), CryptoError>;

    /// Begin a SHA-256 digest. Any in-progress digest is discarded.
    fn sha256_begin(&mut self) -> Result<(), CryptoError>;
    fn sha256_update(&mut self, data: &[u8]) -> Result<(), CryptoError>;
    fn sha256_finish(&mut self, digest: &mut [u8; 32]) -> Result<(), CryptoError>;

    /// Verify an ECDSA P-256 signature (`r ‖ s`) over a precomputed digest.
    fn ecdsa_p256_verify(
        &mut self,
        pub_xy: &[u8; 64],
        digest: &[u8; 32],
        signature: &[u8; 64],
    ) -> Result<(), CryptoError>;
}

struct CachedCipher {
    key: [u8; 16],
    cipher: Aes128,
}

/// Software crypto backend.
///
/// The AES key schedule is cached so that repeated calls with the same key
/// (thousands of blocks during a slot decrypt) do not recompute it on every
/// block. The cache is keyed on bitwise key equality; correctness does not
/// depend on it.
pub struct SoftCrypto {
    cached: Option<CachedCipher>,
    sha: Option<Sha256>,
}

impl SoftCrypto {
    pub const fn new() -> Self {
        Self {
            cached: None,
            sha: None,
        }
    }

    fn cipher_for(&mut self, key: &[u8; 16]) -> &Aes128 {
        let stale = !matches!(&self.cached, Some(c) if c.key == *key);
        if stale {
            self.cached = None;
        }
        let key = *key;
        let cached = self.cached.get_or_insert_with(|| CachedCipher {
            key,
            cipher: Aes128::new(GenericArray::from_slice(&key)),
        });
        &cached.cipher
    }
}

impl Default for SoftCrypto {
    fn default() -> Self {
        Self::new()
    }
}

impl CryptoOps for SoftCrypto {
    fn aes128_encrypt_block(
        &mut self,
        key: &[u8; 16],
        input: &[u8; 16],
        output: &mut [u8; 16],
    ) -> Result<(), CryptoError> {
        let cipher = self.cipher_for(key);
        let mut block = GenericArray::clone_from_slice(input);
        cipher.encrypt_block(&mut block);
        output.copy_from_slice(&block);
        Ok(())
    }

    fn aes128_decrypt_block(
        &mut self,
        key: &[u8; 16],
        input: &[u8; 16],
        output: &mut [u8; 16],
    ) -> Result<(), CryptoError> {
        let cipher = self.cipher_for(key);
        let mut block = GenericArray::clone_from_slice(input);
        cipher.decrypt_block(&mut block);
        output.copy_from_slice(&block);
        Ok(())
    }

    fn sha256_begin(&mut self) -> Result<(), CryptoError> {
        self.sha = Some(Sha256::new());
        Ok(())
    }

    fn sha256_update(&mut self, data: &[u8]) -> Result<(), CryptoError> {
        match &mut self.sha {
            Some(state) => {
                state.update(data);
                Ok(())
            }
            None => Err(CryptoError::Hash),
        }
    }

    fn sha256_finish(&mut self, digest: &mut [u8; 32]) -> Result<(), CryptoError> {
        match self.sha.take() {
            Some(state) => {
                digest.copy_from_slice(&state.finalize());
                Ok(())
            }
            None => Err(CryptoError::Hash),
        }
    }

    fn ecdsa_p256_verify(
        &mut self,
        pub_xy: &[u8; 64],
        digest: &[u8; 32],
        signature: &[u8; 64],
    ) -> Result<(), CryptoError> {
        // SEC1 uncompressed point: 0x04 tag followed by x ‖ y
        let mut sec1 = [0u8; 65];
        sec1[0] = 0x04;
        sec1[1..].copy_from_slice(pub_xy);

        let key = VerifyingKey::from_sec1_bytes(&sec1).map_err(|_| CryptoError::Ecdsa)?;
        let sig = Signature::from_slice(signature).map_err(|_| CryptoError::Ecdsa)?;
        key.verify_prehash(digest, &sig)
            .map_err(|_| CryptoError::Ecdsa)
    }
}
