//! # Key Material
//!
//! Fixed-size values that cross the engine boundary.
//!
//! | Type | Size | Hex length |
//! |------|------|------------|
//! | [`SecretKey`] | 32 bytes | 64 |
//! | [`PublicKey`] | 48 bytes | 96 |
//! | [`Signature`] | 96 bytes | 192 |
//!
//! The secret key is zeroized on drop and never printed.

use std::fmt;

use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::codec;
use crate::engine::{PUBLIC_KEY_SIZE, SECRET_KEY_SIZE, SIGNATURE_SIZE};
use crate::error::Result;

/// A 32-byte secret key.
///
/// Not every 32-byte string is a valid key; only the engine can tell.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SecretKey([u8; SECRET_KEY_SIZE]);

impl SecretKey {
    /// Wrap raw bytes
    pub fn from_bytes(bytes: [u8; SECRET_KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Parse exactly 64 hex characters
    pub fn from_hex(text: &str) -> Result<Self> {
        codec::decode_exact(text, "secret key").map(Self)
    }

    /// Borrow the raw bytes
    ///
    /// ## Security Warning
    ///
    /// Never log or transmit these bytes outside the engine boundary.
    pub fn as_bytes(&self) -> &[u8; SECRET_KEY_SIZE] {
        &self.0
    }

    /// Lowercase hex, for writing back into the secret key field
    pub fn to_hex(&self) -> String {
        codec::hex_encode(&self.0)
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretKey(..)")
    }
}

/// A 48-byte public key
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct PublicKey([u8; PUBLIC_KEY_SIZE]);

impl PublicKey {
    /// Wrap raw bytes
    pub fn from_bytes(bytes: [u8; PUBLIC_KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Parse exactly 96 hex characters
    pub fn from_hex(text: &str) -> Result<Self> {
        codec::decode_exact(text, "public key").map(Self)
    }

    /// Borrow the raw bytes
    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_SIZE] {
        &self.0
    }

    /// Lowercase hex
    pub fn to_hex(&self) -> String {
        codec::hex_encode(&self.0)
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self.to_hex())
    }
}

/// A 96-byte signature
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature([u8; SIGNATURE_SIZE]);

impl Signature {
    /// Wrap raw bytes
    pub fn from_bytes(bytes: [u8; SIGNATURE_SIZE]) -> Self {
        Self(bytes)
    }

    /// Parse exactly 192 hex characters
    pub fn from_hex(text: &str) -> Result<Self> {
        codec::decode_exact(text, "signature").map(Self)
    }

    /// Borrow the raw bytes
    pub fn as_bytes(&self) -> &[u8; SIGNATURE_SIZE] {
        &self.0
    }

    /// Lowercase hex
    pub fn to_hex(&self) -> String {
        codec::hex_encode(&self.0)
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({})", self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_secret_key_hex_roundtrip() {
        let hex = "0A".repeat(32);
        let sk = SecretKey::from_hex(&hex).unwrap();
        assert_eq!(sk.as_bytes(), &[0x0a; 32]);
        assert_eq!(sk.to_hex(), "0a".repeat(32));
    }

    #[test]
    fn test_secret_key_debug_is_redacted() {
        let sk = SecretKey::from_bytes([0xab; 32]);
        assert_eq!(format!("{sk:?}"), "SecretKey(..)");
    }

    #[test]
    fn test_wrong_lengths_are_rejected() {
        assert!(matches!(
            SecretKey::from_hex(&"00".repeat(31)),
            Err(Error::InvalidInput { field: "secret key", .. })
        ));
        assert!(matches!(
            PublicKey::from_hex(&"00".repeat(32)),
            Err(Error::InvalidInput { field: "public key", .. })
        ));
        assert!(matches!(
            Signature::from_hex(&"00".repeat(95)),
            Err(Error::InvalidInput { field: "signature", .. })
        ));
    }

    #[test]
    fn test_signature_hex_length() {
        let sig = Signature::from_bytes([1; 96]);
        assert_eq!(sig.to_hex().len(), 192);
        assert_eq!(Signature::from_hex(&sig.to_hex()).unwrap(), sig);
    }
}
