//! # Engine Boundary
//!
//! The engine is the opaque cryptographic implementation. It is reached
//! through a narrow surface: five named buffers that can be written and read,
//! and five operations that take only lengths.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        ENGINE BOUNDARY                                  │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │   write(buffer, bytes)           ┌────────────────────────────────┐    │
//! │  ───────────────────────────────►│  secret-key   [32]             │    │
//! │                                  │  public-key   [48]             │    │
//! │   read(buffer, len)              │  signature    [96]             │    │
//! │  ◄───────────────────────────────│  message      [1_049_600]      │    │
//! │                                  │  ciphertext   [1_049_600]      │    │
//! │                                  └───────────────┬────────────────┘    │
//! │   derive_from_secret()                           │                     │
//! │   sign_message(msg_len)                          ▼                     │
//! │   verify_signature(msg_len) -> bool      ┌──────────────┐              │
//! │   encrypt_message(msg_len, hi, lo) -> n  │    Scheme    │              │
//! │   decrypt_ciphertext(ct_len) -> n        │ (crypto lib) │              │
//! │                                          └──────────────┘              │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Buffers keep whatever was last written to them. Callers that care about
//! residue call [`Engine::scrub`] after every operation; the adapter does.

mod buffered;
mod buffers;

#[cfg(feature = "threshold")]
mod threshold;

#[cfg(test)]
pub(crate) mod fake;

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use buffered::{BufferedEngine, Scheme};
pub use buffers::EngineBuffers;

#[cfg(feature = "threshold")]
pub use threshold::{ThresholdEngine, ThresholdScheme};

/// Size of a secret key in bytes
pub const SECRET_KEY_SIZE: usize = 32;

/// Size of a public key in bytes
pub const PUBLIC_KEY_SIZE: usize = 48;

/// Size of a signature in bytes
pub const SIGNATURE_SIZE: usize = 96;

/// Largest message the engine accepts (1 MiB + 1 KiB)
pub const MAX_MESSAGE_SIZE: usize = 1_049_600;

/// Largest ciphertext the engine can hold (1 MiB + 1 KiB)
pub const MAX_CIPHERTEXT_SIZE: usize = 1_049_600;

/// One of the engine's shared buffers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BufferName {
    /// Secret key input
    SecretKey,
    /// Public key input or output
    PublicKey,
    /// Signature input or output
    Signature,
    /// Message input or decrypted output
    Message,
    /// Ciphertext input or output
    Ciphertext,
}

impl BufferName {
    /// Every buffer, in storage order
    pub const ALL: [BufferName; 5] = [
        BufferName::SecretKey,
        BufferName::PublicKey,
        BufferName::Signature,
        BufferName::Message,
        BufferName::Ciphertext,
    ];

    /// Number of bytes the buffer holds
    pub const fn capacity(self) -> usize {
        match self {
            BufferName::SecretKey => SECRET_KEY_SIZE,
            BufferName::PublicKey => PUBLIC_KEY_SIZE,
            BufferName::Signature => SIGNATURE_SIZE,
            BufferName::Message => MAX_MESSAGE_SIZE,
            BufferName::Ciphertext => MAX_CIPHERTEXT_SIZE,
        }
    }

    pub(crate) const fn index(self) -> usize {
        match self {
            BufferName::SecretKey => 0,
            BufferName::PublicKey => 1,
            BufferName::Signature => 2,
            BufferName::Message => 3,
            BufferName::Ciphertext => 4,
        }
    }

    /// Buffer name as used in logs
    pub const fn as_str(self) -> &'static str {
        match self {
            BufferName::SecretKey => "secret-key",
            BufferName::PublicKey => "public-key",
            BufferName::Signature => "signature",
            BufferName::Message => "message",
            BufferName::Ciphertext => "ciphertext",
        }
    }
}

impl fmt::Display for BufferName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure reported from the engine side of the boundary
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineFault {
    /// Data does not fit the named buffer
    #[error("{len} bytes do not fit the {buffer} buffer (capacity {capacity})")]
    Overflow {
        /// Target buffer
        buffer: BufferName,
        /// Requested length
        len: usize,
        /// Buffer capacity
        capacity: usize,
    },

    /// The secret key buffer does not hold a valid secret key
    #[error("secret key rejected by the engine")]
    SecretKeyRejected,

    /// A buffer holds bytes the engine cannot parse
    #[error("malformed {0} in engine buffer")]
    Malformed(BufferName),

    /// The engine panicked while handling the call
    #[error("engine panicked: {0}")]
    Panicked(String),

    /// Any other failure inside the engine
    #[error("engine failure: {0}")]
    Backend(String),
}

/// Result type for calls across the engine boundary
pub type EngineResult<T> = std::result::Result<T, EngineFault>;

/// The engine capability surface.
///
/// Every operation reads its inputs from and writes its outputs to the named
/// buffers; only lengths and entropy words travel as arguments.
pub trait Engine: Send {
    /// Copy `bytes` into `buffer` starting at offset zero.
    fn write(&mut self, buffer: BufferName, bytes: &[u8]) -> EngineResult<()>;

    /// Copy the first `len` bytes of `buffer` out.
    fn read(&self, buffer: BufferName, len: usize) -> EngineResult<Vec<u8>>;

    /// Zero every byte written since the last scrub.
    fn scrub(&mut self);

    /// secret-key -> public-key
    fn derive_from_secret(&mut self) -> EngineResult<()>;

    /// (secret-key, message[..message_len]) -> signature
    fn sign_message(&mut self, message_len: usize) -> EngineResult<()>;

    /// (public-key, signature, message[..message_len]) -> validity
    fn verify_signature(&mut self, message_len: usize) -> EngineResult<bool>;

    /// (public-key, message[..message_len]) -> ciphertext, returns its length
    fn encrypt_message(
        &mut self,
        message_len: usize,
        entropy_hi: u32,
        entropy_lo: u32,
    ) -> EngineResult<usize>;

    /// (secret-key, ciphertext[..ciphertext_len]) -> message, returns its
    /// length; zero means the ciphertext was refused
    fn decrypt_ciphertext(&mut self, ciphertext_len: usize) -> EngineResult<usize>;
}
