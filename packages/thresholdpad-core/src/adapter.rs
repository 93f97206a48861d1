//! # Engine Adapter
//!
//! Single-flight wrapper around an [`Engine`].
//!
//! ## Call Sequence
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        ONE ENGINE CALL                                  │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  1. acquire session      mutex locked, adapter reports busy            │
//! │  2. write inputs         one bulk write per named buffer               │
//! │  3. invoke               lengths (and entropy words) only              │
//! │  4. read result          exactly the declared number of bytes          │
//! │  5. scrub + release      always, on success, error or panic            │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The engine value lives inside the adapter's mutex, so the only way to
//! reach its buffers is through an [`EngineSession`]. [`EngineAdapter::try_session`]
//! acquires atomically or not at all.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use parking_lot::{Mutex, MutexGuard};
use serde::{Deserialize, Serialize};

use crate::engine::{
    BufferName, Engine, EngineFault, EngineResult, MAX_CIPHERTEXT_SIZE, MAX_MESSAGE_SIZE,
    PUBLIC_KEY_SIZE, SIGNATURE_SIZE,
};
use crate::error::{Error, Result};
use crate::material::{PublicKey, SecretKey, Signature};

/// Engine operation, used for logging and error classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Secret key to public key
    DeriveKey,
    /// Sign a message
    Sign,
    /// Verify a signature
    Verify,
    /// Encrypt a message
    Encrypt,
    /// Decrypt a ciphertext
    Decrypt,
}

impl Operation {
    /// Operation name as used in logs
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::DeriveKey => "derive_key",
            Operation::Sign => "sign",
            Operation::Verify => "verify",
            Operation::Encrypt => "encrypt",
            Operation::Decrypt => "decrypt",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 64 bits of encryption randomness, split the way the engine takes it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncryptionEntropy {
    /// High 32 bits
    pub hi: u32,
    /// Low 32 bits
    pub lo: u32,
}

impl EncryptionEntropy {
    /// Split eight random bytes into two words
    pub fn from_bytes(bytes: [u8; 8]) -> Self {
        let word = u64::from_be_bytes(bytes);
        Self {
            hi: (word >> 32) as u32,
            lo: word as u32,
        }
    }
}

/// Single-flight access to an engine
pub struct EngineAdapter<E> {
    engine: Mutex<E>,
    scrub: bool,
}

impl<E: Engine> EngineAdapter<E> {
    /// Wrap an engine; buffers are scrubbed after every operation
    pub fn new(engine: E) -> Self {
        Self {
            engine: Mutex::new(engine),
            scrub: true,
        }
    }

    /// Choose whether buffers are scrubbed after every operation.
    ///
    /// Without scrubbing, bytes past an operation's output length may hold
    /// residue from earlier calls.
    pub fn with_scrubbing(mut self, scrub: bool) -> Self {
        self.scrub = scrub;
        self
    }

    /// Whether an operation is in flight
    pub fn is_busy(&self) -> bool {
        self.engine.is_locked()
    }

    /// Acquire the engine if it is free, without waiting
    pub fn try_session(&self) -> Option<EngineSession<'_, E>> {
        self.engine.try_lock().map(|guard| EngineSession {
            guard,
            scrub: self.scrub,
        })
    }

    /// Acquire the engine, blocking the current thread until it is free
    pub fn session(&self) -> EngineSession<'_, E> {
        EngineSession {
            guard: self.engine.lock(),
            scrub: self.scrub,
        }
    }

    /// Unwrap the engine
    pub fn into_inner(self) -> E {
        self.engine.into_inner()
    }

    /// Derive the public key for `secret_key`
    pub fn derive_key(&self, secret_key: &SecretKey) -> Result<PublicKey> {
        self.session().derive_key(secret_key)
    }

    /// Sign `message`
    pub fn sign(&self, secret_key: &SecretKey, message: &[u8]) -> Result<Signature> {
        self.session().sign(secret_key, message)
    }

    /// Verify `signature` over `message`
    pub fn verify(
        &self,
        public_key: &PublicKey,
        signature: &Signature,
        message: &[u8],
    ) -> Result<bool> {
        self.session().verify(public_key, signature, message)
    }

    /// Encrypt `message` to `public_key`
    pub fn encrypt(
        &self,
        public_key: &PublicKey,
        message: &[u8],
        entropy: EncryptionEntropy,
    ) -> Result<Vec<u8>> {
        self.session().encrypt(public_key, message, entropy)
    }

    /// Decrypt `ciphertext`; an empty result means the engine refused it
    pub fn decrypt(&self, secret_key: &SecretKey, ciphertext: &[u8]) -> Result<Vec<u8>> {
        self.session().decrypt(secret_key, ciphertext)
    }
}

/// Exclusive access to the engine; released on drop
pub struct EngineSession<'a, E> {
    guard: MutexGuard<'a, E>,
    scrub: bool,
}

impl<'a, E: Engine> EngineSession<'a, E> {
    fn run<T>(
        &mut self,
        operation: Operation,
        call: impl FnOnce(&mut E) -> EngineResult<T>,
    ) -> Result<T> {
        let engine = &mut *self.guard;
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| call(&mut *engine)))
            .unwrap_or_else(|payload| Err(EngineFault::Panicked(panic_message(payload))));
        if self.scrub {
            self.guard.scrub();
        }
        outcome.map_err(|fault| {
            tracing::debug!(operation = %operation, "engine call failed: {}", fault);
            Error::EngineFault { operation, fault }
        })
    }

    /// Derive the public key for `secret_key`
    pub fn derive_key(&mut self, secret_key: &SecretKey) -> Result<PublicKey> {
        self.run(Operation::DeriveKey, |engine| {
            engine.write(BufferName::SecretKey, secret_key.as_bytes())?;
            engine.derive_from_secret()?;
            let bytes = engine.read(BufferName::PublicKey, PUBLIC_KEY_SIZE)?;
            fixed(bytes, BufferName::PublicKey).map(PublicKey::from_bytes)
        })
    }

    /// Sign `message`
    pub fn sign(&mut self, secret_key: &SecretKey, message: &[u8]) -> Result<Signature> {
        self.run(Operation::Sign, |engine| {
            engine.write(BufferName::SecretKey, secret_key.as_bytes())?;
            engine.write(BufferName::Message, message)?;
            engine.sign_message(message.len())?;
            let bytes = engine.read(BufferName::Signature, SIGNATURE_SIZE)?;
            fixed(bytes, BufferName::Signature).map(Signature::from_bytes)
        })
    }

    /// Verify `signature` over `message`
    pub fn verify(
        &mut self,
        public_key: &PublicKey,
        signature: &Signature,
        message: &[u8],
    ) -> Result<bool> {
        self.run(Operation::Verify, |engine| {
            engine.write(BufferName::PublicKey, public_key.as_bytes())?;
            engine.write(BufferName::Signature, signature.as_bytes())?;
            engine.write(BufferName::Message, message)?;
            engine.verify_signature(message.len())
        })
    }

    /// Encrypt `message` to `public_key`
    pub fn encrypt(
        &mut self,
        public_key: &PublicKey,
        message: &[u8],
        entropy: EncryptionEntropy,
    ) -> Result<Vec<u8>> {
        self.run(Operation::Encrypt, |engine| {
            engine.write(BufferName::PublicKey, public_key.as_bytes())?;
            engine.write(BufferName::Message, message)?;
            let len = engine.encrypt_message(message.len(), entropy.hi, entropy.lo)?;
            if len > MAX_CIPHERTEXT_SIZE {
                return Err(EngineFault::Overflow {
                    buffer: BufferName::Ciphertext,
                    len,
                    capacity: MAX_CIPHERTEXT_SIZE,
                });
            }
            engine.read(BufferName::Ciphertext, len)
        })
    }

    /// Decrypt `ciphertext`; an empty result means the engine refused it
    pub fn decrypt(&mut self, secret_key: &SecretKey, ciphertext: &[u8]) -> Result<Vec<u8>> {
        self.run(Operation::Decrypt, |engine| {
            engine.write(BufferName::SecretKey, secret_key.as_bytes())?;
            engine.write(BufferName::Ciphertext, ciphertext)?;
            let len = engine.decrypt_ciphertext(ciphertext.len())?;
            if len > MAX_MESSAGE_SIZE {
                return Err(EngineFault::Overflow {
                    buffer: BufferName::Message,
                    len,
                    capacity: MAX_MESSAGE_SIZE,
                });
            }
            engine.read(BufferName::Message, len)
        })
    }
}

fn fixed<const N: usize>(bytes: Vec<u8>, buffer: BufferName) -> EngineResult<[u8; N]> {
    bytes
        .try_into()
        .map_err(|_| EngineFault::Malformed(buffer))
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

// ============================================================================
// TESTS
// ============================================================================
