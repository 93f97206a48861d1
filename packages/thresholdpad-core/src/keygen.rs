//! # Key Generator
//!
//! Not every 32-byte string is a secret key the engine accepts, so keys are
//! sampled until the engine can derive a public key from one.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        KEY GENERATION                                   │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │   for attempt in 1..=max_attempts:                                     │
//! │       sk  = 32 bytes from the entropy source   (fail -> Unavailable)   │
//! │       pk  = derive_key(sk)                      (fail -> resample)     │
//! │       return (sk, pk)                                                  │
//! │   fail -> KeyGenerationExhausted                                       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use crate::adapter::EngineAdapter;
use crate::engine::{Engine, EngineFault, SECRET_KEY_SIZE};
use crate::entropy::EntropySource;
use crate::error::{Error, Result};
use crate::material::{PublicKey, SecretKey};

/// Default number of keys sampled before giving up
pub const DEFAULT_KEYGEN_ATTEMPTS: u32 = 20;

/// A freshly generated key pair
#[derive(Debug, Clone)]
pub struct GeneratedKeys {
    /// The accepted secret key
    pub secret_key: SecretKey,
    /// Its public key
    pub public_key: PublicKey,
    /// How many keys were sampled, including the accepted one
    pub attempts: u32,
}

/// Samples secret keys until the engine accepts one
pub struct KeyGenerator<E> {
    adapter: Arc<EngineAdapter<E>>,
    entropy: Arc<dyn EntropySource>,
    max_attempts: u32,
}

impl<E: Engine> KeyGenerator<E> {
    /// Create a generator with the default attempt budget
    pub fn new(adapter: Arc<EngineAdapter<E>>, entropy: Arc<dyn EntropySource>) -> Self {
        Self {
            adapter,
            entropy,
            max_attempts: DEFAULT_KEYGEN_ATTEMPTS,
        }
    }

    /// Set the attempt budget (at least one)
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// The attempt budget
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Generate a key pair the engine accepts.
    ///
    /// Each attempt holds the engine session only for its own derivation.
    pub fn generate(&self) -> Result<GeneratedKeys> {
        for attempt in 1..=self.max_attempts {
            let secret_key = self.sample()?;
            match self.adapter.derive_key(&secret_key) {
                Ok(public_key) => {
                    tracing::info!(attempts = attempt, "Generated key pair");
                    return Ok(GeneratedKeys {
                        secret_key,
                        public_key,
                        attempts: attempt,
                    });
                }
                Err(e) => {
                    if let Error::EngineFault {
                        fault: EngineFault::Panicked(_),
                        ..
                    } = &e
                    {
                        return Err(e);
                    }
                    tracing::debug!(attempt, "{}: {}", Error::KeyRejected, e);
                }
            }
        }

        tracing::warn!(attempts = self.max_attempts, "Key generation gave up");
        Err(Error::KeyGenerationExhausted {
            attempts: self.max_attempts,
        })
    }

    fn sample(&self) -> Result<SecretKey> {
        let mut bytes = zeroize::Zeroizing::new([0u8; SECRET_KEY_SIZE]);
        self.entropy.fill(&mut bytes[..])?;
        Ok(SecretKey::from_bytes(*bytes))
    }
}
