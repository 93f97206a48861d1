//! # threshold_crypto Engine
//!
//! [`Scheme`] implementation over the `threshold_crypto` crate (BLS12-381).
//!
//! | Material | Encoding |
//! |----------|----------|
//! | Secret key | bincode of the scalar (32 bytes); values at or above the field modulus are rejected |
//! | Public key | compressed G1 point (48 bytes) |
//! | Signature | compressed G2 point (96 bytes) |
//! | Ciphertext | bincode of `threshold_crypto::Ciphertext` |
//!
//! The 64 entropy bits passed to `encrypt_message` seed a ChaCha20 generator
//! that supplies all encryption randomness for that one call.

use rand_chacha02::rand_core::SeedableRng;
use rand_chacha02::ChaCha20Rng;
use threshold_crypto::{Ciphertext, PublicKey, SecretKey, Signature};

use super::{
    BufferName, BufferedEngine, EngineFault, EngineResult, Scheme, PUBLIC_KEY_SIZE,
    SIGNATURE_SIZE,
};

/// The production engine: buffers plus threshold_crypto
pub type ThresholdEngine = BufferedEngine<ThresholdScheme>;

/// BLS12-381 scheme from `threshold_crypto`
#[derive(Debug, Default, Clone, Copy)]
pub struct ThresholdScheme;

impl ThresholdEngine {
    /// Build an engine backed by threshold_crypto
    pub fn threshold() -> Self {
        BufferedEngine::new(ThresholdScheme)
    }
}

fn secret_key(bytes: &[u8]) -> EngineResult<SecretKey> {
    bincode::deserialize(bytes).map_err(|_| EngineFault::SecretKeyRejected)
}

fn public_key(bytes: &[u8]) -> EngineResult<PublicKey> {
    let bytes: [u8; PUBLIC_KEY_SIZE] = bytes
        .try_into()
        .map_err(|_| EngineFault::Malformed(BufferName::PublicKey))?;
    PublicKey::from_bytes(bytes).map_err(|_| EngineFault::Malformed(BufferName::PublicKey))
}

fn signature(bytes: &[u8]) -> EngineResult<Signature> {
    let bytes: [u8; SIGNATURE_SIZE] = bytes
        .try_into()
        .map_err(|_| EngineFault::Malformed(BufferName::Signature))?;
    Signature::from_bytes(bytes).map_err(|_| EngineFault::Malformed(BufferName::Signature))
}

impl Scheme for ThresholdScheme {
    fn public_key(&self, secret: &[u8]) -> EngineResult<[u8; PUBLIC_KEY_SIZE]> {
        Ok(secret_key(secret)?.public_key().to_bytes())
    }

    fn sign(&self, secret: &[u8], message: &[u8]) -> EngineResult<[u8; SIGNATURE_SIZE]> {
        Ok(secret_key(secret)?.sign(message).to_bytes())
    }

    fn verify(&self, public: &[u8], sig: &[u8], message: &[u8]) -> EngineResult<bool> {
        // Material that is not a curve point cannot verify anything.
        match (public_key(public), signature(sig)) {
            (Ok(public), Ok(sig)) => Ok(public.verify(&sig, message)),
            _ => Ok(false),
        }
    }

    fn encrypt(&self, public: &[u8], message: &[u8], seed: u64) -> EngineResult<Vec<u8>> {
        let public = public_key(public)?;
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let ciphertext = public.encrypt_with_rng(&mut rng, message);
        bincode::serialize(&ciphertext).map_err(|e| EngineFault::Backend(e.to_string()))
    }

    fn decrypt(&self, secret: &[u8], ciphertext: &[u8]) -> EngineResult<Option<Vec<u8>>> {
        let secret = secret_key(secret)?;
        let ciphertext: Ciphertext = bincode::deserialize(ciphertext)
            .map_err(|_| EngineFault::Malformed(BufferName::Ciphertext))?;
        if !ciphertext.verify() {
            return Ok(None);
        }
        Ok(secret.decrypt(&ciphertext))
    }
}
