//! A buffer-holding [`Engine`] over a pluggable cryptographic [`Scheme`].

use zeroize::Zeroizing;

use super::{
    BufferName, Engine, EngineBuffers, EngineFault, EngineResult, PUBLIC_KEY_SIZE,
    SECRET_KEY_SIZE, SIGNATURE_SIZE,
};

/// The cryptographic library behind a [`BufferedEngine`].
///
/// Implementations receive byte slices of the exact sizes in
/// [`crate::engine`] and report unparseable inputs as [`EngineFault`]s.
pub trait Scheme: Send {
    /// Derive the public key for `secret_key`.
    fn public_key(&self, secret_key: &[u8]) -> EngineResult<[u8; PUBLIC_KEY_SIZE]>;

    /// Sign `message` with `secret_key`.
    fn sign(&self, secret_key: &[u8], message: &[u8]) -> EngineResult<[u8; SIGNATURE_SIZE]>;

    /// Check `signature` over `message` against `public_key`.
    fn verify(&self, public_key: &[u8], signature: &[u8], message: &[u8]) -> EngineResult<bool>;

    /// Encrypt `message` to `public_key`, seeding the randomness with `seed`.
    fn encrypt(&self, public_key: &[u8], message: &[u8], seed: u64) -> EngineResult<Vec<u8>>;

    /// Decrypt `ciphertext`; `None` when the ciphertext fails its integrity check.
    fn decrypt(&self, secret_key: &[u8], ciphertext: &[u8]) -> EngineResult<Option<Vec<u8>>>;
}

/// Engine that owns its buffers and hands their contents to a [`Scheme`].
pub struct BufferedEngine<S> {
    scheme: S,
    buffers: EngineBuffers,
}

impl<S: Scheme> BufferedEngine<S> {
    /// Create an engine with freshly allocated buffers
    pub fn new(scheme: S) -> Self {
        Self {
            scheme,
            buffers: EngineBuffers::new(),
        }
    }

    /// Inspect the buffers
    pub fn buffers(&self) -> &EngineBuffers {
        &self.buffers
    }

    /// The scheme this engine delegates to
    pub fn scheme(&self) -> &S {
        &self.scheme
    }
}

impl<S: Scheme> Engine for BufferedEngine<S> {
    fn write(&mut self, buffer: BufferName, bytes: &[u8]) -> EngineResult<()> {
        self.buffers.write(buffer, bytes)
    }

    fn read(&self, buffer: BufferName, len: usize) -> EngineResult<Vec<u8>> {
        Ok(self.buffers.get(buffer, len)?.to_vec())
    }

    fn scrub(&mut self) {
        self.buffers.scrub();
    }

    fn derive_from_secret(&mut self) -> EngineResult<()> {
        let secret_key = self.buffers.get(BufferName::SecretKey, SECRET_KEY_SIZE)?;
        let public_key = self.scheme.public_key(secret_key)?;
        self.buffers.write(BufferName::PublicKey, &public_key)
    }

    fn sign_message(&mut self, message_len: usize) -> EngineResult<()> {
        let secret_key = self.buffers.get(BufferName::SecretKey, SECRET_KEY_SIZE)?;
        let message = self.buffers.get(BufferName::Message, message_len)?;
        let signature = self.scheme.sign(secret_key, message)?;
        self.buffers.write(BufferName::Signature, &signature)
    }

    fn verify_signature(&mut self, message_len: usize) -> EngineResult<bool> {
        let public_key = self.buffers.get(BufferName::PublicKey, PUBLIC_KEY_SIZE)?;
        let signature = self.buffers.get(BufferName::Signature, SIGNATURE_SIZE)?;
        let message = self.buffers.get(BufferName::Message, message_len)?;
        self.scheme.verify(public_key, signature, message)
    }

    fn encrypt_message(
        &mut self,
        message_len: usize,
        entropy_hi: u32,
        entropy_lo: u32,
    ) -> EngineResult<usize> {
        let seed = (u64::from(entropy_hi) << 32) | u64::from(entropy_lo);
        let public_key = self.buffers.get(BufferName::PublicKey, PUBLIC_KEY_SIZE)?;
        let message = self.buffers.get(BufferName::Message, message_len)?;
        let ciphertext = self.scheme.encrypt(public_key, message, seed)?;
        self.buffers.write(BufferName::Ciphertext, &ciphertext)?;
        Ok(ciphertext.len())
    }

    fn decrypt_ciphertext(&mut self, ciphertext_len: usize) -> EngineResult<usize> {
        let secret_key = self.buffers.get(BufferName::SecretKey, SECRET_KEY_SIZE)?;
        let ciphertext = self.buffers.get(BufferName::Ciphertext, ciphertext_len)?;
        match self.scheme.decrypt(secret_key, ciphertext)? {
            Some(message) => {
                let message = Zeroizing::new(message);
                self.buffers.write(BufferName::Message, &message)?;
                Ok(message.len())
            }
            None => Ok(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::fake::{accepted_secret_key, FakeScheme};
    use crate::engine::MAX_CIPHERTEXT_SIZE;

    fn engine() -> BufferedEngine<FakeScheme> {
        BufferedEngine::new(FakeScheme)
    }

    #[test]
    fn test_derive_writes_public_key_buffer() {
        let mut engine = engine();
        let sk = accepted_secret_key(1);
        engine.write(BufferName::SecretKey, &sk).unwrap();
        engine.derive_from_secret().unwrap();

        let pk = engine.read(BufferName::PublicKey, PUBLIC_KEY_SIZE).unwrap();
        assert_eq!(pk, FakeScheme.public_key(&sk).unwrap().to_vec());
    }

    #[test]
    fn test_derive_rejects_invalid_secret() {
        let mut engine = engine();
        engine.write(BufferName::SecretKey, &[0u8; 32]).unwrap();
        assert_eq!(
            engine.derive_from_secret(),
            Err(EngineFault::SecretKeyRejected)
        );
    }

    #[test]
    fn test_sign_then_verify_through_buffers() {
        let mut engine = engine();
        let sk = accepted_secret_key(2);
        engine.write(BufferName::SecretKey, &sk).unwrap();
        engine.write(BufferName::Message, b"hello").unwrap();
        engine.sign_message(5).unwrap();
        engine.derive_from_secret().unwrap();

        assert!(engine.verify_signature(5).unwrap());
        assert!(!engine.verify_signature(4).unwrap());
    }

    #[test]
    fn test_encrypt_reports_ciphertext_length() {
        let mut engine = engine();
        let pk = FakeScheme.public_key(&accepted_secret_key(3)).unwrap();
        engine.write(BufferName::PublicKey, &pk).unwrap();
        engine.write(BufferName::Message, b"secret").unwrap();

        let len = engine.encrypt_message(6, 1, 2).unwrap();
        assert!(len > 6);
        assert!(engine.buffers().dirty_len(BufferName::Ciphertext) >= len);
    }

    #[test]
    fn test_encrypt_oversized_ciphertext_is_a_fault() {
        let mut engine = engine();
        let pk = FakeScheme.public_key(&accepted_secret_key(3)).unwrap();
        engine.write(BufferName::PublicKey, &pk).unwrap();
        let message = vec![b'a'; MAX_CIPHERTEXT_SIZE];
        engine.write(BufferName::Message, &message).unwrap();

        let err = engine.encrypt_message(message.len(), 0, 0).unwrap_err();
        assert!(matches!(
            err,
            EngineFault::Overflow {
                buffer: BufferName::Ciphertext,
                ..
            }
        ));
    }

    #[test]
    fn test_decrypt_refused_ciphertext_returns_zero() {
        let mut engine = engine();
        engine.write(BufferName::SecretKey, &accepted_secret_key(4)).unwrap();
        engine.write(BufferName::Ciphertext, &[7u8; 40]).unwrap();
        assert_eq!(engine.decrypt_ciphertext(40).unwrap(), 0);
    }
}
