//! Deterministic engine doubles for tests.
//!
//! `FakeScheme` is not cryptography. It mimics the shape of the real engine:
//! fixed sizes, a secret key space where roughly half of all random strings
//! are rejected, signatures that only verify for the signed message, and
//! ciphertexts with an integrity tag.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use sha2::{Digest, Sha256};

use super::{
    BufferName, BufferedEngine, Engine, EngineFault, EngineResult, Scheme, PUBLIC_KEY_SIZE,
    SECRET_KEY_SIZE, SIGNATURE_SIZE,
};

const SEED_LEN: usize = 8;
const TAG_LEN: usize = 16;

/// Highest accepted value of the last secret key byte, like the top byte of
/// the BLS12-381 scalar modulus in little-endian order.
const TOP_BYTE_LIMIT: u8 = 0x73;

fn expand(tag: &[u8], parts: &[&[u8]], out: &mut [u8]) {
    for (counter, chunk) in out.chunks_mut(32).enumerate() {
        let mut hasher = Sha256::new();
        hasher.update(tag);
        hasher.update((counter as u32).to_le_bytes());
        for part in parts {
            hasher.update((part.len() as u64).to_le_bytes());
            hasher.update(part);
        }
        let digest = hasher.finalize();
        chunk.copy_from_slice(&digest[..chunk.len()]);
    }
}

/// Whether the fake engine accepts `secret_key`
pub(crate) fn is_accepted(secret_key: &[u8]) -> bool {
    secret_key.len() == SECRET_KEY_SIZE
        && secret_key[SECRET_KEY_SIZE - 1] <= TOP_BYTE_LIMIT
        && secret_key.iter().any(|&b| b != 0)
}

/// A secret key the fake engine accepts, distinct per `n`
pub(crate) fn accepted_secret_key(n: u8) -> [u8; SECRET_KEY_SIZE] {
    let mut sk = [0u8; SECRET_KEY_SIZE];
    sk[0] = n;
    sk[1] = 0x5a;
    sk[SECRET_KEY_SIZE - 1] = 0x01;
    sk
}

/// A secret key the fake engine rejects
pub(crate) fn rejected_secret_key() -> [u8; SECRET_KEY_SIZE] {
    [0xff; SECRET_KEY_SIZE]
}

pub(crate) struct FakeScheme;

impl Scheme for FakeScheme {
    fn public_key(&self, secret_key: &[u8]) -> EngineResult<[u8; PUBLIC_KEY_SIZE]> {
        if !is_accepted(secret_key) {
            return Err(EngineFault::SecretKeyRejected);
        }
        let mut pk = [0u8; PUBLIC_KEY_SIZE];
        expand(b"pk", &[secret_key], &mut pk);
        Ok(pk)
    }

    fn sign(&self, secret_key: &[u8], message: &[u8]) -> EngineResult<[u8; SIGNATURE_SIZE]> {
        let pk = self.public_key(secret_key)?;
        let mut sig = [0u8; SIGNATURE_SIZE];
        expand(b"sig", &[&pk, message], &mut sig);
        Ok(sig)
    }

    fn verify(&self, public_key: &[u8], signature: &[u8], message: &[u8]) -> EngineResult<bool> {
        let mut expected = [0u8; SIGNATURE_SIZE];
        expand(b"sig", &[public_key, message], &mut expected);
        Ok(expected[..] == *signature)
    }

    fn encrypt(&self, public_key: &[u8], message: &[u8], seed: u64) -> EngineResult<Vec<u8>> {
        let seed = seed.to_le_bytes();
        let mut tag = [0u8; TAG_LEN];
        expand(b"tag", &[public_key, &seed, message], &mut tag);
        let mut body = vec![0u8; message.len()];
        expand(b"ks", &[public_key, &seed], &mut body);
        body.iter_mut().zip(message).for_each(|(k, m)| *k ^= m);

        let mut ciphertext = Vec::with_capacity(SEED_LEN + TAG_LEN + body.len());
        ciphertext.extend_from_slice(&seed);
        ciphertext.extend_from_slice(&tag);
        ciphertext.extend_from_slice(&body);
        Ok(ciphertext)
    }

    fn decrypt(&self, secret_key: &[u8], ciphertext: &[u8]) -> EngineResult<Option<Vec<u8>>> {
        if ciphertext.len() < SEED_LEN + TAG_LEN {
            return Err(EngineFault::Malformed(BufferName::Ciphertext));
        }
        let pk = self.public_key(secret_key)?;
        let (seed, rest) = ciphertext.split_at(SEED_LEN);
        let (tag, body) = rest.split_at(TAG_LEN);

        let mut message = vec![0u8; body.len()];
        expand(b"ks", &[&pk, seed], &mut message);
        message.iter_mut().zip(body).for_each(|(k, c)| *k ^= c);

        let mut expected = [0u8; TAG_LEN];
        expand(b"tag", &[&pk, seed, &message], &mut expected);
        Ok((expected[..] == *tag).then_some(message))
    }
}

/// Where a [`TestEngine`] fails
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FaultPoint {
    Write(BufferName),
    Invoke,
    Read,
    Panic,
}

/// Fake engine with call counting, fault injection and an artificial delay
/// inside every operation.
pub(crate) struct TestEngine {
    inner: BufferedEngine<FakeScheme>,
    invocations: Arc<AtomicUsize>,
    fault: Option<FaultPoint>,
    delay: Duration,
}

impl TestEngine {
    pub fn new() -> Self {
        Self {
            inner: BufferedEngine::new(FakeScheme),
            invocations: Arc::new(AtomicUsize::new(0)),
            fault: None,
            delay: Duration::ZERO,
        }
    }

    pub fn with_fault(mut self, fault: FaultPoint) -> Self {
        self.fault = Some(fault);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Shared counter of operation invocations
    pub fn invocations(&self) -> Arc<AtomicUsize> {
        self.invocations.clone()
    }

    pub fn buffers(&self) -> &super::EngineBuffers {
        self.inner.buffers()
    }

    fn invoke(&self) -> EngineResult<()> {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        match self.fault {
            Some(FaultPoint::Invoke) => Err(EngineFault::Backend("injected".into())),
            Some(FaultPoint::Panic) => panic!("injected engine panic"),
            _ => Ok(()),
        }
    }
}

impl Engine for TestEngine {
    fn write(&mut self, buffer: BufferName, bytes: &[u8]) -> EngineResult<()> {
        if self.fault == Some(FaultPoint::Write(buffer)) {
            return Err(EngineFault::Backend(format!("cannot write {buffer}")));
        }
        self.inner.write(buffer, bytes)
    }

    fn read(&self, buffer: BufferName, len: usize) -> EngineResult<Vec<u8>> {
        if self.fault == Some(FaultPoint::Read) {
            return Err(EngineFault::Backend(format!("cannot read {buffer}")));
        }
        self.inner.read(buffer, len)
    }

    fn scrub(&mut self) {
        self.inner.scrub();
    }

    fn derive_from_secret(&mut self) -> EngineResult<()> {
        self.invoke()?;
        self.inner.derive_from_secret()
    }

    fn sign_message(&mut self, message_len: usize) -> EngineResult<()> {
        self.invoke()?;
        self.inner.sign_message(message_len)
    }

    fn verify_signature(&mut self, message_len: usize) -> EngineResult<bool> {
        self.invoke()?;
        self.inner.verify_signature(message_len)
    }

    fn encrypt_message(
        &mut self,
        message_len: usize,
        entropy_hi: u32,
        entropy_lo: u32,
    ) -> EngineResult<usize> {
        self.invoke()?;
        self.inner.encrypt_message(message_len, entropy_hi, entropy_lo)
    }

    fn decrypt_ciphertext(&mut self, ciphertext_len: usize) -> EngineResult<usize> {
        self.invoke()?;
        self.inner.decrypt_ciphertext(ciphertext_len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fake_scheme_roundtrip() {
        let sk = accepted_secret_key(9);
        let pk = FakeScheme.public_key(&sk).unwrap();
        let ct = FakeScheme.encrypt(&pk, b"attack at dawn", 42).unwrap();
        assert_eq!(
            FakeScheme.decrypt(&sk, &ct).unwrap().as_deref(),
            Some(&b"attack at dawn"[..])
        );
    }

    #[test]
    fn test_fake_scheme_key_space() {
        assert!(is_accepted(&accepted_secret_key(0)));
        assert!(!is_accepted(&rejected_secret_key()));
        assert!(!is_accepted(&[0u8; 32]));
    }
}
