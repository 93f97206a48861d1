//! # Operation Orchestrator
//!
//! Turns field text into typed requests, runs them against an engine session
//! and renders the responses back into field text.
//!
//! ```text
//! ┌──────────────┐  prepare   ┌──────────┐  execute   ┌──────────┐  render
//! │  field text  │ ─────────► │ Request  │ ─────────► │ Response │ ───────► text
//! └──────────────┘ (validate) └──────────┘ (session)  └──────────┘
//! ```
//!
//! Validation happens entirely in `prepare`; nothing that fails it reaches
//! the engine. Hex fields are trimmed, message text is taken verbatim.

use std::collections::HashMap;
use std::sync::Arc;

use crate::adapter::{EncryptionEntropy, EngineAdapter, EngineSession, Operation};
use crate::codec;
use crate::engine::{Engine, MAX_CIPHERTEXT_SIZE, MAX_MESSAGE_SIZE};
use crate::entropy::EntropySource;
use crate::error::{Error, Result};
use crate::events::{Field, Panel};
use crate::material::{PublicKey, SecretKey, Signature};

/// Longest accepted ciphertext field, in hex characters
pub const MAX_CIPHERTEXT_HEX_LEN: usize = MAX_CIPHERTEXT_SIZE * 2;

/// A validated operation, ready for the engine
#[derive(Debug, Clone)]
pub enum Request {
    /// Derive a public key
    DeriveKey {
        /// Key to derive from
        secret_key: SecretKey,
    },
    /// Sign a message
    Sign {
        /// Signing key
        secret_key: SecretKey,
        /// Message bytes
        message: Vec<u8>,
    },
    /// Verify a signature
    Verify {
        /// Signer's public key
        public_key: PublicKey,
        /// Claimed signature
        signature: Signature,
        /// Message bytes
        message: Vec<u8>,
    },
    /// Encrypt a message
    Encrypt {
        /// Recipient's public key
        public_key: PublicKey,
        /// Message bytes
        message: Vec<u8>,
        /// Randomness drawn for this request
        entropy: EncryptionEntropy,
    },
    /// Decrypt a ciphertext
    Decrypt {
        /// Recipient's secret key
        secret_key: SecretKey,
        /// Ciphertext bytes
        ciphertext: Vec<u8>,
    },
}

impl Request {
    /// Engine operation the request runs
    pub fn operation(&self) -> Operation {
        match self {
            Request::DeriveKey { .. } => Operation::DeriveKey,
            Request::Sign { .. } => Operation::Sign,
            Request::Verify { .. } => Operation::Verify,
            Request::Encrypt { .. } => Operation::Encrypt,
            Request::Decrypt { .. } => Operation::Decrypt,
        }
    }
}

/// Result of a successful operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Derived public key
    PublicKey(PublicKey),
    /// Produced signature
    Signature(Signature),
    /// Whether the signature verified
    Verdict(bool),
    /// Produced ciphertext
    Ciphertext(Vec<u8>),
    /// Decrypted message
    Plaintext(Vec<u8>),
}

impl Response {
    /// Text for the output field
    pub fn render(&self) -> String {
        match self {
            Response::PublicKey(pk) => pk.to_hex(),
            Response::Signature(sig) => sig.to_hex(),
            Response::Verdict(true) => "valid".to_string(),
            Response::Verdict(false) => "invalid".to_string(),
            Response::Ciphertext(ct) => codec::hex_encode(ct),
            Response::Plaintext(message) => codec::text_encode(message),
        }
    }
}

// ============================================================================
// FIELD VALIDATION
// ============================================================================

/// Validate a message field: 1 to 1,049,600 single-byte characters, untrimmed
pub fn parse_message(text: &str) -> Result<Vec<u8>> {
    let len = text.chars().count();
    if len == 0 {
        return Err(Error::InvalidInput {
            field: "message",
            reason: "message is empty".into(),
        });
    }
    if len > MAX_MESSAGE_SIZE {
        return Err(Error::InvalidInput {
            field: "message",
            reason: format!("{len} characters exceeds the limit of {MAX_MESSAGE_SIZE}"),
        });
    }
    codec::text_decode(text)
}

/// Validate a ciphertext field: even-length hex, 2 to 2,099,200 characters
pub fn parse_ciphertext(text: &str) -> Result<Vec<u8>> {
    let text = text.trim();
    if text.is_empty() {
        return Err(Error::InvalidInput {
            field: "ciphertext",
            reason: "ciphertext is empty".into(),
        });
    }
    if text.len() > MAX_CIPHERTEXT_HEX_LEN {
        return Err(Error::InvalidInput {
            field: "ciphertext",
            reason: format!(
                "{} hex characters exceeds the limit of {MAX_CIPHERTEXT_HEX_LEN}",
                text.len()
            ),
        });
    }
    if text.len() % 2 != 0 {
        return Err(Error::InvalidInput {
            field: "ciphertext",
            reason: "odd number of hex characters".into(),
        });
    }
    codec::hex_decode(text)
}

// ============================================================================
// ORCHESTRATOR
// ============================================================================

/// Validates, executes and renders the five operations
pub struct Orchestrator<E> {
    adapter: Arc<EngineAdapter<E>>,
    entropy: Arc<dyn EntropySource>,
}

impl<E> Clone for Orchestrator<E> {
    fn clone(&self) -> Self {
        Self {
            adapter: self.adapter.clone(),
            entropy: self.entropy.clone(),
        }
    }
}

impl<E: Engine> Orchestrator<E> {
    /// Create an orchestrator over a shared adapter
    pub fn new(adapter: Arc<EngineAdapter<E>>, entropy: Arc<dyn EntropySource>) -> Self {
        Self { adapter, entropy }
    }

    /// The adapter requests run against
    pub fn adapter(&self) -> &Arc<EngineAdapter<E>> {
        &self.adapter
    }

    /// Validate a derive request
    pub fn prepare_derive(&self, secret_key: &str) -> Result<Request> {
        Ok(Request::DeriveKey {
            secret_key: SecretKey::from_hex(secret_key.trim())?,
        })
    }

    /// Validate a sign request
    pub fn prepare_sign(&self, secret_key: &str, message: &str) -> Result<Request> {
        Ok(Request::Sign {
            secret_key: SecretKey::from_hex(secret_key.trim())?,
            message: parse_message(message)?,
        })
    }

    /// Validate a verify request
    pub fn prepare_verify(
        &self,
        public_key: &str,
        signature: &str,
        message: &str,
    ) -> Result<Request> {
        Ok(Request::Verify {
            public_key: PublicKey::from_hex(public_key.trim())?,
            signature: Signature::from_hex(signature.trim())?,
            message: parse_message(message)?,
        })
    }

    /// Validate an encrypt request and draw fresh entropy for it
    pub fn prepare_encrypt(&self, public_key: &str, message: &str) -> Result<Request> {
        let public_key = PublicKey::from_hex(public_key.trim())?;
        let message = parse_message(message)?;
        let mut seed = [0u8; 8];
        self.entropy.fill(&mut seed)?;
        Ok(Request::Encrypt {
            public_key,
            message,
            entropy: EncryptionEntropy::from_bytes(seed),
        })
    }

    /// Validate a decrypt request
    pub fn prepare_decrypt(&self, secret_key: &str, ciphertext: &str) -> Result<Request> {
        Ok(Request::Decrypt {
            secret_key: SecretKey::from_hex(secret_key.trim())?,
            ciphertext: parse_ciphertext(ciphertext)?,
        })
    }

    /// Validate a panel's inputs; missing fields count as empty
    pub fn prepare(&self, panel: Panel, fields: &HashMap<Field, String>) -> Result<Request> {
        let get = |field: Field| fields.get(&field).map(String::as_str).unwrap_or("");
        match panel {
            Panel::KeyDerivation => self.prepare_derive(get(Field::SecretKey)),
            Panel::Signing => self.prepare_sign(get(Field::SecretKey), get(Field::Message)),
            Panel::Verification => self.prepare_verify(
                get(Field::PublicKey),
                get(Field::Signature),
                get(Field::Message),
            ),
            Panel::Encryption => self.prepare_encrypt(get(Field::PublicKey), get(Field::Message)),
            Panel::Decryption => {
                self.prepare_decrypt(get(Field::SecretKey), get(Field::Ciphertext))
            }
        }
    }

    /// Run a validated request on a session the caller already holds
    pub fn execute(&self, session: &mut EngineSession<'_, E>, request: &Request) -> Result<Response> {
        match request {
            Request::DeriveKey { secret_key } => {
                session.derive_key(secret_key).map(Response::PublicKey)
            }
            Request::Sign {
                secret_key,
                message,
            } => session.sign(secret_key, message).map(Response::Signature),
            Request::Verify {
                public_key,
                signature,
                message,
            } => session
                .verify(public_key, signature, message)
                .map(Response::Verdict),
            Request::Encrypt {
                public_key,
                message,
                entropy,
            } => session
                .encrypt(public_key, message, *entropy)
                .map(Response::Ciphertext),
            Request::Decrypt {
                secret_key,
                ciphertext,
            } => {
                let message = session.decrypt(secret_key, ciphertext)?;
                if message.is_empty() {
                    return Err(Error::CiphertextRejected);
                }
                Ok(Response::Plaintext(message))
            }
        }
    }

    /// Run a validated request, waiting for the engine if it is busy
    pub fn submit(&self, request: &Request) -> Result<Response> {
        let mut session = self.adapter.session();
        self.execute(&mut session, request)
    }

    /// Derive a public key from hex, returning hex
    pub fn derive_public_key(&self, secret_key: &str) -> Result<String> {
        self.run(self.prepare_derive(secret_key))
    }

    /// Sign message text, returning signature hex
    pub fn sign(&self, secret_key: &str, message: &str) -> Result<String> {
        self.run(self.prepare_sign(secret_key, message))
    }

    /// Verify a signature, returning `"valid"` or `"invalid"`
    pub fn verify(&self, public_key: &str, signature: &str, message: &str) -> Result<String> {
        self.run(self.prepare_verify(public_key, signature, message))
    }

    /// Encrypt message text, returning ciphertext hex
    pub fn encrypt(&self, public_key: &str, message: &str) -> Result<String> {
        self.run(self.prepare_encrypt(public_key, message))
    }

    /// Decrypt ciphertext hex, returning message text
    pub fn decrypt(&self, secret_key: &str, ciphertext: &str) -> Result<String> {
        self.run(self.prepare_decrypt(secret_key, ciphertext))
    }

    fn run(&self, request: Result<Request>) -> Result<String> {
        let response = self.submit(&request?)?;
        Ok(response.render())
    }
}

/// Render an outcome as field text; every failure becomes a blank field.
///
/// The error is logged at a level matching its class.
pub fn render_or_blank(panel: Panel, outcome: &Result<Response>) -> String {
    match outcome {
        Ok(response) => response.render(),
        Err(e) => {
            log_failure(panel, e);
            String::new()
        }
    }
}

pub(crate) fn log_failure(panel: Panel, error: &Error) {
    if error.is_validation() {
        tracing::trace!(panel = %panel, "input not ready: {}", error);
    } else if error.is_user_visible() {
        tracing::warn!(panel = %panel, "{}", error);
    } else {
        tracing::debug!(panel = %panel, code = error.code(), "operation failed: {}", error);
    }
}

// ============================================================================
// TESTS
// ============================================================================
