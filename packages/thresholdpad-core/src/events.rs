//! # Panels, Fields and Events
//!
//! The form is a set of panels, one per engine operation. Each panel owns its
//! own copy of the fields it reads and one output field.
//!
//! | Panel | Inputs | Output |
//! |-------|--------|--------|
//! | `keys` | secret-key | public-key |
//! | `sign` | secret-key, message | signature |
//! | `verify` | public-key, signature, message | verdict |
//! | `encrypt` | public-key, message | ciphertext |
//! | `decrypt` | secret-key, ciphertext | message |
//!
//! Whenever an output changes the dispatcher publishes an [`Event`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::adapter::Operation;

/// One operation's group of fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Panel {
    /// Secret key to public key, plus key generation
    #[serde(rename = "keys")]
    KeyDerivation,
    /// Sign a message
    #[serde(rename = "sign")]
    Signing,
    /// Verify a signature
    #[serde(rename = "verify")]
    Verification,
    /// Encrypt a message
    #[serde(rename = "encrypt")]
    Encryption,
    /// Decrypt a ciphertext
    #[serde(rename = "decrypt")]
    Decryption,
}

impl Panel {
    /// Every panel, in display order
    pub const ALL: [Panel; 5] = [
        Panel::KeyDerivation,
        Panel::Signing,
        Panel::Verification,
        Panel::Encryption,
        Panel::Decryption,
    ];

    /// Short name used on the command line and in JSON
    pub fn as_str(self) -> &'static str {
        match self {
            Panel::KeyDerivation => "keys",
            Panel::Signing => "sign",
            Panel::Verification => "verify",
            Panel::Encryption => "encrypt",
            Panel::Decryption => "decrypt",
        }
    }

    /// Fields the panel reads
    pub fn inputs(self) -> &'static [Field] {
        match self {
            Panel::KeyDerivation => &[Field::SecretKey],
            Panel::Signing => &[Field::SecretKey, Field::Message],
            Panel::Verification => &[Field::PublicKey, Field::Signature, Field::Message],
            Panel::Encryption => &[Field::PublicKey, Field::Message],
            Panel::Decryption => &[Field::SecretKey, Field::Ciphertext],
        }
    }

    /// Field the panel writes
    pub fn output(self) -> Field {
        match self {
            Panel::KeyDerivation => Field::PublicKey,
            Panel::Signing => Field::Signature,
            Panel::Verification => Field::Verdict,
            Panel::Encryption => Field::Ciphertext,
            Panel::Decryption => Field::Message,
        }
    }

    /// Whether `field` is one of the panel's inputs
    pub fn accepts(self, field: Field) -> bool {
        self.inputs().contains(&field)
    }

    /// Engine operation behind the panel
    pub fn operation(self) -> Operation {
        match self {
            Panel::KeyDerivation => Operation::DeriveKey,
            Panel::Signing => Operation::Sign,
            Panel::Verification => Operation::Verify,
            Panel::Encryption => Operation::Encrypt,
            Panel::Decryption => Operation::Decrypt,
        }
    }
}

impl fmt::Display for Panel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Panel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Panel::ALL
            .into_iter()
            .find(|panel| panel.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown panel '{s}'"))
    }
}

/// A text field on the form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Field {
    /// 64 hex characters
    SecretKey,
    /// 96 hex characters
    PublicKey,
    /// Single-byte text
    Message,
    /// 192 hex characters
    Signature,
    /// "valid" or "invalid"
    Verdict,
    /// Even-length hex
    Ciphertext,
}

impl Field {
    /// Every field
    pub const ALL: [Field; 6] = [
        Field::SecretKey,
        Field::PublicKey,
        Field::Message,
        Field::Signature,
        Field::Verdict,
        Field::Ciphertext,
    ];

    /// Field name as typed by the user
    pub fn as_str(self) -> &'static str {
        match self {
            Field::SecretKey => "secret-key",
            Field::PublicKey => "public-key",
            Field::Message => "message",
            Field::Signature => "signature",
            Field::Verdict => "verdict",
            Field::Ciphertext => "ciphertext",
        }
    }

    /// Whether the field holds hex text (trimmed before use)
    pub fn is_hex(self) -> bool {
        !matches!(self, Field::Message | Field::Verdict)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Field {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.replace('_', "-");
        Field::ALL
            .into_iter()
            .find(|field| field.as_str().eq_ignore_ascii_case(&wanted))
            .ok_or_else(|| format!("unknown field '{s}'"))
    }
}

/// Something the front end should show
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A field's text was replaced; an empty value blanks the field
    FieldChanged {
        /// Panel owning the field
        panel: Panel,
        /// The field
        field: Field,
        /// New text
        value: String,
    },
    /// A condition the user must be told about
    Warning {
        /// Human-readable text
        message: String,
    },
}

impl Event {
    /// Shorthand for a field update
    pub fn field(panel: Panel, field: Field, value: impl Into<String>) -> Self {
        Event::FieldChanged {
            panel,
            field,
            value: value.into(),
        }
    }

    /// Shorthand for a warning
    pub fn warning(message: impl Into<String>) -> Self {
        Event::Warning {
            message: message.into(),
        }
    }
}
