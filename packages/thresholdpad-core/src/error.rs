//! # Error Handling
//!
//! Error types for thresholdpad.
//!
//! ## Error Hierarchy
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           ERROR HIERARCHY                               │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Error (top-level)                                                     │
//! │  │                                                                      │
//! │  ├── Input Validation (100-199)                                        │
//! │  │   ├── MalformedHex          - Odd length or non-hex character       │
//! │  │   ├── InvalidInput          - Wrong length for a text field         │
//! │  │   ├── UnsupportedCharacter  - Message character above U+00FF        │
//! │  │   └── UnknownField          - Field is not an input of the panel    │
//! │  │                                                                      │
//! │  ├── Engine (200-299)                                                  │
//! │  │   ├── EngineFault           - Boundary call failed or panicked      │
//! │  │   ├── EngineBusy            - Session unavailable after retries     │
//! │  │   └── CiphertextRejected    - Ciphertext failed its integrity check │
//! │  │                                                                      │
//! │  ├── Entropy & Key Generation (300-399)                                │
//! │  │   ├── EntropyUnavailable    - No secure random source               │
//! │  │   ├── KeyRejected           - Engine declined a sampled key         │
//! │  │   └── KeyGenerationExhausted - Retry budget spent                   │
//! │  │                                                                      │
//! │  └── Internal (900-999)                                                │
//! │      ├── Internal                                                      │
//! │      └── SerializationError                                           │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Propagation
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      ERROR HANDLING FLOW                                │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Validation / Engine            Dispatcher               Front end     │
//! │  ──────────────────────────────────────────────────────────────────     │
//! │                                                                         │
//! │  Err(Error::InvalidInput)  ──►  blank output field  ──►  (nothing)     │
//! │  Err(Error::EngineFault)   ──►  blank output field  ──►  (nothing)     │
//! │  Err(EntropyUnavailable)   ──►  Event::Warning      ──►  warning shown │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use crate::adapter::Operation;
use crate::engine::EngineFault;

/// Result type alias for thresholdpad operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for thresholdpad
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Input Validation Errors (100-199)
    // ========================================================================

    /// Text is not valid hexadecimal
    #[error("Malformed hex: {0}")]
    MalformedHex(String),

    /// A text field has the wrong length
    #[error("Invalid {field}: {reason}")]
    InvalidInput {
        /// Field name as shown to the user
        field: &'static str,
        /// What was wrong with it
        reason: String,
    },

    /// Message text contains a character that does not fit in one byte
    #[error("Unsupported character U+{code_point:04X} at position {position}; only characters up to U+00FF are allowed")]
    UnsupportedCharacter {
        /// Character index within the text
        position: usize,
        /// Offending code point
        code_point: u32,
    },

    /// The field is not an input of the panel
    #[error("Unknown field '{field}' for the {panel} panel")]
    UnknownField {
        /// Panel name
        panel: String,
        /// Field name
        field: String,
    },

    // ========================================================================
    // Engine Errors (200-299)
    // ========================================================================

    /// A call across the engine boundary failed
    #[error("Engine fault during {operation}: {fault}")]
    EngineFault {
        /// Operation that was running
        operation: Operation,
        /// What the boundary reported
        fault: EngineFault,
    },

    /// The engine session stayed busy for the whole retry budget
    #[error("Engine stayed busy after {attempts} attempts")]
    EngineBusy {
        /// Number of acquisition attempts made
        attempts: u32,
    },

    /// The engine refused to decrypt the ciphertext
    #[error("Ciphertext rejected by the engine")]
    CiphertextRejected,

    // ========================================================================
    // Entropy & Key Generation Errors (300-399)
    // ========================================================================

    /// Secure randomness is not available on this platform
    #[error("Secure randomness not available: {0}")]
    EntropyUnavailable(String),

    /// The engine declined a sampled secret key
    #[error("Secret key rejected by the engine")]
    KeyRejected,

    /// No sampled secret key was accepted within the retry budget
    #[error("No valid secret key found after {attempts} attempts")]
    KeyGenerationExhausted {
        /// Number of keys sampled
        attempts: u32,
    },

    // ========================================================================
    // Internal Errors (900-999)
    // ========================================================================

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl Error {
    /// Get the error code for FFI
    ///
    /// Error codes are organized by category:
    /// - 100-199: Input validation
    /// - 200-299: Engine
    /// - 300-399: Entropy and key generation
    /// - 900-999: Internal
    pub fn code(&self) -> i32 {
        match self {
            // Input validation (100-199)
            Error::MalformedHex(_) => 100,
            Error::InvalidInput { .. } => 101,
            Error::UnsupportedCharacter { .. } => 102,
            Error::UnknownField { .. } => 103,

            // Engine (200-299)
            Error::EngineFault { .. } => 200,
            Error::EngineBusy { .. } => 201,
            Error::CiphertextRejected => 202,

            // Entropy & key generation (300-399)
            Error::EntropyUnavailable(_) => 300,
            Error::KeyRejected => 301,
            Error::KeyGenerationExhausted { .. } => 302,

            // Internal (900-999)
            Error::Internal(_) => 900,
            Error::SerializationError(_) => 901,
        }
    }

    /// Check if this error is recoverable
    ///
    /// Recoverable errors go away on retry without the user changing input.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::EngineBusy { .. } | Error::KeyRejected | Error::KeyGenerationExhausted { .. }
        )
    }

    /// Check if this error is shown to the user instead of a blank field
    pub fn is_user_visible(&self) -> bool {
        matches!(
            self,
            Error::EntropyUnavailable(_) | Error::KeyGenerationExhausted { .. } | Error::EngineBusy { .. }
        )
    }

    /// Check if this error was raised before anything reached the engine
    pub fn is_validation(&self) -> bool {
        (100..200).contains(&self.code())
    }
}

// ============================================================================
// ERROR CONVERSIONS
// ============================================================================

impl From<hex::FromHexError> for Error {
    fn from(err: hex::FromHexError) -> Self {
        Error::MalformedHex(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::SerializationError(err.to_string())
    }
}

// ============================================================================
// TESTS
// ============================================================================
