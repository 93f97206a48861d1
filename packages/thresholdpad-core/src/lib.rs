//! # Thresholdpad Core
//!
//! Marshaling and single-flight invocation layer between a text form and a
//! threshold-cryptography engine that is only reachable through named byte
//! buffers.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       THRESHOLDPAD CORE MODULES                         │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌──────────────────────┐        ┌──────────────────────────────────┐   │
//! │  │ Debounced Dispatcher │───────►│           Key Generator          │   │
//! │  │                      │        │                                  │   │
//! │  │ - one task per panel │        │ - sample 32 bytes                │   │
//! │  │ - busy backoff       │        │ - resample on rejection          │   │
//! │  │ - events             │        └────────────────┬─────────────────┘   │
//! │  └──────────┬───────────┘                         │                     │
//! │             ▼                                     │                     │
//! │  ┌──────────────────────┐                         │                     │
//! │  │     Orchestrator     │                         │                     │
//! │  │                      │                         │                     │
//! │  │ - validate lengths   │                         │                     │
//! │  │ - Request/Response   │                         │                     │
//! │  └──────────┬───────────┘                         │                     │
//! │             ▼                                     ▼                     │
//! │  ┌──────────────────────────────────────────────────────────────────┐   │
//! │  │                       Engine Adapter                             │   │
//! │  │   mutex session ─► write buffers ─► invoke ─► read ─► scrub      │   │
//! │  └──────────────────────────────┬───────────────────────────────────┘   │
//! │                                 ▼                                       │
//! │  ┌──────────────────────────────────────────────────────────────────┐   │
//! │  │  Engine: five named buffers + Scheme (threshold_crypto)          │   │
//! │  └──────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! │  Codec (hex, single-byte text) is used at both ends.                   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Hierarchy
//!
//! - [`error`] - Error types for the entire library
//! - [`codec`] - Hex and single-byte text conversions
//! - [`engine`] - The engine boundary and its implementations
//! - [`material`] - Secret key, public key and signature types
//! - [`adapter`] - Single-flight engine sessions
//! - [`orchestrator`] - Validation and execution of the five operations
//! - [`keygen`] - Secret key sampling
//! - [`dispatcher`] - Debounced, busy-aware scheduling of panel operations
//! - [`events`] - Panels, fields and the events published to a front end
//! - [`config`] - Runtime configuration
//!
//! ## Features
//!
//! | Feature | Enables |
//! |---------|---------|
//! | `threshold` | [`engine::ThresholdEngine`] backed by `threshold_crypto` |
//! | `ffi` | JSON dispatcher and C ABI (implies `threshold`) |

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

// ============================================================================
// MODULE DECLARATIONS
// ============================================================================

pub mod adapter;
pub mod codec;
pub mod config;
pub mod dispatcher;
pub mod engine;
pub mod entropy;
pub mod error;
pub mod events;
pub mod keygen;
pub mod material;
pub mod orchestrator;

#[cfg(feature = "ffi")]
pub mod ffi;

// ============================================================================
// RE-EXPORTS
// ============================================================================

pub use adapter::{EngineAdapter, Operation};
pub use config::{PadConfig, RetryPolicy};
pub use dispatcher::{Dispatcher, EventReceiver};
pub use engine::Engine;
pub use entropy::{EntropySource, OsEntropy};
pub use error::{Error, Result};
pub use events::{Event, Field, Panel};
pub use keygen::{GeneratedKeys, KeyGenerator};
pub use material::{PublicKey, SecretKey, Signature};
pub use orchestrator::{Orchestrator, Request, Response};

#[cfg(feature = "threshold")]
pub use engine::ThresholdEngine;

// ============================================================================
// PAD
// ============================================================================

use std::sync::Arc;

/// One engine with everything built around it
///
/// ## Lifecycle
///
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │                          PAD LIFECYCLE                                  │
/// ├─────────────────────────────────────────────────────────────────────────┤
/// │                                                                         │
/// │  Pad::new(engine, entropy, config)                                     │
/// │     │──► EngineAdapter (scrubbing per config)                          │
/// │     │──► Orchestrator                                                  │
/// │     │                                                                  │
/// │     ├──► synchronous use: orchestrator().sign(..), generate_keys()     │
/// │     │                                                                  │
/// │     └──► interactive use: dispatcher() ──► (Dispatcher, events)        │
/// │                                                                         │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub struct Pad<E> {
    adapter: Arc<EngineAdapter<E>>,
    orchestrator: Orchestrator<E>,
    entropy: Arc<dyn EntropySource>,
    config: PadConfig,
}

impl<E: Engine + 'static> Pad<E> {
    /// Build a pad around `engine`
    pub fn new(engine: E, entropy: Arc<dyn EntropySource>, config: PadConfig) -> Self {
        let adapter = Arc::new(EngineAdapter::new(engine).with_scrubbing(config.scrub_buffers));
        let orchestrator = Orchestrator::new(adapter.clone(), entropy.clone());
        Self {
            adapter,
            orchestrator,
            entropy,
            config,
        }
    }

    /// Build a pad that draws randomness from the operating system
    pub fn with_os_entropy(engine: E, config: PadConfig) -> Self {
        Self::new(engine, Arc::new(OsEntropy), config)
    }

    /// The shared engine adapter
    pub fn adapter(&self) -> &Arc<EngineAdapter<E>> {
        &self.adapter
    }

    /// The operation orchestrator
    pub fn orchestrator(&self) -> &Orchestrator<E> {
        &self.orchestrator
    }

    /// Configuration the pad was built with
    pub fn config(&self) -> &PadConfig {
        &self.config
    }

    /// A key generator over this pad's engine
    pub fn key_generator(&self) -> KeyGenerator<E> {
        KeyGenerator::new(self.adapter.clone(), self.entropy.clone())
            .with_max_attempts(self.config.keygen_attempts)
    }

    /// Generate a key pair, blocking on the engine
    pub fn generate_keys(&self) -> Result<GeneratedKeys> {
        self.key_generator().generate()
    }

    /// Start a dispatcher over this pad's engine.
    ///
    /// Must be called from within a tokio runtime.
    pub fn dispatcher(&self) -> (Dispatcher<E>, EventReceiver) {
        Dispatcher::new(
            self.orchestrator.clone(),
            self.key_generator(),
            self.config.clone(),
        )
    }
}

#[cfg(feature = "threshold")]
impl Pad<ThresholdEngine> {
    /// Build a pad around the threshold_crypto engine
    pub fn threshold(config: PadConfig) -> Self {
        tracing::info!("Thresholdpad Core v{} (threshold_crypto engine)", version());
        Self::with_os_entropy(ThresholdEngine::threshold(), config)
    }
}

// ============================================================================
// VERSION INFO
// ============================================================================

/// Returns the version of Thresholdpad Core
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Returns build information for debugging
pub fn build_info() -> BuildInfo {
    BuildInfo {
        version: env!("CARGO_PKG_VERSION"),
        engine: if cfg!(feature = "threshold") {
            "threshold_crypto"
        } else {
            "none"
        },
        profile: if cfg!(debug_assertions) {
            "debug"
        } else {
            "release"
        },
    }
}

/// Build information for debugging
#[derive(Debug, Clone, serde::Serialize)]
pub struct BuildInfo {
    /// Crate version
    pub version: &'static str,
    /// Engine compiled in
    pub engine: &'static str,
    /// Build profile (debug/release)
    pub profile: &'static str,
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::fake::{accepted_secret_key, TestEngine};
    use crate::engine::BufferName;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }

    #[test]
    fn test_build_info() {
        let info = build_info();
        assert_eq!(info.version, version());
    }

    #[test]
    fn test_pad_sync_operations() {
        let pad = Pad::with_os_entropy(TestEngine::new(), PadConfig::default());
        let keys = pad.generate_keys().unwrap();
        let orch = pad.orchestrator();

        let sig = orch.sign(&keys.secret_key.to_hex(), "hello").unwrap();
        assert_eq!(
            orch.verify(&keys.public_key.to_hex(), &sig, "hello").unwrap(),
            "valid"
        );
        assert!(!pad.adapter().is_busy());
    }

    #[test]
    fn test_pad_respects_scrub_setting() {
        let config = PadConfig {
            scrub_buffers: false,
            ..PadConfig::default()
        };
        let pad = Pad::with_os_entropy(TestEngine::new(), config);
        let sk = codec::hex_encode(&accepted_secret_key(1));
        pad.orchestrator().sign(&sk, "residue").unwrap();

        let Pad { adapter, orchestrator, .. } = pad;
        drop(orchestrator);
        let engine = Arc::try_unwrap(adapter)
            .ok()
            .expect("no other adapter handles")
            .into_inner();
        assert_eq!(engine.buffers().dirty_len(BufferName::Message), 7);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pad_dispatcher() {
        let pad = Pad::with_os_entropy(TestEngine::new(), PadConfig::default());
        let (dispatcher, mut events) = pad.dispatcher();
        dispatcher
            .input(
                Panel::KeyDerivation,
                Field::SecretKey,
                codec::hex_encode(&accepted_secret_key(2)),
            )
            .unwrap();
        dispatcher.settle().await;
        assert!(matches!(
            events.try_recv(),
            Ok(Event::FieldChanged {
                field: Field::PublicKey,
                ..
            })
        ));
    }
}
