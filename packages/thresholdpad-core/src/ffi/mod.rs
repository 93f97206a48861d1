//! # FFI Bindings
//!
//! Foreign Function Interface for native hosts that bring their own UI.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         FFI ARCHITECTURE                                │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Host (Swift/Kotlin/C)                                                  │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  thresholdpad_call("sign", "{\"secret_key\":..,\"message\":..}") │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  dispatcher ─► Pad<ThresholdEngine> ─► Orchestrator ─► Engine   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Error Handling
//!
//! All calls return an `FfiResult` carrying either JSON data or an error
//! code and message. Library errors keep their [`crate::Error::code`].

mod c_api;
mod dispatcher;
mod state;
mod types;

pub use c_api::*;
pub use dispatcher::{dispatch, dispatch_with, DResult};
pub use types::*;
