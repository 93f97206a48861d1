//! # Shared FFI State
//!
//! The pad shared between `c_api.rs` and `dispatcher.rs`.

use once_cell::sync::OnceCell;

use crate::engine::ThresholdEngine;
use crate::{Pad, PadConfig};

/// Global pad, created by `thresholdpad_init`
static PAD: OnceCell<Pad<ThresholdEngine>> = OnceCell::new();

pub(crate) fn get_pad() -> Option<&'static Pad<ThresholdEngine>> {
    PAD.get()
}

pub(crate) fn init_pad(config: PadConfig) -> Result<(), ()> {
    let mut created = false;
    PAD.get_or_init(|| {
        created = true;
        Pad::threshold(config)
    });
    if created {
        Ok(())
    } else {
        Err(())
    }
}
