//! # FFI Dispatcher
//!
//! JSON-RPC style dispatcher that routes method names to pad operations.
//! Called from `thresholdpad_call(method, args)` in c_api.rs.
//!
//! | Method | Arguments | Result |
//! |--------|-----------|--------|
//! | `derive_public_key` | `secret_key` | `public_key` |
//! | `sign` | `secret_key`, `message` | `signature` |
//! | `verify` | `public_key`, `signature`, `message` | `valid`, `verdict` |
//! | `encrypt` | `public_key`, `message` | `ciphertext` |
//! | `decrypt` | `secret_key`, `ciphertext` | `message` |
//! | `generate_keys` | | `secret_key`, `public_key`, `attempts` |
//! | `is_busy` | | `busy` |
//! | `version` | | build info |
//!
//! Returns `Ok(json_string)` on success, `Err((error_code, message))` on failure.
//! Library errors keep their [`crate::Error::code`].

use serde_json::json;

use super::state::get_pad;
use crate::engine::Engine;
use crate::{Error, Pad};

/// JSON on success, `(error_code, message)` on failure
pub type DResult = Result<String, (i32, String)>;

/// Arguments were not a JSON object
pub const INVALID_JSON: i32 = 1;
/// A required argument is missing
pub const MISSING_ARGUMENT: i32 = 2;
/// No such method
pub const UNKNOWN_METHOD: i32 = 404;
/// `thresholdpad_init` has not been called
pub const NOT_INITIALIZED: i32 = 910;

// ============================================================================
// HELPERS
// ============================================================================

/// Build an error pair
pub fn err(code: i32, msg: impl ToString) -> (i32, String) {
    (code, msg.to_string())
}

fn fail(e: Error) -> (i32, String) {
    (e.code(), e.to_string())
}

/// Parse call arguments; empty text is an empty object
pub fn json_parse(args: &str) -> Result<serde_json::Value, (i32, String)> {
    if args.trim().is_empty() {
        return Ok(json!({}));
    }
    serde_json::from_str(args).map_err(|e| err(INVALID_JSON, format!("Invalid JSON: {}", e)))
}

/// Fetch a required string argument
pub fn require_str<'a>(data: &'a serde_json::Value, field: &str) -> Result<&'a str, (i32, String)> {
    data[field]
        .as_str()
        .ok_or_else(|| err(MISSING_ARGUMENT, format!("Missing {}", field)))
}

/// Serialize a success value
pub fn ok_json(v: serde_json::Value) -> DResult {
    Ok(v.to_string())
}

// ============================================================================
// ROUTING
// ============================================================================

/// Route a call to the global pad
pub fn dispatch(method: &str, args: &str) -> DResult {
    let pad = get_pad().ok_or_else(|| err(NOT_INITIALIZED, "thresholdpad_init has not been called"))?;
    dispatch_with(pad, method, args)
}

/// Route a call to `pad`
pub fn dispatch_with<E: Engine + 'static>(pad: &Pad<E>, method: &str, args: &str) -> DResult {
    tracing::trace!(method, "FFI call");
    match method {
        "derive_public_key" => derive_public_key(pad, args),
        "sign" => sign(pad, args),
        "verify" => verify(pad, args),
        "encrypt" => encrypt(pad, args),
        "decrypt" => decrypt(pad, args),
        "generate_keys" => generate_keys(pad),
        "is_busy" => ok_json(json!({ "busy": pad.adapter().is_busy() })),
        "version" => serde_json::to_value(crate::build_info())
            .map_err(|e| fail(e.into()))
            .and_then(ok_json),
        _ => Err(err(UNKNOWN_METHOD, format!("Unknown method: {}", method))),
    }
}

fn derive_public_key<E: Engine + 'static>(pad: &Pad<E>, args: &str) -> DResult {
    let data = json_parse(args)?;
    let public_key = pad
        .orchestrator()
        .derive_public_key(require_str(&data, "secret_key")?)
        .map_err(fail)?;
    ok_json(json!({ "public_key": public_key }))
}

fn sign<E: Engine + 'static>(pad: &Pad<E>, args: &str) -> DResult {
    let data = json_parse(args)?;
    let signature = pad
        .orchestrator()
        .sign(require_str(&data, "secret_key")?, require_str(&data, "message")?)
        .map_err(fail)?;
    ok_json(json!({ "signature": signature }))
}

fn verify<E: Engine + 'static>(pad: &Pad<E>, args: &str) -> DResult {
    let data = json_parse(args)?;
    let verdict = pad
        .orchestrator()
        .verify(
            require_str(&data, "public_key")?,
            require_str(&data, "signature")?,
            require_str(&data, "message")?,
        )
        .map_err(fail)?;
    ok_json(json!({ "valid": verdict == "valid", "verdict": verdict }))
}

fn encrypt<E: Engine + 'static>(pad: &Pad<E>, args: &str) -> DResult {
    let data = json_parse(args)?;
    let ciphertext = pad
        .orchestrator()
        .encrypt(require_str(&data, "public_key")?, require_str(&data, "message")?)
        .map_err(fail)?;
    ok_json(json!({ "ciphertext": ciphertext }))
}

fn decrypt<E: Engine + 'static>(pad: &Pad<E>, args: &str) -> DResult {
    let data = json_parse(args)?;
    let message = pad
        .orchestrator()
        .decrypt(require_str(&data, "secret_key")?, require_str(&data, "ciphertext")?)
        .map_err(fail)?;
    ok_json(json!({ "message": message }))
}

fn generate_keys<E: Engine + 'static>(pad: &Pad<E>) -> DResult {
    let keys = pad.generate_keys().map_err(fail)?;
    ok_json(json!({
        "secret_key": keys.secret_key.to_hex(),
        "public_key": keys.public_key.to_hex(),
        "attempts": keys.attempts,
    }))
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::fake::TestEngine;
    use crate::PadConfig;

    fn pad() -> Pad<TestEngine> {
        Pad::with_os_entropy(TestEngine::new(), PadConfig::default())
    }

    fn call(pad: &Pad<TestEngine>, method: &str, args: serde_json::Value) -> serde_json::Value {
        let out = dispatch_with(pad, method, &args.to_string()).unwrap();
        serde_json::from_str(&out).unwrap()
    }

    #[test]
    fn test_full_flow() {
        let pad = pad();
        let keys = call(&pad, "generate_keys", json!({}));
        let sk = keys["secret_key"].as_str().unwrap();
        let pk = keys["public_key"].as_str().unwrap();

        let derived = call(&pad, "derive_public_key", json!({ "secret_key": sk }));
        assert_eq!(derived["public_key"], pk);

        let signed = call(&pad, "sign", json!({ "secret_key": sk, "message": "hi" }));
        let verdict = call(
            &pad,
            "verify",
            json!({ "public_key": pk, "signature": signed["signature"], "message": "hi" }),
        );
        assert_eq!(verdict["valid"], true);
        assert_eq!(verdict["verdict"], "valid");

        let ct = call(&pad, "encrypt", json!({ "public_key": pk, "message": "secret" }));
        let plain = call(
            &pad,
            "decrypt",
            json!({ "secret_key": sk, "ciphertext": ct["ciphertext"] }),
        );
        assert_eq!(plain["message"], "secret");
    }

    #[test]
    fn test_errors_keep_library_codes() {
        let pad = pad();
        let (code, _) = dispatch_with(&pad, "derive_public_key", r#"{"secret_key":"abc"}"#)
            .unwrap_err();
        assert_eq!(code, 101);

        let (code, msg) = dispatch_with(&pad, "sign", r#"{"secret_key":"00"}"#).unwrap_err();
        assert_eq!(code, MISSING_ARGUMENT);
        assert!(msg.contains("message"));
    }

    #[test]
    fn test_bad_requests() {
        let pad = pad();
        assert_eq!(dispatch_with(&pad, "sign", "{nope").unwrap_err().0, INVALID_JSON);
        assert_eq!(dispatch_with(&pad, "forge", "{}").unwrap_err().0, UNKNOWN_METHOD);
    }

    #[test]
    fn test_is_busy_and_version() {
        let pad = pad();
        assert_eq!(call(&pad, "is_busy", json!({}))["busy"], false);
        assert_eq!(call(&pad, "version", json!({}))["version"], crate::version());
    }
}
