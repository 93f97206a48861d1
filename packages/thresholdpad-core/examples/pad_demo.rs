//! # Thresholdpad Demo
//!
//! Walks through key generation, signing, verification and encryption with
//! the threshold_crypto engine, then shows the dispatcher coalescing edits.
//!
//! ## Run
//!
//! ```bash
//! cargo run --example pad_demo --features threshold
//! ```

use std::time::Duration;

use thresholdpad_core::{Event, Field, Pad, PadConfig, Panel};

#[tokio::main(flavor = "current_thread")]
async fn main() -> thresholdpad_core::Result<()> {
    println!("=== Thresholdpad Core: Engine Demo ===\n");

    let pad = Pad::threshold(PadConfig::default());
    let orch = pad.orchestrator();

    // Step 1: Generate a key pair
    println!("Step 1: Generating a key pair...");
    let keys = pad.generate_keys()?;
    let sk = keys.secret_key.to_hex();
    let pk = keys.public_key.to_hex();
    println!("  Accepted after {} attempt(s)", keys.attempts);
    println!("  Public key: {}...", &pk[..32]);
    println!();

    // Step 2: Sign and verify
    println!("Step 2: Signing a message...");
    let message = "This message was signed on the pad.";
    let signature = orch.sign(&sk, message)?;
    println!("  Signature: {}...", &signature[..32]);
    println!("  Verify original: {}", orch.verify(&pk, &signature, message)?);
    println!(
        "  Verify tampered: {}",
        orch.verify(&pk, &signature, "This message was MODIFIED on the pad.")?
    );
    println!();

    // Step 3: Encrypt and decrypt
    println!("Step 3: Encrypting a message...");
    let ciphertext = orch.encrypt(&pk, "attack at dawn")?;
    println!("  Ciphertext: {} hex characters", ciphertext.len());
    println!("  Decrypted: \"{}\"", orch.decrypt(&sk, &ciphertext)?);
    println!();

    // Step 4: Let the dispatcher coalesce a burst of edits
    println!("Step 4: Typing a secret key one chunk at a time...");
    let (dispatcher, mut events) = pad.dispatcher();
    for end in (16..=sk.len()).step_by(16) {
        dispatcher.input(Panel::KeyDerivation, Field::SecretKey, &sk[..end])?;
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    dispatcher.settle().await;

    while let Ok(event) = events.try_recv() {
        if let Event::FieldChanged { panel, field, value } = event {
            println!("  {panel}.{field} = {}...", &value[..value.len().min(32)]);
            println!("  Matches generated key: {}", value == pk);
        }
    }
    println!();

    println!("=== Example Complete ===");
    Ok(())
}
