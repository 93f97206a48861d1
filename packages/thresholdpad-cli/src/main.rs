//! Thresholdpad
//!
//! A line-oriented front end for the threshold_crypto engine. Fields are
//! edited with `set <panel>.<field> <value>`; each panel recomputes its output
//! once its inputs stop changing, and every output change is printed.

mod command;

use std::time::Duration;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::UnboundedReceiver;

use thresholdpad_core::{Event, Pad, PadConfig, RetryPolicy};

use command::{Command, HELP};

// ── CLI Arguments ─────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "thresholdpad", version, about = "Threshold cryptography scratch pad")]
struct Args {
    /// Print events as JSON lines
    #[arg(long)]
    json: bool,

    /// Quiet period after an edit before the panel runs, in milliseconds
    #[arg(long, default_value_t = 200, env = "THRESHOLDPAD_DEBOUNCE_MS")]
    debounce_ms: u64,

    /// Times an operation is re-issued while the engine is busy
    #[arg(long, default_value_t = 8, env = "THRESHOLDPAD_BUSY_RETRIES")]
    busy_retries: u32,

    /// Secret keys sampled per generation before giving up
    #[arg(long, default_value_t = 20, env = "THRESHOLDPAD_KEYGEN_ATTEMPTS")]
    keygen_attempts: u32,

    /// Zero engine buffers after every operation
    #[arg(
        long,
        default_value_t = true,
        action = clap::ArgAction::Set,
        env = "THRESHOLDPAD_SCRUB_BUFFERS"
    )]
    scrub_buffers: bool,
}

impl Args {
    fn config(&self) -> PadConfig {
        PadConfig {
            debounce: Duration::from_millis(self.debounce_ms),
            busy_retry: RetryPolicy {
                max_attempts: self.busy_retries,
                ..RetryPolicy::default()
            },
            keygen_attempts: self.keygen_attempts.max(1),
            scrub_buffers: self.scrub_buffers,
        }
    }
}

// ── Output ────────────────────────────────────────────────────────────────────

fn render(event: &Event, json: bool) -> serde_json::Result<String> {
    if json {
        return serde_json::to_string(event);
    }
    Ok(match event {
        Event::FieldChanged {
            panel,
            field,
            value,
        } => format!("{panel}.{field} = {value}"),
        Event::Warning { message } => format!("warning: {message}"),
    })
}

async fn print_events(mut events: UnboundedReceiver<Event>, json: bool) -> serde_json::Result<()> {
    while let Some(event) = events.recv().await {
        println!("{}", render(&event, json)?);
    }
    Ok(())
}

// ── Entry Point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "thresholdpad=info,thresholdpad_core=info".into()),
        )
        .init();

    let args = Args::parse();
    let pad = Pad::threshold(args.config());
    let (dispatcher, events) = pad.dispatcher();
    let printer = tokio::spawn(print_events(events, args.json));

    eprintln!("thresholdpad {} - type 'help' for commands", thresholdpad_core::version());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match command::parse(&line) {
            Ok(None) => {}
            Ok(Some(Command::Quit)) => break,
            Ok(Some(Command::Set {
                panel,
                field,
                value,
            })) => {
                if let Err(e) = dispatcher.input(panel, field, value) {
                    println!("error: {e}");
                }
            }
            Ok(Some(Command::Generate)) => {
                // Success and failure are both reported through events.
                if let Ok(keys) = dispatcher.generate_keys().await {
                    tracing::debug!(attempts = keys.attempts, "key pair ready");
                }
            }
            Ok(Some(Command::Show)) => {
                for (panel, field, value) in dispatcher.snapshot() {
                    println!("{panel}.{field} = {value}");
                }
            }
            Ok(Some(Command::Help)) => println!("{HELP}"),
            Err(e) => println!("error: {e}"),
        }
    }

    dispatcher.settle().await;
    drop(dispatcher);
    printer.await??;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use thresholdpad_core::{Field, Panel};

    #[test]
    fn test_render_plain() {
        let event = Event::field(Panel::Verification, Field::Verdict, "valid");
        assert_eq!(render(&event, false).unwrap(), "verify.verdict = valid");
        assert_eq!(
            render(&Event::warning("engine busy"), false).unwrap(),
            "warning: engine busy"
        );
    }

    #[test]
    fn test_render_json() {
        let event = Event::field(Panel::KeyDerivation, Field::PublicKey, "ab");
        let line = render(&event, true).unwrap();
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["panel"], "keys");
        assert_eq!(value["field"], "public-key");
    }

    #[test]
    fn test_args_to_config() {
        let args = Args::parse_from(["thresholdpad", "--debounce-ms", "50", "--scrub-buffers", "false"]);
        let config = args.config();
        assert_eq!(config.debounce, Duration::from_millis(50));
        assert!(!config.scrub_buffers);
        assert_eq!(config.keygen_attempts, 20);
    }
}
