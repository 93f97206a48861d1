//! # Debounced Dispatcher
//!
//! Turns a stream of field edits into engine operations.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        ONE PANEL                                        │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  edit ──► store value ──► abort pending task ──► spawn new task        │
//! │                                                     │                   │
//! │                                          sleep(debounce)                │
//! │                                                     │                   │
//! │                              read fields, validate, try_session         │
//! │                                 │                      │                │
//! │                              busy                   acquired            │
//! │                                 │                      │                │
//! │                  sleep(backoff), try again      run, render, publish    │
//! │                  give up after max_attempts                             │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each panel has at most one pending task. Aborting only ever lands on a
//! sleep; an engine call that has started always runs to completion.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::config::PadConfig;
use crate::engine::Engine;
use crate::error::{Error, Result};
use crate::events::{Event, Field, Panel};
use crate::keygen::{GeneratedKeys, KeyGenerator};
use crate::orchestrator::{log_failure, render_or_blank, Orchestrator, Response};

/// How often `settle` checks for outstanding panel tasks
const SETTLE_POLL: Duration = Duration::from_millis(5);

/// Receiving end of a dispatcher's events
pub type EventReceiver = mpsc::UnboundedReceiver<Event>;

enum Attempt {
    Busy,
    Done(Result<Response>),
}

struct Inner<E> {
    orchestrator: Orchestrator<E>,
    keygen: KeyGenerator<E>,
    config: PadConfig,
    form: RwLock<HashMap<Panel, HashMap<Field, String>>>,
    pending: Mutex<HashMap<Panel, JoinHandle<()>>>,
    events: mpsc::UnboundedSender<Event>,
}

/// Debounces edits per panel and runs the panel's operation once they settle
pub struct Dispatcher<E> {
    inner: Arc<Inner<E>>,
}

impl<E: Engine + 'static> Dispatcher<E> {
    /// Create a dispatcher and the receiver its events are published on.
    ///
    /// Must be used from within a tokio runtime.
    pub fn new(
        orchestrator: Orchestrator<E>,
        keygen: KeyGenerator<E>,
        config: PadConfig,
    ) -> (Self, EventReceiver) {
        let (events, receiver) = mpsc::unbounded_channel();
        let inner = Inner {
            orchestrator,
            keygen,
            config,
            form: RwLock::new(HashMap::new()),
            pending: Mutex::new(HashMap::new()),
            events,
        };
        (
            Self {
                inner: Arc::new(inner),
            },
            receiver,
        )
    }

    /// Record an edit and schedule the panel's operation.
    ///
    /// Fails with [`Error::UnknownField`] if `field` is not an input of `panel`.
    pub fn input(&self, panel: Panel, field: Field, value: impl Into<String>) -> Result<()> {
        if !panel.accepts(field) {
            return Err(Error::UnknownField {
                panel: panel.to_string(),
                field: field.to_string(),
            });
        }
        self.inner
            .form
            .write()
            .entry(panel)
            .or_default()
            .insert(field, value.into());
        self.schedule(panel);
        Ok(())
    }

    /// Current text of a field, if it was ever set
    pub fn value(&self, panel: Panel, field: Field) -> Option<String> {
        self.inner
            .form
            .read()
            .get(&panel)
            .and_then(|fields| fields.get(&field))
            .cloned()
    }

    /// Every field that has a value, ordered by panel and field
    pub fn snapshot(&self) -> Vec<(Panel, Field, String)> {
        let form = self.inner.form.read();
        let mut values: Vec<_> = form
            .iter()
            .flat_map(|(panel, fields)| {
                fields
                    .iter()
                    .map(move |(field, value)| (*panel, *field, value.clone()))
            })
            .collect();
        values.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));
        values
    }

    /// Whether an engine operation is in flight
    pub fn is_busy(&self) -> bool {
        self.inner.orchestrator.adapter().is_busy()
    }

    /// Generate a key pair and publish it on the key derivation panel.
    ///
    /// On failure both key fields are blanked, and user-visible failures are
    /// also published as a warning.
    pub async fn generate_keys(&self) -> Result<GeneratedKeys> {
        if let Some(handle) = self.inner.pending.lock().remove(&Panel::KeyDerivation) {
            handle.abort();
        }

        let inner = self.inner.clone();
        let outcome = tokio::task::spawn_blocking(move || inner.keygen.generate())
            .await
            .map_err(|e| Error::Internal(format!("key generation task failed: {e}")))
            .and_then(|outcome| outcome);

        let (secret_key, public_key) = match &outcome {
            Ok(keys) => (keys.secret_key.to_hex(), keys.public_key.to_hex()),
            Err(e) => {
                log_failure(Panel::KeyDerivation, e);
                self.inner.warn_if_visible(e);
                (String::new(), String::new())
            }
        };
        self.inner
            .publish(Panel::KeyDerivation, Field::SecretKey, secret_key);
        self.inner
            .publish(Panel::KeyDerivation, Field::PublicKey, public_key);
        outcome
    }

    /// Wait until every pending panel task has finished.
    ///
    /// Handles stay registered while waiting, so an edit made meanwhile still
    /// replaces the task it supersedes.
    pub async fn settle(&self) {
        loop {
            let busy = {
                let mut pending = self.inner.pending.lock();
                pending.retain(|_, handle| !handle.is_finished());
                !pending.is_empty()
            };
            if !busy {
                return;
            }
            tokio::time::sleep(SETTLE_POLL).await;
        }
    }

    /// Abort every pending panel task
    pub fn shutdown(&self) {
        for (_, handle) in self.inner.pending.lock().drain() {
            handle.abort();
        }
    }

    fn schedule(&self, panel: Panel) {
        let inner = self.inner.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(inner.config.debounce).await;
            inner.run(panel).await;
        });
        if let Some(previous) = self.inner.pending.lock().insert(panel, handle) {
            tracing::trace!(panel = %panel, "Replacing pending invocation");
            previous.abort();
        }
    }
}

impl<E> Drop for Dispatcher<E> {
    fn drop(&mut self) {
        for (_, handle) in self.inner.pending.lock().drain() {
            handle.abort();
        }
    }
}

impl<E: Engine> Inner<E> {
    async fn run(&self, panel: Panel) {
        let policy = self.config.busy_retry;
        let mut retries = 0;
        loop {
            match self.attempt(panel) {
                Attempt::Done(outcome) => {
                    if let Err(e) = &outcome {
                        self.warn_if_visible(e);
                    }
                    let value = render_or_blank(panel, &outcome);
                    self.publish(panel, panel.output(), value);
                    return;
                }
                Attempt::Busy if retries >= policy.max_attempts => {
                    let e = Error::EngineBusy {
                        attempts: retries + 1,
                    };
                    log_failure(panel, &e);
                    self.warn_if_visible(&e);
                    self.publish(panel, panel.output(), String::new());
                    return;
                }
                Attempt::Busy => {
                    retries += 1;
                    let delay = policy.delay_for(retries);
                    tracing::trace!(panel = %panel, retry = retries, ?delay, "Engine busy, re-issuing later");
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    /// Validate and, if the engine is free, execute. Holds no lock on return.
    fn attempt(&self, panel: Panel) -> Attempt {
        let prepared = {
            let form = self.form.read();
            let empty = HashMap::new();
            let fields = form.get(&panel).unwrap_or(&empty);
            self.orchestrator.prepare(panel, fields)
        };
        let request = match prepared {
            Ok(request) => request,
            Err(e) => return Attempt::Done(Err(e)),
        };

        let Some(mut session) = self.orchestrator.adapter().try_session() else {
            return Attempt::Busy;
        };
        Attempt::Done(self.orchestrator.execute(&mut session, &request))
    }

    fn publish(&self, panel: Panel, field: Field, value: String) {
        self.form
            .write()
            .entry(panel)
            .or_default()
            .insert(field, value.clone());
        self.send(Event::field(panel, field, value));
    }

    fn warn_if_visible(&self, error: &Error) {
        if error.is_user_visible() {
            self.send(Event::warning(error.to_string()));
        }
    }

    fn send(&self, event: Event) {
        if self.events.send(event).is_err() {
            tracing::trace!("Event receiver dropped");
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
