//! Notification sink and observer trait.

use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, PoisonError};

use log::{warn, Level};

use super::error_log::ErrorLog;
use super::model::{NotificationOutcome, NotificationType};
use super::store::NotificationLogStore;
use super::toast::ToastQueue;
use crate::errors::{NotificationError, Severity};

/// Receives terminal outcomes from the sink.
///
/// # Design Rules
///
/// - `observe()` must be fast and non-blocking (no network calls)
/// - Errors are reported to the sink, which logs them and moves on
/// - A panic is caught by the sink and treated like an error
pub trait NotificationObserver: Send + Sync {
    /// Identifier used in diagnostics.
    fn name(&self) -> &'static str;

    fn observe(&self, outcome: &NotificationOutcome) -> Result<(), NotificationError>;
}

/// Fans one outcome out to an ordered list of observers.
///
/// Observers run synchronously in registration order. A failing or panicking
/// observer is logged and skipped; `notify` itself never fails.
#[derive(Clone, Default)]
pub struct NotificationSink {
    observers: Vec<Arc<dyn NotificationObserver>>,
}

impl NotificationSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard chain: toast queue, notification log, error log, console.
    pub fn standard(
        toasts: Arc<ToastQueue>,
        store: Arc<NotificationLogStore>,
        error_log: Arc<ErrorLog>,
    ) -> Self {
        Self::new()
            .with_observer(toasts)
            .with_observer(store)
            .with_observer(error_log)
            .with_observer(Arc::new(ConsoleObserver))
    }

    pub fn with_observer(mut self, observer: Arc<dyn NotificationObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn observer_names(&self) -> Vec<&'static str> {
        self.observers.iter().map(|o| o.name()).collect()
    }

    pub fn notify(&self, outcome: NotificationOutcome) {
        for observer in &self.observers {
            match panic::catch_unwind(AssertUnwindSafe(|| observer.observe(&outcome))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(
                    "Notification observer '{}' failed for '{}': {}",
                    observer.name(),
                    outcome.message,
                    e
                ),
                Err(_) => warn!(
                    "Notification observer '{}' panicked for '{}'",
                    observer.name(),
                    outcome.message
                ),
            }
        }
    }
}

impl std::fmt::Debug for NotificationSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationSink")
            .field("observers", &self.observer_names())
            .finish()
    }
}

/// Writes every outcome to the `log` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleObserver;

impl NotificationObserver for ConsoleObserver {
    fn name(&self) -> &'static str {
        "console"
    }

    fn observe(&self, outcome: &NotificationOutcome) -> Result<(), NotificationError> {
        log::log!(
            console_level(outcome),
            "[{}] {}: {}",
            outcome.context.as_deref().unwrap_or("-"),
            outcome.display_title(),
            outcome.message
        );
        Ok(())
    }
}

/// Low-severity errors (not found, validation) are expected traffic and log as warnings.
fn console_level(outcome: &NotificationOutcome) -> Level {
    match outcome.notification_type {
        NotificationType::Error if outcome.severity == Some(Severity::Low) => Level::Warn,
        NotificationType::Error => Level::Error,
        NotificationType::Warning => Level::Warn,
        NotificationType::Success | NotificationType::Info => Level::Info,
    }
}

/// Observer for tests - collects every outcome it sees.
#[derive(Clone, Default)]
pub struct RecordingObserver {
    outcomes: Arc<Mutex<Vec<NotificationOutcome>>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn outcomes(&self) -> Vec<NotificationOutcome> {
        self.outcomes.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Outcomes of the given type.
    pub fn of_type(&self, notification_type: NotificationType) -> Vec<NotificationOutcome> {
        self.outcomes()
            .into_iter()
            .filter(|o| o.notification_type == notification_type)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.outcomes.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.lock().unwrap_or_else(PoisonError::into_inner).is_empty()
    }
}

impl NotificationObserver for RecordingObserver {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn observe(&self, outcome: &NotificationOutcome) -> Result<(), NotificationError> {
        self.outcomes.lock().unwrap_or_else(PoisonError::into_inner).push(outcome.clone());
        Ok(())
    }
}
