//! Bounded diagnostic log of high-severity failures.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use log::warn;
use serde::{Deserialize, Serialize};

use super::model::{NotificationOutcome, NotificationType};
use super::sink::NotificationObserver;
use crate::constants::ERROR_LOG_CAPACITY;
use crate::errors::{NotificationError, Severity};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorLogEntry {
    pub timestamp: DateTime<Utc>,
    pub severity: Severity,
    pub title: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

/// Keeps the most recent High/Critical failures, evicting the oldest first.
pub struct ErrorLog {
    entries: Mutex<VecDeque<ErrorLogEntry>>,
    capacity: usize,
}

impl ErrorLog {
    pub fn new() -> Self {
        Self::with_capacity(ERROR_LOG_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<ErrorLogEntry>> {
        self.entries.lock().unwrap_or_else(|poisoned| {
            warn!("Error log mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    pub fn record(&self, entry: ErrorLogEntry) {
        if self.capacity == 0 {
            return;
        }
        let mut entries = self.lock();
        while entries.len() >= self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    /// Entries oldest first.
    pub fn entries(&self) -> Vec<ErrorLogEntry> {
        self.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Serializes the log for a diagnostics export.
    pub fn export_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.entries())
    }
}

impl Default for ErrorLog {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationObserver for ErrorLog {
    fn name(&self) -> &'static str {
        "error-log"
    }

    fn observe(&self, outcome: &NotificationOutcome) -> Result<(), NotificationError> {
        if outcome.notification_type != NotificationType::Error {
            return Ok(());
        }
        match outcome.severity {
            Some(severity) if severity.is_loggable() => {
                self.record(ErrorLogEntry {
                    timestamp: Utc::now(),
                    severity,
                    title: outcome.display_title(),
                    message: outcome.message.clone(),
                    context: outcome.context.clone(),
                });
            }
            _ => {}
        }
        Ok(())
    }
}
