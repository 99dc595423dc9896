//! Ephemeral toast queue.
//!
//! Toasts expire after a fixed display duration. Expiry is evaluated lazily when
//! the queue is read or pushed to, so no timer task is needed and a queue that
//! is never read stays bounded.

use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use log::warn;
use uuid::Uuid;

use super::model::{NotificationOutcome, NotificationType};
use super::sink::NotificationObserver;
use crate::constants::TOAST_DURATION_MS;
use crate::errors::{NotificationError, Severity};

/// Optional call to action shown on a toast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToastAction {
    pub label: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ToastMessage {
    pub id: Uuid,
    pub toast_type: NotificationType,
    pub title: Option<String>,
    pub message: String,
    pub action: Option<ToastAction>,
    pub severity: Option<Severity>,
    pub created_at: Instant,
    pub expires_at: Instant,
}

impl ToastMessage {
    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

pub struct ToastQueue {
    toasts: Mutex<Vec<ToastMessage>>,
    duration: Duration,
}

impl ToastQueue {
    pub fn new() -> Self {
        Self::with_duration(Duration::from_millis(TOAST_DURATION_MS))
    }

    pub fn with_duration(duration: Duration) -> Self {
        Self {
            toasts: Mutex::new(Vec::new()),
            duration,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<ToastMessage>> {
        self.toasts.lock().unwrap_or_else(|poisoned| {
            warn!("Toast queue mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Shows a toast built from an outcome, returning its id.
    pub fn push(&self, outcome: &NotificationOutcome) -> Uuid {
        self.push_at(outcome, Instant::now())
    }

    pub fn push_at(&self, outcome: &NotificationOutcome, now: Instant) -> Uuid {
        let action = match (&outcome.action_url, &outcome.action_text) {
            (Some(url), Some(label)) => Some(ToastAction {
                label: label.clone(),
                url: url.clone(),
            }),
            _ => None,
        };
        let toast = ToastMessage {
            id: Uuid::new_v4(),
            toast_type: outcome.notification_type,
            title: outcome.title.clone(),
            message: outcome.message.clone(),
            action,
            severity: outcome.severity,
            created_at: now,
            expires_at: now + self.duration,
        };
        let id = toast.id;
        let mut toasts = self.lock();
        toasts.retain(|t| !t.is_expired(now));
        toasts.push(toast);
        id
    }

    /// Removes a toast before it expires. Returns false if it was already gone.
    pub fn dismiss(&self, id: Uuid) -> bool {
        let mut toasts = self.lock();
        let before = toasts.len();
        toasts.retain(|t| t.id != id);
        toasts.len() != before
    }

    /// Currently visible toasts, oldest first.
    pub fn visible(&self) -> Vec<ToastMessage> {
        self.visible_at(Instant::now())
    }

    /// Visible toasts at `now`; expired toasts are dropped from the queue.
    pub fn visible_at(&self, now: Instant) -> Vec<ToastMessage> {
        let mut toasts = self.lock();
        toasts.retain(|t| !t.is_expired(now));
        toasts.clone()
    }

    /// Every toast not yet pruned, including expired ones.
    pub fn history(&self) -> Vec<ToastMessage> {
        self.lock().clone()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

impl Default for ToastQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationObserver for ToastQueue {
    fn name(&self) -> &'static str {
        "toast"
    }

    fn observe(&self, outcome: &NotificationOutcome) -> Result<(), NotificationError> {
        if outcome.show_toast {
            self.push(outcome);
        }
        Ok(())
    }
}
