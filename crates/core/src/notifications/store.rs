//! Persistent notification log with read/unread tracking.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use log::{debug, warn};
use uuid::Uuid;

use super::model::{NewNotification, NotificationFilter, NotificationOutcome, NotificationRecord};
use super::sink::NotificationObserver;
use crate::errors::NotificationError;

#[derive(Debug, Default)]
struct StoreState {
    /// Most recent first.
    records: VecDeque<NotificationRecord>,
    unread: usize,
}

/// Shared, ordered collection of persistent notifications.
///
/// Every mutation runs under a single lock acquisition, so `unread_count`
/// always equals the number of records with `read == false`. The count is
/// maintained incrementally rather than recomputed.
#[derive(Debug, Default)]
pub struct NotificationLogStore {
    state: Mutex<StoreState>,
}

impl NotificationLogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock the state, recovering from poison.
    ///
    /// Each mutation leaves the state consistent before any fallible step, so a
    /// poisoned guard still holds a valid store.
    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(|poisoned| {
            warn!("Notification store mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Adds a notification at the front of the log and returns its id.
    pub fn add(&self, notification: NewNotification) -> Uuid {
        let record = NotificationRecord {
            id: Uuid::now_v7(),
            notification_type: notification.notification_type,
            title: notification.title,
            message: notification.message,
            category: notification.category,
            read: notification.read,
            persistent: true,
            created_at: Utc::now(),
            action_url: notification.action_url,
            action_text: notification.action_text,
        };
        let id = record.id;

        let mut state = self.lock();
        if !record.read {
            state.unread += 1;
        }
        state.records.push_front(record);
        debug!("Notification {} added ({} unread)", id, state.unread);
        id
    }

    /// Marks one notification read. Returns false if the id is unknown.
    pub fn mark_read(&self, id: Uuid) -> bool {
        let mut guard = self.lock();
        let state = &mut *guard;
        let Some(record) = state.records.iter_mut().find(|r| r.id == id) else {
            return false;
        };
        if !record.read {
            record.read = true;
            state.unread -= 1;
        }
        true
    }

    pub fn mark_all_read(&self) {
        let mut state = self.lock();
        if state.unread == 0 {
            return;
        }
        for record in state.records.iter_mut() {
            record.read = true;
        }
        state.unread = 0;
    }

    /// Removes one notification. Returns false if the id is unknown.
    pub fn delete(&self, id: Uuid) -> bool {
        let mut state = self.lock();
        let Some(index) = state.records.iter().position(|r| r.id == id) else {
            return false;
        };
        if let Some(removed) = state.records.remove(index) {
            if !removed.read {
                state.unread -= 1;
            }
        }
        true
    }

    pub fn clear_all(&self) {
        let mut state = self.lock();
        state.records.clear();
        state.unread = 0;
    }

    /// Returns matching records, most recent first. Does not mutate.
    pub fn filter(&self, filter: NotificationFilter) -> Vec<NotificationRecord> {
        self.lock()
            .records
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect()
    }

    pub fn all(&self) -> Vec<NotificationRecord> {
        self.filter(NotificationFilter::All)
    }

    pub fn get(&self, id: Uuid) -> Option<NotificationRecord> {
        self.lock().records.iter().find(|r| r.id == id).cloned()
    }

    pub fn unread_count(&self) -> usize {
        self.lock().unread
    }

    pub fn len(&self) -> usize {
        self.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().records.is_empty()
    }
}

impl NotificationObserver for NotificationLogStore {
    fn name(&self) -> &'static str {
        "notification-log"
    }

    fn observe(&self, outcome: &NotificationOutcome) -> Result<(), NotificationError> {
        if outcome.persistent {
            self.add(NewNotification::from(outcome));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifications::model::{NotificationCategory, NotificationType};

    fn order_update(title: &str) -> NewNotification {
        NewNotification::new(NotificationType::Info, title, "Order status changed")
            .category(NotificationCategory::Order)
    }

    fn assert_unread_consistent(store: &NotificationLogStore) {
        let counted = store.all().iter().filter(|r| !r.read).count();
        assert_eq!(store.unread_count(), counted);
    }

    #[test]
    fn test_add_prepends_and_counts_unread() {
        let store = NotificationLogStore::new();
        let first = store.add(order_update("first"));
        let second = store.add(order_update("second"));

        let all = store.all();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, second);
        assert_eq!(all[1].id, first);
        assert_eq!(store.unread_count(), 2);
        assert!(all.iter().all(|r| r.persistent));
    }

    #[test]
    fn test_add_read_record_does_not_count() {
        let store = NotificationLogStore::new();
        store.add(order_update("seen").read());
        assert_eq!(store.unread_count(), 0);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_mark_read_is_idempotent() {
        let store = NotificationLogStore::new();
        let id = store.add(order_update("a"));
        store.add(order_update("b"));

        assert!(store.mark_read(id));
        assert!(store.mark_read(id));
        assert_eq!(store.unread_count(), 1);
        assert!(!store.mark_read(Uuid::now_v7()));
        assert_unread_consistent(&store);
    }

    #[test]
    fn test_mark_all_read_empties_unread_filter() {
        let store = NotificationLogStore::new();
        for title in ["a", "b", "c"] {
            store.add(order_update(title));
        }
        store.mark_all_read();
        assert_eq!(store.unread_count(), 0);
        assert!(store.filter(NotificationFilter::Unread).is_empty());
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_delete_adjusts_unread_only_for_unread_records() {
        let store = NotificationLogStore::new();
        let read = store.add(order_update("read"));
        let unread = store.add(order_update("unread"));
        store.mark_read(read);

        assert!(store.delete(read));
        assert_eq!(store.unread_count(), 1);
        assert!(store.delete(unread));
        assert_eq!(store.unread_count(), 0);
        assert!(!store.delete(unread));
        assert!(store.is_empty());
    }

    #[test]
    fn test_filter_by_category() {
        let store = NotificationLogStore::new();
        store.add(order_update("order"));
        store.add(
            NewNotification::new(NotificationType::Warning, "Password", "Password expires soon")
                .category(NotificationCategory::Account),
        );

        let orders = store.filter(NotificationFilter::Category(NotificationCategory::Order));
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].title, "order");
        assert!(store
            .filter(NotificationFilter::Category(NotificationCategory::Promotion))
            .is_empty());
    }

    #[test]
    fn test_clear_all() {
        let store = NotificationLogStore::new();
        store.add(order_update("a"));
        store.add(order_update("b"));
        store.clear_all();
        assert!(store.is_empty());
        assert_eq!(store.unread_count(), 0);
    }

    #[test]
    fn test_observer_only_keeps_persistent_outcomes() {
        let store = NotificationLogStore::new();
        store
            .observe(&NotificationOutcome::success("Saved"))
            .unwrap();
        assert!(store.is_empty());

        store
            .observe(
                &NotificationOutcome::success("Order placed")
                    .with_title("Order Confirmed")
                    .persist(NotificationCategory::Order)
                    .with_action("/orders/7", "View"),
            )
            .unwrap();
        let records = store.all();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "Order Confirmed");
        assert_eq!(records[0].category, NotificationCategory::Order);
        assert_eq!(records[0].action_text.as_deref(), Some("View"));
    }
}
