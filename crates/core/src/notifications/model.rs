//! Notification domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{ErrorClassification, Severity};

// =============================================================================
// Type & Category
// =============================================================================

/// Visual type shared by toasts and persistent notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationType {
    Success,
    Error,
    Warning,
    Info,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::Success => "success",
            NotificationType::Error => "error",
            NotificationType::Warning => "warning",
            NotificationType::Info => "info",
        }
    }

    /// Toast type for a failure of the given severity.
    pub fn for_severity(severity: Severity) -> Self {
        match severity {
            Severity::Low => NotificationType::Warning,
            Severity::Medium | Severity::High | Severity::Critical => NotificationType::Error,
        }
    }
}

impl std::fmt::Display for NotificationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Category used by the notification panel's filter tabs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NotificationCategory {
    Order,
    System,
    Promotion,
    Account,
    #[default]
    General,
}

impl NotificationCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationCategory::Order => "order",
            NotificationCategory::System => "system",
            NotificationCategory::Promotion => "promotion",
            NotificationCategory::Account => "account",
            NotificationCategory::General => "general",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            NotificationCategory::Order => "Orders",
            NotificationCategory::System => "System",
            NotificationCategory::Promotion => "Promotions",
            NotificationCategory::Account => "Account",
            NotificationCategory::General => "General",
        }
    }
}

impl std::fmt::Display for NotificationCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

// =============================================================================
// Persistent records
// =============================================================================

/// A notification retained in the log until read/deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRecord {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    pub category: NotificationCategory,
    pub read: bool,
    pub persistent: bool,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_text: Option<String>,
}

/// Input for [`NotificationLogStore::add`](super::NotificationLogStore::add).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewNotification {
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    #[serde(default)]
    pub category: NotificationCategory,
    #[serde(default)]
    pub read: bool,
    pub action_url: Option<String>,
    pub action_text: Option<String>,
}

impl NewNotification {
    pub fn new(
        notification_type: NotificationType,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            notification_type,
            title: title.into(),
            message: message.into(),
            category: NotificationCategory::General,
            read: false,
            action_url: None,
            action_text: None,
        }
    }

    pub fn category(mut self, category: NotificationCategory) -> Self {
        self.category = category;
        self
    }

    pub fn action(mut self, url: impl Into<String>, text: impl Into<String>) -> Self {
        self.action_url = Some(url.into());
        self.action_text = Some(text.into());
        self
    }

    pub fn read(mut self) -> Self {
        self.read = true;
        self
    }
}

/// Projection used by the notification panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationFilter {
    All,
    Unread,
    Category(NotificationCategory),
}

impl NotificationFilter {
    pub fn matches(&self, record: &NotificationRecord) -> bool {
        match self {
            NotificationFilter::All => true,
            NotificationFilter::Unread => !record.read,
            NotificationFilter::Category(category) => record.category == *category,
        }
    }
}

// =============================================================================
// Outcome
// =============================================================================

/// A terminal outcome handed to the [`NotificationSink`](super::NotificationSink).
///
/// Toasts and persistent records are independent projections of the same outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationOutcome {
    pub notification_type: NotificationType,
    pub title: Option<String>,
    pub message: String,
    /// Set for failures; drives toast styling and the diagnostic error log.
    pub severity: Option<Severity>,
    /// False when the caller suppressed UI notifications.
    pub show_toast: bool,
    pub persistent: bool,
    pub category: NotificationCategory,
    pub action_url: Option<String>,
    pub action_text: Option<String>,
    /// Free-form origin, e.g. `GET /orders`.
    pub context: Option<String>,
}

impl NotificationOutcome {
    pub fn new(notification_type: NotificationType, message: impl Into<String>) -> Self {
        Self {
            notification_type,
            title: None,
            message: message.into(),
            severity: None,
            show_toast: true,
            persistent: false,
            category: NotificationCategory::General,
            action_url: None,
            action_text: None,
            context: None,
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NotificationType::Success, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NotificationType::Error, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(NotificationType::Warning, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NotificationType::Info, message)
    }

    /// Outcome for a terminal request failure.
    pub fn failure(classification: &ErrorClassification, message: impl Into<String>) -> Self {
        Self::new(
            NotificationType::for_severity(classification.severity),
            message,
        )
        .with_title(classification.kind.title())
        .with_severity(classification.severity)
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = Some(severity);
        self
    }

    /// Also keep this outcome in the notification log.
    pub fn persist(mut self, category: NotificationCategory) -> Self {
        self.persistent = true;
        self.category = category;
        self
    }

    pub fn with_action(mut self, url: impl Into<String>, text: impl Into<String>) -> Self {
        self.action_url = Some(url.into());
        self.action_text = Some(text.into());
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Suppress the toast; persistent records and logging still happen.
    pub fn silent(mut self) -> Self {
        self.show_toast = false;
        self
    }

    pub fn show_toast(mut self, show: bool) -> Self {
        self.show_toast = show;
        self
    }

    /// Title to display, falling back to the type name.
    pub fn display_title(&self) -> String {
        match &self.title {
            Some(title) => title.clone(),
            None => match self.notification_type {
                NotificationType::Success => "Success".to_string(),
                NotificationType::Error => "Error".to_string(),
                NotificationType::Warning => "Warning".to_string(),
                NotificationType::Info => "Info".to_string(),
            },
        }
    }
}

impl From<&NotificationOutcome> for NewNotification {
    fn from(outcome: &NotificationOutcome) -> Self {
        Self {
            notification_type: outcome.notification_type,
            title: outcome.display_title(),
            message: outcome.message.clone(),
            category: outcome.category,
            read: false,
            action_url: outcome.action_url.clone(),
            action_text: outcome.action_text.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;

    #[test]
    fn test_failure_outcome_maps_severity_to_type() {
        let not_found = NotificationOutcome::failure(
            &ErrorKind::NotFound.classification(),
            "Product not found",
        );
        assert_eq!(not_found.notification_type, NotificationType::Warning);
        assert_eq!(not_found.severity, Some(Severity::Low));
        assert_eq!(not_found.title.as_deref(), Some("Not Found"));

        let server = NotificationOutcome::failure(&ErrorKind::ServerError.classification(), "");
        assert_eq!(server.notification_type, NotificationType::Error);
    }

    #[test]
    fn test_filter_matches() {
        let record = NotificationRecord {
            id: Uuid::now_v7(),
            notification_type: NotificationType::Info,
            title: "Shipped".to_string(),
            message: "Your order shipped".to_string(),
            category: NotificationCategory::Order,
            read: false,
            persistent: true,
            created_at: Utc::now(),
            action_url: None,
            action_text: None,
        };
        assert!(NotificationFilter::All.matches(&record));
        assert!(NotificationFilter::Unread.matches(&record));
        assert!(NotificationFilter::Category(NotificationCategory::Order).matches(&record));
        assert!(!NotificationFilter::Category(NotificationCategory::Account).matches(&record));
    }

    #[test]
    fn test_record_serializes_type_field() {
        let new = NewNotification::new(NotificationType::Success, "Paid", "Payment received")
            .category(NotificationCategory::Order)
            .action("/orders/42", "View order");
        let json = serde_json::to_value(&new).unwrap();
        assert_eq!(json["type"], "success");
        assert_eq!(json["category"], "order");
        assert_eq!(json["actionUrl"], "/orders/42");
    }
}
