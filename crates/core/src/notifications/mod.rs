//! Notification fan-out.
//!
//! Terminal request outcomes flow through a [`NotificationSink`] into independent
//! observers: the ephemeral [`ToastQueue`], the persistent [`NotificationLogStore`],
//! the bounded [`ErrorLog`] and the console. All of them are plain constructed
//! values that callers inject; [`defaults`] exposes one process-wide instance of
//! each for convenience call sites.

mod error_log;
mod model;
mod sink;
mod store;
mod toast;

pub use error_log::*;
pub use model::*;
pub use sink::*;
pub use store::*;
pub use toast::*;

/// Process-wide default notification components.
pub mod defaults {
    use std::sync::Arc;

    use lazy_static::lazy_static;

    use super::{ErrorLog, NotificationLogStore, NotificationSink, ToastQueue};

    lazy_static! {
        static ref TOASTS: Arc<ToastQueue> = Arc::new(ToastQueue::new());
        static ref STORE: Arc<NotificationLogStore> = Arc::new(NotificationLogStore::new());
        static ref ERROR_LOG: Arc<ErrorLog> = Arc::new(ErrorLog::new());
        static ref SINK: NotificationSink =
            NotificationSink::standard(TOASTS.clone(), STORE.clone(), ERROR_LOG.clone());
    }

    pub fn toasts() -> Arc<ToastQueue> {
        TOASTS.clone()
    }

    pub fn store() -> Arc<NotificationLogStore> {
        STORE.clone()
    }

    pub fn error_log() -> Arc<ErrorLog> {
        ERROR_LOG.clone()
    }

    /// The standard sink wired to the default toast queue, store and error log.
    pub fn sink() -> NotificationSink {
        SINK.clone()
    }
}
