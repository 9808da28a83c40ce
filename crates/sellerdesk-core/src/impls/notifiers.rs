//! Notifier の実装
//!
//! - **TracingNotifier**: tracing のイベントとして出力
//! - **RecordingNotifier**: 通知を記録する（テスト・デモ用）

use std::sync::{Mutex, PoisonError};

use crate::domain::{Notification, NotificationLevel};
use crate::ports::Notifier;

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        match notification.level {
            NotificationLevel::Success => tracing::info!(text = %notification.message, "notify success"),
            NotificationLevel::Error => tracing::warn!(text = %notification.message, "notify error"),
        }
    }
}

#[derive(Debug, Default)]
pub struct RecordingNotifier {
    seen: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.seen.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn successes(&self) -> Vec<String> {
        self.messages(NotificationLevel::Success)
    }

    pub fn errors(&self) -> Vec<String> {
        self.messages(NotificationLevel::Error)
    }

    /// Take everything recorded so far.
    pub fn drain(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.seen.lock().unwrap_or_else(PoisonError::into_inner))
    }

    fn messages(&self, level: NotificationLevel) -> Vec<String> {
        self.notifications()
            .into_iter()
            .filter(|n| n.level == level)
            .map(|n| n.message)
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notification);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_notifier_splits_levels() {
        let notifier = RecordingNotifier::new();
        notifier.success("saved");
        notifier.error("cannot sell");
        notifier.success("saved again");

        assert_eq!(notifier.successes(), vec!["saved", "saved again"]);
        assert_eq!(notifier.errors(), vec!["cannot sell"]);
        assert_eq!(notifier.drain().len(), 3);
        assert!(notifier.notifications().is_empty());
    }
}
