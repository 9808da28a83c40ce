//! Notifier port - 利用者への通知（トースト相当）
//!
//! 通知は fire-and-forget です。戻り値はなく、失敗も呼び出し側へ返しません。

use crate::domain::Notification;

pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);

    fn success(&self, message: &str) {
        self.notify(Notification::success(message));
    }

    fn error(&self, message: &str) {
        self.notify(Notification::error(message));
    }
}
