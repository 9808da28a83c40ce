//! Events - 利用者へ通知するイベントとセッション状態

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Error,
}

/// Fire-and-forget message for the user (the "toast").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == NotificationLevel::Error
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.level {
            NotificationLevel::Success => write!(f, "✔ {}", self.message),
            NotificationLevel::Error => write!(f, "✘ {}", self.message),
        }
    }
}

/// SessionState はコンソールのログイン状態
///
/// # 状態遷移
/// - Anonymous → SignedIn: サインイン成功
/// - SignedIn → SignInRequired: いずれかの呼び出しが 401 Unauthorized
/// - * → Anonymous: サインアウト
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Anonymous,
    SignedIn,
    SignInRequired,
}
