//! Session - ログイン状態と認可フック
//!
//! 状態は `tokio::sync::watch` で配信します。どの API 呼び出しでも
//! `ApiError::Unauthorized` が返れば `SignInRequired` に切り替わります
//! （コーディネーターの外側で横断的に適用）。

use tokio::sync::watch;

use crate::domain::{ApiError, SessionState};

pub struct SessionTracker {
    state_tx: watch::Sender<SessionState>,
}

impl Default for SessionTracker {
    fn default() -> Self {
        Self::new(SessionState::Anonymous)
    }
}

impl SessionTracker {
    pub fn new(initial: SessionState) -> Self {
        let (state_tx, _) = watch::channel(initial);
        Self { state_tx }
    }

    pub fn state(&self) -> SessionState {
        *self.state_tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state_tx.subscribe()
    }

    pub fn signed_in(&self) {
        self.set(SessionState::SignedIn);
    }

    pub fn signed_out(&self) {
        self.set(SessionState::Anonymous);
    }

    /// 認可フック: 結果はそのまま返す
    pub fn observe<T>(&self, result: Result<T, ApiError>) -> Result<T, ApiError> {
        if let Err(ApiError::Unauthorized) = &result {
            self.set(SessionState::SignInRequired);
        }
        result
    }

    fn set(&self, next: SessionState) {
        let changed = self.state_tx.send_if_modified(|state| {
            if *state == next {
                return false;
            }
            *state = next;
            true
        });
        if changed {
            tracing::info!(state = ?next, "session state changed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_forces_sign_in() {
        let session = SessionTracker::new(SessionState::SignedIn);
        let result: Result<(), _> = session.observe(Err(ApiError::Unauthorized));
        assert!(result.is_err());
        assert_eq!(session.state(), SessionState::SignInRequired);
    }

    #[test]
    fn other_failures_leave_the_session_alone() {
        let session = SessionTracker::new(SessionState::SignedIn);
        let _ = session.observe::<()>(Err(ApiError::application(401, "Invalid credentials")));
        let _ = session.observe::<()>(Err(ApiError::Transport("down".into())));
        assert_eq!(session.state(), SessionState::SignedIn);
    }

    #[tokio::test]
    async fn subscribers_see_transitions() {
        let session = SessionTracker::default();
        let mut rx = session.subscribe();

        session.signed_in();
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), SessionState::SignedIn);

        // 同じ状態への遷移は通知しない
        session.signed_in();
        assert!(!rx.has_changed().unwrap());

        session.signed_out();
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), SessionState::Anonymous);
    }
}
