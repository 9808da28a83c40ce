//! Errors - エラー型と分類
//!
//! # 分類
//! - Transport: ネットワーク到達不能・タイムアウト（汎用メッセージで通知）
//! - Application: 2xx 以外 + `{ statusCode, message }`（message をそのまま表示）
//! - Authorization: 401 + "Unauthorized"（セッションをサインイン待ちに戻す）
//! - Validation: 送信前のクライアント側チェック（ネットワークに出ない）

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

/// ユーザーに見せる汎用メッセージ（サーバーのメッセージがないとき）
pub const GENERIC_FAILURE_MESSAGE: &str = "Something went wrong. Please try again.";

/// ErrorKind はエラーの運用分類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Transport,
    Application,
    Authorization,
    Validation,
}

/// Failure of any call made through the marketplace API.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("request failed with status {status}: {}", .message.as_deref().unwrap_or("<no message>"))]
    Application {
        status: u16,
        message: Option<String>,
    },

    #[error("unauthorized")]
    Unauthorized,

    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    #[error("unexpected response body: {0}")]
    Decode(String),
}

impl ApiError {
    pub fn application(status: u16, message: impl Into<String>) -> Self {
        ApiError::Application {
            status,
            message: Some(message.into()),
        }
    }

    /// Classify a non-2xx response. Only a 401 whose message is exactly
    /// `Unauthorized` counts as an authorization failure.
    pub fn from_status(status: u16, message: Option<String>) -> Self {
        if status == 401 && message.as_deref() == Some("Unauthorized") {
            ApiError::Unauthorized
        } else {
            ApiError::Application { status, message }
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Transport(_) | ApiError::Decode(_) => ErrorKind::Transport,
            ApiError::Application { .. } => ErrorKind::Application,
            ApiError::Unauthorized => ErrorKind::Authorization,
            ApiError::Validation(_) => ErrorKind::Validation,
        }
    }

    /// Text for the error notification: the server message verbatim when there
    /// is one, otherwise the generic message.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Application {
                message: Some(message),
                ..
            } if !message.trim().is_empty() => message.clone(),
            ApiError::Validation(errors) => errors.to_string(),
            _ => GENERIC_FAILURE_MESSAGE.to_string(),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Application { status, .. } => Some(*status),
            ApiError::Unauthorized => Some(401),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Decode(err.to_string())
    }
}

/// Field → messages collected by the form schemas.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    fields: BTreeMap<&'static str, Vec<String>>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.fields.entry(field).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn field(&self, field: &str) -> &[String] {
        self.fields.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn fields(&self) -> impl Iterator<Item = (&'static str, &[String])> {
        self.fields.iter().map(|(k, v)| (*k, v.as_slice()))
    }

    /// `Ok(value)` when nothing was recorded.
    pub fn into_result<T>(self, value: T) -> Result<T, ValidationErrors> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.fields {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{field}: {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::marker(401, Some("Unauthorized"), ErrorKind::Authorization)]
    #[case::other_401(401, Some("Invalid credentials"), ErrorKind::Application)]
    #[case::bad_request(400, Some("cannot sell"), ErrorKind::Application)]
    #[case::no_body(500, None, ErrorKind::Application)]
    fn classifies_statuses(
        #[case] status: u16,
        #[case] message: Option<&str>,
        #[case] expected: ErrorKind,
    ) {
        let err = ApiError::from_status(status, message.map(str::to_string));
        assert_eq!(err.kind(), expected);
    }

    #[test]
    fn server_message_is_shown_verbatim() {
        let err = ApiError::application(400, "cannot sell");
        assert_eq!(err.user_message(), "cannot sell");
    }

    #[rstest]
    #[case::transport(ApiError::Transport("connection refused".into()))]
    #[case::no_message(ApiError::Application { status: 500, message: None })]
    #[case::blank_message(ApiError::application(500, "  "))]
    #[case::decode(ApiError::Decode("eof".into()))]
    fn falls_back_to_generic_message(#[case] err: ApiError) {
        assert_eq!(err.user_message(), GENERIC_FAILURE_MESSAGE);
    }

    #[test]
    fn validation_errors_collect_per_field() {
        let mut errors = ValidationErrors::new();
        errors.add("title", "Title is required");
        errors.add("price", "price is required");
        errors.add("title", "Title is too long");

        assert_eq!(errors.field("title").len(), 2);
        assert!(errors.field("email").is_empty());
        assert_eq!(
            errors.to_string(),
            "price: price is required; title: Title is required; title: Title is too long"
        );
        assert!(errors.into_result(()).is_err());
        assert!(ValidationErrors::new().into_result(()).is_ok());
    }
}
