//! Seller account model.

use serde::{Deserialize, Serialize};

use super::ids::{AttachmentId, SellerId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Avatar {
    pub id: AttachmentId,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seller {
    pub id: SellerId,
    pub name: String,
    pub phone: String,
    pub email: String,
    #[serde(default)]
    pub avatar: Option<Avatar>,
}

/// Body of `POST /sellers`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSeller {
    pub name: String,
    pub phone: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_id: Option<AttachmentId>,
    pub password: String,
    pub password_confirmation: String,
}

/// Body of `POST /sellers/sessions`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

// パスワードをログに出さない
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SellerResponse {
    pub seller: Seller,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_seller_omits_missing_avatar() {
        let body = NewSeller {
            name: "Ana".into(),
            phone: "11999990000".into(),
            email: "ana@example.com".into(),
            avatar_id: None,
            password: "secret".into(),
            password_confirmation: "secret".into(),
        };
        let v = serde_json::to_value(&body).unwrap();
        assert!(v.get("avatarId").is_none());
        assert_eq!(v["passwordConfirmation"], "secret");
    }

    #[test]
    fn credentials_debug_hides_password() {
        let creds = Credentials {
            email: "ana@example.com".into(),
            password: "hunter2".into(),
        };
        let printed = format!("{creds:?}");
        assert!(!printed.contains("hunter2"));
    }
}
