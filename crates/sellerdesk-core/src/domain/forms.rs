//! Forms - 送信前のクライアント側バリデーション
//!
//! 各フォームは `validate()` でワイヤ用の型（`Credentials`, `NewSeller`,
//! `ValidatedProduct`）に変換されます。失敗した場合は `ValidationErrors` を返し、
//! ネットワーク呼び出しもキャッシュ操作も行いません。

use std::sync::LazyLock;

use regex::Regex;

use super::errors::ValidationErrors;
use super::ids::CategoryId;
use super::product::{PriceInCents, Upload};
use super::seller::{Credentials, NewSeller};

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
});

fn is_email(value: &str) -> bool {
    EMAIL.is_match(value)
}

fn require(errors: &mut ValidationErrors, field: &'static str, value: &str, message: &str) {
    if value.trim().is_empty() {
        errors.add(field, message);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignInForm {
    pub email: String,
    pub password: String,
}

impl SignInForm {
    pub fn validate(&self) -> Result<Credentials, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if !is_email(self.email.trim()) {
            errors.add("email", "Invalid e-mail");
        }
        require(&mut errors, "password", &self.password, "Password is required");
        errors.into_result(Credentials {
            email: self.email.trim().to_string(),
            password: self.password.clone(),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationForm {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub password: String,
    pub password_confirmation: String,
    /// Optional profile picture, uploaded before registering.
    pub avatar: Vec<Upload>,
}

impl RegistrationForm {
    /// On success the avatar (if any) still has to be uploaded and its id set
    /// on the returned body.
    pub fn validate(&self) -> Result<NewSeller, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        require(&mut errors, "name", &self.name, "Name is required");
        require(&mut errors, "phone", &self.phone, "Phone is required");
        if !is_email(self.email.trim()) {
            errors.add("email", "Invalid e-mail");
        }
        require(&mut errors, "password", &self.password, "Password is required");
        require(
            &mut errors,
            "passwordConfirmation",
            &self.password_confirmation,
            "Password confirmation is required",
        );
        if !self.password_confirmation.is_empty() && self.password != self.password_confirmation {
            errors.add("passwordConfirmation", "Passwords do not match");
        }
        if self.avatar.len() > 1 {
            errors.add("avatar", "Select only one image");
        }

        errors.into_result(NewSeller {
            name: self.name.trim().to_string(),
            phone: self.phone.trim().to_string(),
            email: self.email.trim().to_string(),
            avatar_id: None,
            password: self.password.clone(),
            password_confirmation: self.password_confirmation.clone(),
        })
    }
}

/// Product create/edit form as typed by the seller. `price` is in major units.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductForm {
    pub title: String,
    pub category_id: String,
    pub description: String,
    pub price: String,
    /// New images. When empty on edit, the product keeps its attachments.
    pub attachments: Vec<Upload>,
}

/// A product form that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedProduct {
    pub title: String,
    pub category_id: CategoryId,
    pub description: String,
    pub price_in_cents: PriceInCents,
    pub attachments: Vec<Upload>,
}

impl ProductForm {
    /// 編集用。画像が空なら既存の添付をそのまま使う
    pub fn validate(&self) -> Result<ValidatedProduct, ValidationErrors> {
        self.check(ValidationErrors::new())
    }

    /// 新規作成用。画像を 1 枚以上必要とする
    pub fn validate_new(&self) -> Result<ValidatedProduct, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.attachments.is_empty() {
            errors.add("attachments", "Image is required");
        }
        self.check(errors)
    }

    fn check(&self, mut errors: ValidationErrors) -> Result<ValidatedProduct, ValidationErrors> {
        require(&mut errors, "title", &self.title, "Title is required");
        require(&mut errors, "categoryId", &self.category_id, "Category is required");
        require(&mut errors, "description", &self.description, "Description is required");
        let price = PriceInCents::parse_major(&self.price);
        if let Err(err) = &price {
            errors.add("price", err.to_string());
        }

        match price {
            Ok(price_in_cents) if errors.is_empty() => Ok(ValidatedProduct {
                title: self.title.trim().to_string(),
                category_id: CategoryId::new(self.category_id.trim()),
                description: self.description.trim().to_string(),
                price_in_cents,
                attachments: self.attachments.clone(),
            }),
            _ => Err(errors),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn registration() -> RegistrationForm {
        RegistrationForm {
            name: "Ana".into(),
            phone: "11999990000".into(),
            email: "ana@example.com".into(),
            password: "secret".into(),
            password_confirmation: "secret".into(),
            avatar: vec![],
        }
    }

    #[rstest]
    #[case::plain("ana@example.com", true)]
    #[case::subdomain("a.b@mail.example.org", true)]
    #[case::missing_at("ana.example.com", false)]
    #[case::missing_tld("ana@example", false)]
    #[case::spaces("ana @example.com", false)]
    fn email_format(#[case] email: &str, #[case] valid: bool) {
        assert_eq!(is_email(email), valid);
    }

    #[test]
    fn sign_in_requires_password() {
        let form = SignInForm {
            email: "ana@example.com".into(),
            password: "".into(),
        };
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.field("password"), ["Password is required"]);
    }

    #[test]
    fn registration_passes_and_trims() {
        let mut form = registration();
        form.email = "  ana@example.com ".into();
        let body = form.validate().unwrap();
        assert_eq!(body.email, "ana@example.com");
        assert_eq!(body.avatar_id, None);
    }

    #[test]
    fn registration_rejects_mismatched_passwords() {
        let mut form = registration();
        form.password_confirmation = "other".into();
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.field("passwordConfirmation"), ["Passwords do not match"]);
    }

    #[test]
    fn registration_allows_at_most_one_avatar() {
        let mut form = registration();
        form.avatar = vec![
            Upload::from_path_name("a.png", vec![1]),
            Upload::from_path_name("b.png", vec![2]),
        ];
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.field("avatar"), ["Select only one image"]);
    }

    #[test]
    fn product_form_converts_price_to_cents() {
        let form = ProductForm {
            title: "Sofa".into(),
            category_id: "c1".into(),
            description: "Blue".into(),
            price: "1200,50".into(),
            attachments: vec![],
        };
        let product = form.validate().unwrap();
        assert_eq!(product.price_in_cents, PriceInCents::new(120050));
        assert_eq!(product.category_id, CategoryId::new("c1"));
    }

    fn sofa() -> ProductForm {
        ProductForm {
            title: "Sofa".into(),
            category_id: "c1".into(),
            description: "Blue".into(),
            price: "10".into(),
            attachments: vec![],
        }
    }

    #[test]
    fn new_product_requires_an_image() {
        let errors = sofa().validate_new().unwrap_err();
        assert_eq!(errors.field("attachments"), ["Image is required"]);
        assert_eq!(errors.fields().count(), 1);
    }

    #[test]
    fn new_product_with_an_image_passes() {
        let mut form = sofa();
        form.attachments = vec![Upload::from_path_name("sofa.png", vec![1])];
        let product = form.validate_new().unwrap();
        assert_eq!(product.attachments.len(), 1);
        assert_eq!(product.price_in_cents, PriceInCents::new(1000));
    }

    #[test]
    fn edit_keeps_allowing_no_new_images() {
        assert!(sofa().validate().is_ok());
    }

    #[test]
    fn new_product_reports_image_with_other_fields() {
        let errors = ProductForm::default().validate_new().unwrap_err();
        for field in ["attachments", "title", "categoryId", "description", "price"] {
            assert!(!errors.field(field).is_empty(), "missing error for {field}");
        }
    }

    #[test]
    fn product_form_reports_every_missing_field() {
        let errors = ProductForm::default().validate().unwrap_err();
        for field in ["title", "categoryId", "description", "price"] {
            assert!(!errors.field(field).is_empty(), "missing error for {field}");
        }
    }
}
