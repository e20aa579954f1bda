use serde::{Deserialize, Serialize};

use crate::utils::format::format_phone;

/// An uploaded media file (product photo or seller avatar)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub id: String,
    pub url: String,
}

/// The authenticated merchant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seller {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub email: String,
    #[serde(default)]
    pub avatar: Option<Attachment>,
}

impl Seller {
    /// Greeting shown on the products screen
    pub fn greeting(&self) -> String {
        format!("Hello, {}!", self.name)
    }

    pub fn phone_display(&self) -> String {
        format_phone(&self.phone)
    }

    pub fn avatar_url(&self) -> Option<&str> {
        self.avatar.as_ref().map(|a| a.url.as_str())
    }
}

/// Body for `POST /sellers`
#[derive(Debug, Clone, Serialize)]
pub struct NewSeller {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub password: String,
    #[serde(rename = "passwordConfirmation")]
    pub password_confirmation: String,
    #[serde(rename = "avatarId")]
    pub avatar_id: Option<String>,
}

/// Body for `PUT /sellers`.
/// Password fields are only sent when the seller is changing their password,
/// and `avatarId` only when a new photo was uploaded.
#[derive(Debug, Clone, Serialize)]
pub struct SellerUpdate {
    pub name: String,
    pub phone: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(rename = "newPassword", skip_serializing_if = "Option::is_none")]
    pub new_password: Option<String>,
    #[serde(rename = "avatarId", skip_serializing_if = "Option::is_none")]
    pub avatar_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_seller_with_avatar() {
        let json = r#"{"id":"s-1","name":"Ana Souza","phone":"11987654321","email":"ana@example.com","avatar":{"id":"a-1","url":"http://localhost:3333/attachments/a-1.png"}}"#;
        let seller: Seller = serde_json::from_str(json).expect("Failed to parse seller JSON");

        assert_eq!(seller.name, "Ana Souza");
        assert_eq!(seller.avatar_url(), Some("http://localhost:3333/attachments/a-1.png"));
        assert_eq!(seller.phone_display(), "(11) 98765-4321");
        assert_eq!(seller.greeting(), "Hello, Ana Souza!");
    }

    #[test]
    fn test_parse_seller_without_avatar() {
        let json = r#"{"id":"s-2","name":"Bruno","phone":"1133334444","email":"bruno@example.com","avatar":null}"#;
        let seller: Seller = serde_json::from_str(json).expect("Failed to parse seller JSON");
        assert!(seller.avatar.is_none());

        let json = r#"{"id":"s-2","name":"Bruno","phone":"1133334444","email":"bruno@example.com"}"#;
        let seller: Seller = serde_json::from_str(json).expect("Failed to parse seller JSON");
        assert!(seller.avatar_url().is_none());
    }

    #[test]
    fn test_seller_update_skips_absent_fields() {
        let update = SellerUpdate {
            name: "Ana".to_string(),
            phone: "(11) 98765-4321".to_string(),
            email: "ana@example.com".to_string(),
            password: None,
            new_password: None,
            avatar_id: None,
        };
        let value = serde_json::to_value(&update).expect("Failed to serialize update");
        assert_eq!(
            value,
            serde_json::json!({"name": "Ana", "phone": "(11) 98765-4321", "email": "ana@example.com"})
        );
    }

    #[test]
    fn test_new_seller_uses_camel_case() {
        let body = NewSeller {
            name: "Ana".to_string(),
            phone: "(11) 98765-4321".to_string(),
            email: "ana@example.com".to_string(),
            password: "123".to_string(),
            password_confirmation: "123".to_string(),
            avatar_id: None,
        };
        let value = serde_json::to_value(&body).expect("Failed to serialize new seller");
        assert_eq!(value["passwordConfirmation"], "123");
        assert!(value["avatarId"].is_null());
    }
}
