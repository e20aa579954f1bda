//! Form validation with per-field messages.
//!
//! Every form is validated before any network call. Each field reports at
//! most one message, the first rule it fails.

use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

use crate::utils::digits_only;

/// Minimum length for names and new passwords
const MIN_NAME_LENGTH: usize = 3;
const MIN_PASSWORD_LENGTH: usize = 3;

static EMAIL_PATTERN: OnceLock<Regex> = OnceLock::new();

fn email_pattern() -> &'static Regex {
    EMAIL_PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9._%+'-]+@[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?)*\.[A-Za-z]{2,}$")
            .expect("email pattern is a valid regex")
    })
}

pub fn is_valid_email(email: &str) -> bool {
    !email.contains("..") && !email.starts_with('.') && email_pattern().is_match(email)
}

/// Phone numbers must have 10 or 11 digits once punctuation is removed
pub fn is_valid_phone(phone: &str) -> bool {
    matches!(digits_only(phone).len(), 10 | 11)
}

/// Field names used as keys in `FieldErrors`
pub mod field {
    pub const NAME: &str = "name";
    pub const PHONE: &str = "phone";
    pub const EMAIL: &str = "email";
    pub const PASSWORD: &str = "password";
    pub const PASSWORD_CONFIRMATION: &str = "passwordConfirmation";
    pub const NEW_PASSWORD: &str = "newPassword";
    pub const NEW_PASSWORD_CONFIRMATION: &str = "newPasswordConfirmation";
}

/// Messages keyed by field, in the order they were found
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    errors: Vec<(&'static str, String)>,
}

impl FieldErrors {
    /// Record a message unless the field already has one
    pub fn add(&mut self, field: &'static str, message: &str) {
        if self.get(field).is_none() {
            self.errors.push((field, message.to_string()));
        }
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, m)| m.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.errors.iter().map(|(f, m)| (*f, m.as_str()))
    }

    fn into_result(self) -> Result<(), ValidationError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(ValidationError(self))
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid form: {}", summary(.0))]
pub struct ValidationError(pub FieldErrors);

fn summary(errors: &FieldErrors) -> String {
    errors
        .iter()
        .map(|(field, message)| format!("{}: {}", field, message))
        .collect::<Vec<_>>()
        .join("; ")
}

fn check_name(errors: &mut FieldErrors, name: &str) {
    if name.chars().count() < MIN_NAME_LENGTH {
        errors.add(field::NAME, "Please enter your full name");
    }
}

fn check_phone(errors: &mut FieldErrors, phone: &str) {
    if phone.is_empty() {
        errors.add(field::PHONE, "Please enter your phone number");
    } else if !is_valid_phone(phone) {
        errors.add(field::PHONE, "Invalid phone number");
    }
}

fn check_email(errors: &mut FieldErrors, email: &str) {
    if email.is_empty() {
        errors.add(field::EMAIL, "Please enter your email");
    } else if !is_valid_email(email) {
        errors.add(field::EMAIL, "Invalid email");
    }
}

/// Treat an empty optional input as absent
fn present(value: &str) -> Option<&str> {
    (!value.is_empty()).then_some(value)
}

#[derive(Debug, Clone, Default)]
pub struct SignInForm {
    pub email: String,
    pub password: String,
}

impl SignInForm {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut errors = FieldErrors::default();
        check_email(&mut errors, &self.email);
        if self.password.is_empty() {
            errors.add(field::PASSWORD, "Please enter your password");
        }
        errors.into_result()
    }
}

#[derive(Debug, Clone, Default)]
pub struct SignUpForm {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub password: String,
    pub password_confirmation: String,
}

impl SignUpForm {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut errors = FieldErrors::default();
        check_name(&mut errors, &self.name);
        check_phone(&mut errors, &self.phone);
        check_email(&mut errors, &self.email);

        if self.password.chars().count() < MIN_PASSWORD_LENGTH {
            errors.add(field::PASSWORD, "Password must be at least 3 characters");
        }

        if self.password_confirmation.is_empty() {
            errors.add(field::PASSWORD_CONFIRMATION, "Please confirm your password");
        } else if self.password != self.password_confirmation {
            errors.add(field::PASSWORD_CONFIRMATION, "Passwords do not match");
        }

        errors.into_result()
    }
}

/// Profile edit form. The three password fields are optional; leaving them
/// empty keeps the current password.
#[derive(Debug, Clone, Default)]
pub struct ProfileForm {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub password: String,
    pub new_password: String,
    pub new_password_confirmation: String,
}

impl ProfileForm {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut errors = FieldErrors::default();
        check_name(&mut errors, &self.name);
        check_phone(&mut errors, &self.phone);
        check_email(&mut errors, &self.email);

        let password = present(&self.password);
        let confirmation = present(&self.new_password_confirmation);

        if let Some(new_password) = present(&self.new_password) {
            if password.is_none() {
                errors.add(field::PASSWORD, "Please enter your current password");
            }
            if new_password.chars().count() < MIN_PASSWORD_LENGTH {
                errors.add(field::NEW_PASSWORD, "New password must be at least 3 characters");
            }
            if Some(new_password) == password {
                errors.add(
                    field::NEW_PASSWORD,
                    "New password must be different from current password",
                );
            }
            match confirmation {
                None => errors.add(field::NEW_PASSWORD_CONFIRMATION, "Please confirm your new password"),
                Some(c) if c != new_password => errors.add(
                    field::NEW_PASSWORD_CONFIRMATION,
                    "New password confirmation does not match",
                ),
                Some(_) => {}
            }
        }

        errors.into_result()
    }

    /// Current and new password, when the seller is changing it
    pub fn password_change(&self) -> Option<(String, String)> {
        match (present(&self.password), present(&self.new_password)) {
            (Some(current), Some(new)) => Some((current.to_string(), new.to_string())),
            _ => None,
        }
    }
}
