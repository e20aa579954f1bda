//! Editable state for the sign-in, sign-up and profile forms.

use marketbook_core::utils::{digits_only, format_phone};
use marketbook_core::validation::{field, FieldErrors};

/// Maximum length for plain text inputs (names, emails)
const MAX_TEXT_LENGTH: usize = 80;

/// Maximum length for password input.
/// 128 chars accommodates password managers and passphrases.
const MAX_PASSWORD_LENGTH: usize = 128;

/// Maximum length for a photo path
const MAX_PATH_LENGTH: usize = 512;

/// Digits in a full mobile number (area code included)
const MAX_PHONE_DIGITS: usize = 11;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Name,
    Phone,
    Email,
    Photo,
    Password,
    PasswordConfirmation,
    NewPassword,
    NewPasswordConfirmation,
}

impl Field {
    pub fn label(&self) -> &'static str {
        match self {
            Field::Name => "Full name",
            Field::Phone => "Phone",
            Field::Email => "Email",
            Field::Photo => "Photo file",
            Field::Password => "Password",
            Field::PasswordConfirmation => "Confirm password",
            Field::NewPassword => "New password",
            Field::NewPasswordConfirmation => "Confirm new password",
        }
    }

    pub fn is_secret(&self) -> bool {
        matches!(
            self,
            Field::Password
                | Field::PasswordConfirmation
                | Field::NewPassword
                | Field::NewPasswordConfirmation
        )
    }

    fn max_len(&self) -> usize {
        match self {
            Field::Photo => MAX_PATH_LENGTH,
            f if f.is_secret() => MAX_PASSWORD_LENGTH,
            _ => MAX_TEXT_LENGTH,
        }
    }

    /// Key of this field in validation errors
    fn error_key(&self) -> Option<&'static str> {
        match self {
            Field::Name => Some(field::NAME),
            Field::Phone => Some(field::PHONE),
            Field::Email => Some(field::EMAIL),
            Field::Photo => None,
            Field::Password => Some(field::PASSWORD),
            Field::PasswordConfirmation => Some(field::PASSWORD_CONFIRMATION),
            Field::NewPassword => Some(field::NEW_PASSWORD),
            Field::NewPasswordConfirmation => Some(field::NEW_PASSWORD_CONFIRMATION),
        }
    }
}

/// Check if a character is valid for input (no control characters)
fn is_valid_input_char(c: char) -> bool {
    !c.is_control()
}

/// A vertical list of inputs followed by a submit button
#[derive(Debug, Clone)]
pub struct FormState {
    fields: Vec<Field>,
    values: Vec<String>,
    /// Index into `fields`; `fields.len()` means the submit button
    focus: usize,
    pub errors: FieldErrors,
}

impl FormState {
    pub fn new(fields: &[Field]) -> Self {
        Self {
            fields: fields.to_vec(),
            values: vec![String::new(); fields.len()],
            focus: 0,
            errors: FieldErrors::default(),
        }
    }

    pub fn sign_in() -> Self {
        Self::new(&[Field::Email, Field::Password])
    }

    pub fn sign_up() -> Self {
        Self::new(&[
            Field::Name,
            Field::Phone,
            Field::Email,
            Field::Photo,
            Field::Password,
            Field::PasswordConfirmation,
        ])
    }

    pub fn profile() -> Self {
        Self::new(&[
            Field::Name,
            Field::Phone,
            Field::Email,
            Field::Photo,
            Field::Password,
            Field::NewPassword,
            Field::NewPasswordConfirmation,
        ])
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    fn index_of(&self, field: Field) -> Option<usize> {
        self.fields.iter().position(|f| *f == field)
    }

    pub fn value(&self, field: Field) -> &str {
        self.index_of(field)
            .map(|i| self.values[i].as_str())
            .unwrap_or("")
    }

    pub fn set(&mut self, field: Field, value: &str) {
        if let Some(i) = self.index_of(field) {
            self.values[i] = match field {
                Field::Phone => format_phone(value),
                _ => value.to_string(),
            };
        }
    }

    pub fn focused(&self) -> Option<Field> {
        self.fields.get(self.focus).copied()
    }

    pub fn is_button_focused(&self) -> bool {
        self.focus == self.fields.len()
    }

    pub fn focus_field(&mut self, field: Field) {
        if let Some(i) = self.index_of(field) {
            self.focus = i;
        }
    }

    /// Move to the next input, wrapping from the button back to the top
    pub fn focus_next(&mut self) {
        self.focus = (self.focus + 1) % (self.fields.len() + 1);
    }

    pub fn focus_prev(&mut self) {
        let slots = self.fields.len() + 1;
        self.focus = (self.focus + slots - 1) % slots;
    }

    /// Type a character into the focused input. Phone numbers only take
    /// digits and are re-masked as they grow.
    pub fn push_char(&mut self, c: char) {
        let Some(field) = self.focused() else {
            return;
        };
        if !is_valid_input_char(c) {
            return;
        }

        let value = &mut self.values[self.focus];
        match field {
            Field::Phone => {
                let mut digits = digits_only(value);
                if c.is_ascii_digit() && digits.len() < MAX_PHONE_DIGITS {
                    digits.push(c);
                    *value = format_phone(&digits);
                }
            }
            _ => {
                if value.chars().count() < field.max_len() {
                    value.push(c);
                }
            }
        }
    }

    pub fn pop_char(&mut self) {
        let Some(field) = self.focused() else {
            return;
        };

        let value = &mut self.values[self.focus];
        match field {
            Field::Phone => {
                let mut digits = digits_only(value);
                digits.pop();
                *value = format_phone(&digits);
            }
            _ => {
                value.pop();
            }
        }
    }

    pub fn error(&self, field: Field) -> Option<&str> {
        field.error_key().and_then(|key| self.errors.get(key))
    }

    /// Move focus to the first input with an error
    pub fn focus_first_error(&mut self) {
        if let Some(i) = self.fields.iter().position(|f| {
            f.error_key()
                .map(|key| self.errors.get(key).is_some())
                .unwrap_or(false)
        }) {
            self.focus = i;
        }
    }

    /// Empty every password input
    pub fn clear_secrets(&mut self) {
        for (field, value) in self.fields.iter().zip(self.values.iter_mut()) {
            if field.is_secret() {
                value.clear();
            }
        }
    }

    pub fn reset(&mut self) {
        for value in &mut self.values {
            value.clear();
        }
        self.focus = 0;
        self.errors = FieldErrors::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_focus_cycles_through_button() {
        let mut form = FormState::sign_in();
        assert_eq!(form.focused(), Some(Field::Email));
        form.focus_next();
        assert_eq!(form.focused(), Some(Field::Password));
        form.focus_next();
        assert!(form.is_button_focused());
        form.focus_next();
        assert_eq!(form.focused(), Some(Field::Email));
        form.focus_prev();
        assert!(form.is_button_focused());
    }

    #[test]
    fn test_phone_is_masked_while_typing() {
        let mut form = FormState::sign_up();
        form.focus_field(Field::Phone);
        for c in "11a98765-43210".chars() {
            form.push_char(c);
        }
        assert_eq!(form.value(Field::Phone), "(11) 98765-4321");

        form.pop_char();
        assert_eq!(form.value(Field::Phone), "(11) 9876-5432");
    }

    #[test]
    fn test_control_chars_and_length_limits() {
        let mut form = FormState::sign_in();
        form.push_char('\n');
        form.push_char('\x00');
        assert_eq!(form.value(Field::Email), "");

        for _ in 0..MAX_TEXT_LENGTH + 5 {
            form.push_char('a');
        }
        assert_eq!(form.value(Field::Email).len(), MAX_TEXT_LENGTH);

        form.focus_next();
        for _ in 0..MAX_PASSWORD_LENGTH + 1 {
            form.push_char('x');
        }
        assert_eq!(form.value(Field::Password).len(), MAX_PASSWORD_LENGTH);
    }

    #[test]
    fn test_typing_on_button_is_ignored() {
        let mut form = FormState::sign_in();
        form.focus_prev();
        form.push_char('a');
        form.pop_char();
        assert_eq!(form.value(Field::Email), "");
        assert_eq!(form.value(Field::Password), "");
    }

    #[test]
    fn test_errors_map_to_fields() {
        let mut form = FormState::profile();
        form.errors.add(field::NEW_PASSWORD, "New password must be at least 3 characters");
        assert_eq!(
            form.error(Field::NewPassword),
            Some("New password must be at least 3 characters")
        );
        assert!(form.error(Field::Photo).is_none());

        form.focus_first_error();
        assert_eq!(form.focused(), Some(Field::NewPassword));
    }

    #[test]
    fn test_clear_secrets_keeps_other_values() {
        let mut form = FormState::profile();
        form.set(Field::Name, "Ana");
        form.set(Field::Password, "old");
        form.set(Field::NewPassword, "new");
        form.clear_secrets();
        assert_eq!(form.value(Field::Name), "Ana");
        assert_eq!(form.value(Field::Password), "");
        assert_eq!(form.value(Field::NewPassword), "");
    }

    #[test]
    fn test_unknown_field_is_empty() {
        let mut form = FormState::sign_in();
        form.set(Field::Name, "ignored");
        assert_eq!(form.value(Field::Name), "");
    }
}
