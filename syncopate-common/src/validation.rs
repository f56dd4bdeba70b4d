//! Client-side form validation
//!
//! Each form is checked before anything is sent. Failures are reported per
//! field so a front-end can show them inline next to the offending input.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use std::fmt;

static TOTP_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{6}$").expect("static regex"));

static EMAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("static regex"));

/// Field name to first failing message
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    fields: BTreeMap<&'static str, String>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure; the first message for a field is kept
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.fields.entry(field).or_insert_with(|| message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.fields.iter().map(|(k, v)| (*k, v.as_str()))
    }

    /// `Ok(())` when nothing failed
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .fields
            .iter()
            .map(|(field, msg)| format!("{}: {}", field, msg))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

impl From<ValidationErrors> for crate::Error {
    fn from(errors: ValidationErrors) -> Self {
        crate::Error::Validation(errors)
    }
}

fn check_min_len(
    errors: &mut ValidationErrors,
    field: &'static str,
    value: &str,
    min: usize,
    required_msg: &str,
    short_msg: &str,
) {
    if value.is_empty() {
        errors.add(field, required_msg);
    } else if value.chars().count() < min {
        errors.add(field, short_msg);
    }
}

/// Login form values
#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    pub totp_code: String,
}

impl LoginForm {
    /// `requires_totp` is set once the server has challenged for a code
    pub fn validate(&self, requires_totp: bool) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        check_min_len(&mut errors, "username", &self.username, 5, "Username is required", "Username too short");
        check_min_len(
            &mut errors,
            "password",
            &self.password,
            6,
            "Password is required",
            "Password must be at least 6 characters",
        );
        if requires_totp {
            if self.totp_code.is_empty() {
                errors.add("totp_code", "TOTP code required");
            } else if !TOTP_CODE.is_match(&self.totp_code) {
                errors.add("totp_code", "Must be exactly 6 digits");
            }
        }
        errors.into_result()
    }
}

/// Registration form values
#[derive(Debug, Clone, Default)]
pub struct RegisterForm {
    pub username: String,
    pub password: String,
    pub confirm_password: String,
}

impl RegisterForm {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        check_min_len(&mut errors, "username", &self.username, 2, "Username is required", "Username too short");
        check_min_len(
            &mut errors,
            "password",
            &self.password,
            6,
            "Password is required",
            "Password must be at least 6 characters",
        );
        if self.confirm_password.is_empty() {
            errors.add("confirm_password", "Please confirm your password");
        } else if self.confirm_password != self.password {
            errors.add("confirm_password", "Passwords must match");
        }
        errors.into_result()
    }
}

pub fn validate_totp_code(code: &str) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    if code.is_empty() {
        errors.add("code", "Code is required");
    } else if !TOTP_CODE.is_match(code) {
        errors.add("code", "Must be exactly 6 digits");
    }
    errors.into_result()
}

pub fn validate_email(email: &str) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    let email = email.trim();
    if email.is_empty() {
        errors.add("email", "Email is required");
    } else if !EMAIL.is_match(email) {
        errors.add("email", "Invalid email address");
    }
    errors.into_result()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn login(username: &str, password: &str, totp: &str) -> LoginForm {
        LoginForm {
            username: username.into(),
            password: password.into(),
            totp_code: totp.into(),
        }
    }

    #[test]
    fn test_login_requires_fields() {
        let errors = login("", "", "").validate(false).unwrap_err();
        assert_eq!(errors.get("username"), Some("Username is required"));
        assert_eq!(errors.get("password"), Some("Password is required"));
        assert!(errors.get("totp_code").is_none());
    }

    #[test]
    fn test_login_length_rules() {
        let errors = login("abcd", "12345", "").validate(false).unwrap_err();
        assert_eq!(errors.get("username"), Some("Username too short"));
        assert_eq!(errors.get("password"), Some("Password must be at least 6 characters"));
        assert!(login("abcde", "123456", "").validate(false).is_ok());
    }

    #[test]
    fn test_login_totp_only_checked_when_challenged() {
        let form = login("alice1", "secret1", "12ab56");
        assert!(form.validate(false).is_ok());
        let errors = form.validate(true).unwrap_err();
        assert_eq!(errors.get("totp_code"), Some("Must be exactly 6 digits"));

        let errors = login("alice1", "secret1", "").validate(true).unwrap_err();
        assert_eq!(errors.get("totp_code"), Some("TOTP code required"));

        assert!(login("alice1", "secret1", "123456").validate(true).is_ok());
    }

    #[test]
    fn test_register_rules() {
        let form = RegisterForm {
            username: "b".into(),
            password: "secret1".into(),
            confirm_password: "secret2".into(),
        };
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.get("username"), Some("Username too short"));
        assert_eq!(errors.get("confirm_password"), Some("Passwords must match"));
        assert_eq!(errors.len(), 2);

        let ok = RegisterForm {
            username: "bo".into(),
            password: "secret1".into(),
            confirm_password: "secret1".into(),
        };
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn test_totp_code() {
        assert!(validate_totp_code("004211").is_ok());
        assert!(validate_totp_code("42").is_err());
        assert!(validate_totp_code("1234567").is_err());
        assert_eq!(validate_totp_code("").unwrap_err().get("code"), Some("Code is required"));
    }

    #[test]
    fn test_email() {
        assert!(validate_email("fan@uwaterloo.ca").is_ok());
        assert!(validate_email("not-an-email").is_err());
        assert!(validate_email("  ").is_err());
    }

    #[test]
    fn test_display_joins_fields() {
        let errors = login("", "123456", "").validate(false).unwrap_err();
        assert_eq!(errors.to_string(), "username: Username is required");
    }
}
