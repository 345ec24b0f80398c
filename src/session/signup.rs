//! Validation of the signup form.
//!
//! All checks run before any salt is generated or key derived, so a bad form
//! costs nothing.  The email is only checked; it is never stored.

use std::fmt;

use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use crate::errors::{Result, VaultError};

/// What the user typed into the signup form.
pub struct SignupForm {
    pub email: String,
    pub password: Zeroizing<String>,
    pub confirm: Zeroizing<String>,
}

impl SignupForm {
    pub fn new(
        email: impl Into<String>,
        password: impl Into<String>,
        confirm: impl Into<String>,
    ) -> Self {
        Self {
            email: email.into(),
            password: Zeroizing::new(password.into()),
            confirm: Zeroizing::new(confirm.into()),
        }
    }

    /// Check the form against the minimum password length.
    pub fn validate(&self, min_password_len: usize) -> Result<()> {
        let email = self.email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(VaultError::InvalidInput(
                "a valid email is required for security alerts".into(),
            ));
        }

        validate_master_password(&self.password, min_password_len)?;

        let matches: bool = self
            .password
            .as_bytes()
            .ct_eq(self.confirm.as_bytes())
            .into();
        if !matches {
            return Err(VaultError::InvalidInput("passwords do not match".into()));
        }

        Ok(())
    }
}

impl fmt::Debug for SignupForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignupForm")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("confirm", &"<redacted>")
            .finish()
    }
}

/// Enforce the minimum master password length, counted in characters.
pub fn validate_master_password(password: &str, min_len: usize) -> Result<()> {
    if password.chars().count() < min_len {
        return Err(VaultError::InvalidInput(format!(
            "master password must be at least {min_len} characters"
        )));
    }
    Ok(())
}
