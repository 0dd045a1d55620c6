//! Account registration input and its validation rules.

use core::fmt;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

/// Minimum length of both usernames and passwords.
pub const MIN_FIELD_LENGTH: usize = 6;

/// Validation failures for a [`RegistrationForm`].
///
/// Only the first failing rule is reported, in the order the variants are
/// declared. The messages are shown to the user verbatim.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationError {
    #[error("Username is a required field")]
    UsernameRequired,
    #[error("Username must be at least 6 characters")]
    UsernameTooShort,
    #[error("Password is a required field")]
    PasswordRequired,
    #[error("Password must be at least 6 characters")]
    PasswordTooShort,
    #[error("Passwords do not match")]
    PasswordMismatch,
}

/// A validated username.
///
/// ## Constraints
///
/// - Must not be empty
/// - Must be at least 6 characters long
///
/// ## Examples
///
/// ```
/// use qkart_core::Username;
///
/// assert!(Username::parse("crio.do").is_ok());
/// assert!(Username::parse("").is_err());
/// assert!(Username::parse("crio").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Username(String);

impl Username {
    /// Parse a `Username` from a string.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationError::UsernameRequired`] if the input is empty
    /// and [`RegistrationError::UsernameTooShort`] if it is shorter than
    /// six characters.
    pub fn parse(s: &str) -> Result<Self, RegistrationError> {
        if s.is_empty() {
            return Err(RegistrationError::UsernameRequired);
        }
        if s.chars().count() < MIN_FIELD_LENGTH {
            return Err(RegistrationError::UsernameTooShort);
        }
        Ok(Self(s.to_owned()))
    }

    /// Returns the username as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A validated password. Redacted in `Debug` output.
#[derive(Clone)]
pub struct Password(SecretString);

impl Password {
    /// Parse a `Password` from a string.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationError::PasswordRequired`] if the input is empty
    /// and [`RegistrationError::PasswordTooShort`] if it is shorter than
    /// six characters.
    pub fn parse(s: &str) -> Result<Self, RegistrationError> {
        if s.is_empty() {
            return Err(RegistrationError::PasswordRequired);
        }
        if s.chars().count() < MIN_FIELD_LENGTH {
            return Err(RegistrationError::PasswordTooShort);
        }
        Ok(Self(SecretString::from(s.to_owned())))
    }

    /// Expose the raw password for the registration request body.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Password").field(&"[REDACTED]").finish()
    }
}

/// Raw registration form input, exactly as typed by the user.
#[derive(Clone, Default)]
pub struct RegistrationForm {
    pub username: String,
    pub password: String,
    pub confirm_password: String,
}

impl RegistrationForm {
    /// Validate the form.
    ///
    /// # Errors
    ///
    /// Returns the first failing [`RegistrationError`].
    pub fn validate(&self) -> Result<(Username, Password), RegistrationError> {
        let username = Username::parse(&self.username)?;
        let password = Password::parse(&self.password)?;
        if self.confirm_password != self.password {
            return Err(RegistrationError::PasswordMismatch);
        }
        Ok((username, password))
    }
}

impl fmt::Debug for RegistrationForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistrationForm")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("confirm_password", &"[REDACTED]")
            .finish()
    }
}
