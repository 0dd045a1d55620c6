//! Account registration.

use std::sync::Arc;

use qkart_core::{RegistrationForm, Username};
use tracing::{info, instrument};

use crate::error::AccountError;
use crate::remote::{AccountService, ServiceError};

/// Validates registration forms and submits them to the backend.
pub struct AccountFlow {
    service: Arc<dyn AccountService>,
}

impl AccountFlow {
    #[must_use]
    pub fn new(service: Arc<dyn AccountService>) -> Self {
        Self { service }
    }

    /// Register a new account.
    ///
    /// The form is validated locally first; an invalid form never reaches
    /// the backend.
    ///
    /// # Errors
    ///
    /// - `AccountError::Invalid` if the form fails validation
    /// - `AccountError::Rejected` if the backend refuses the request with a
    ///   client error (e.g. the username is taken)
    /// - `AccountError::TransientFailure` for anything else
    #[instrument(skip_all, fields(username = %form.username))]
    pub async fn register(&self, form: &RegistrationForm) -> Result<Username, AccountError> {
        let (username, password) = form.validate()?;

        match self.service.register(&username, &password).await {
            Ok(()) => {
                info!("Account registered");
                Ok(username)
            }
            Err(ServiceError::Api { status, message }) if (400..500).contains(&status) => {
                Err(AccountError::Rejected(message))
            }
            Err(e) => Err(AccountError::TransientFailure(e)),
        }
    }
}
