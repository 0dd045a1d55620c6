//! Account commands.

use qkart_core::RegistrationForm;
use qkart_storefront::Storefront;
use qkart_storefront::error::AppError;

use super::CommandError;

/// Register a new account.
pub async fn register(
    storefront: &Storefront,
    username: String,
    password: String,
    confirm_password: String,
) -> Result<(), CommandError> {
    let form = RegistrationForm {
        username,
        password,
        confirm_password,
    };
    let username = storefront
        .register(&form)
        .await
        .map_err(AppError::from)?;
    tracing::info!(%username, "Registered");
    Ok(())
}
