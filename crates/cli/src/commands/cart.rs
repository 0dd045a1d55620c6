//! Cart commands. All of them need `QKART_TOKEN`.

use qkart_core::{ProductId, Quantity};
use qkart_storefront::Storefront;
use qkart_storefront::error::AppError;

use super::{CommandError, Output};

/// Show the cart.
pub async fn show(storefront: &Storefront, out: &Output) -> Result<(), CommandError> {
    storefront.load().await?;
    out.cart(&storefront.cart_view())
}

/// Add one unit of `product_id`, refusing duplicates.
pub async fn add(
    storefront: &Storefront,
    out: &Output,
    product_id: &ProductId,
) -> Result<(), CommandError> {
    storefront.load().await?;
    let view = storefront
        .add_to_cart(product_id)
        .await
        .map_err(AppError::from)?;
    out.cart(&view)
}

/// Set the quantity of `product_id`.
pub async fn set_qty(
    storefront: &Storefront,
    out: &Output,
    product_id: &ProductId,
    qty: Quantity,
) -> Result<(), CommandError> {
    storefront.load().await?;
    let view = storefront
        .set_quantity(product_id, qty)
        .await
        .map_err(AppError::from)?;
    out.cart(&view)
}
