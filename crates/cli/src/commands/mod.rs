//! Subcommand implementations and terminal output.

pub mod account;
pub mod cart;
pub mod catalog;

use qkart_core::Product;
use qkart_storefront::error::AppError;
use qkart_storefront::notify::{Notifications, Severity};
use qkart_storefront::services::CartView;
use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The engine reported a failure (already shown as a notification).
    #[error(transparent)]
    App(#[from] AppError),

    /// Output could not be serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Reading stdin failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Renders results to stdout, as a table or as JSON.
pub struct Output {
    json: bool,
}

impl Output {
    pub const fn new(json: bool) -> Self {
        Self { json }
    }

    /// Print a product list.
    #[allow(clippy::print_stdout)]
    pub fn products(&self, products: &[Product]) -> Result<(), CommandError> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(products)?);
            return Ok(());
        }
        if products.is_empty() {
            println!("No products found");
            return Ok(());
        }
        for p in products {
            println!(
                "{:<18} {:<32} {:<14} {:>10}  {}",
                p.id.as_str(),
                p.name,
                p.category,
                p.cost.to_string(),
                stars(p.rating.stars())
            );
        }
        Ok(())
    }

    /// Print the cart with its total.
    #[allow(clippy::print_stdout)]
    pub fn cart(&self, view: &CartView) -> Result<(), CommandError> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(view)?);
            return Ok(());
        }
        if view.is_empty() {
            println!("Cart is empty");
            return Ok(());
        }
        for item in &view.items {
            println!(
                "{:<18} {:<32} {:>4} x {:>10} = {:>10}",
                item.product.id.as_str(),
                item.product.name,
                item.qty.get(),
                item.product.cost.to_string(),
                item.line_total().to_string()
            );
        }
        println!("{} item(s), total {}", view.item_count, view.total);
        Ok(())
    }
}

fn stars(rating: u8) -> String {
    let filled = usize::from(rating.min(5));
    format!("{}{}", "*".repeat(filled), ".".repeat(5 - filled))
}

/// Print every queued notification to stderr.
#[allow(clippy::print_stderr)]
pub fn print_notifications(notifications: &mut Notifications) {
    for n in notifications.drain() {
        let tag = match n.severity {
            Severity::Success => "ok",
            Severity::Error => "error",
        };
        eprintln!("[{tag}] {}", n.message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stars() {
        assert_eq!(stars(0), ".....");
        assert_eq!(stars(3), "***..");
        assert_eq!(stars(5), "*****");
    }
}
