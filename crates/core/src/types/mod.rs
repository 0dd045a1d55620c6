//! Core types for QKart.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod account;
pub mod cart;
pub mod credential;
pub mod id;
pub mod price;
pub mod product;

pub use account::{Password, RegistrationError, RegistrationForm, Username};
pub use cart::{CartEntry, Quantity, QuantityError};
pub use credential::Credential;
pub use id::ProductId;
pub use price::Price;
pub use product::{Product, Rating, RatingError};
