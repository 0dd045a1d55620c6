//! QKart Core - Shared types library.
//!
//! This crate provides the domain types used across all QKart components:
//! - `storefront` - Client-side cart reconciliation and catalog search engine
//! - `cli` - Terminal front-end driving the storefront engine
//!
//! # Architecture
//!
//! The core crate contains only types and validation - no I/O, no HTTP
//! clients, no async runtime. This keeps it lightweight and allows it to be
//! used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Products, cart entries, quantities, prices, credentials and
//!   account registration input

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
