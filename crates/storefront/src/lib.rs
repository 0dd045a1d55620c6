//! QKart storefront engine.
//!
//! Keeps a locally rendered cart consistent with the authoritative remote
//! cart while the user browses and searches the catalog. Front-ends drive a
//! [`Storefront`] and render from its read accessors and the
//! [`Notifications`](notify::Notifications) stream.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod catalog;
pub mod config;
pub mod error;
pub mod notify;
pub mod remote;
pub mod services;
pub mod state;
pub mod telemetry;
#[cfg(any(test, feature = "test-util"))]
pub mod testing;

mod storefront;

pub use storefront::{Services, Storefront};
