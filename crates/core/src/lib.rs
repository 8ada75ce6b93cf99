//! MediStore Core - Shared domain types.
//!
//! This crate provides the types shared by the MediStore web frontend and its
//! integration tests:
//! - [`types`] - Newtype IDs, prices, emails, roles and statuses
//! - [`api`] - The `{success, data, error}` envelope every backend response uses
//! - [`cart`] - The shopping cart model with its quantity clamping rules
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no HTTP
//! clients, no storage. Persistence of the cart lives in the web crate.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cart;
pub mod types;

pub use api::{ApiResponse, EnvelopeError};
pub use cart::{Cart, CartItem, ProductSummary};
pub use types::*;
