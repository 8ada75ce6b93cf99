//! Services used by the route handlers.
//!
//! - `auth` - Sign-in, sign-up and session lookup against the auth service
//! - `cart` - Request-scoped cart store persisted in the session
//! - `cookies` - `Set-Cookie` rewriting and request cookie inspection

pub mod auth;
pub mod cart;
pub mod cookies;
