//! JSON API routes.
//!
//! The only API surface the frontend owns is the auth proxy; everything
//! else is called server-side by the page handlers.

pub mod proxy;
