//! Domain models for the web frontend.

pub mod session;

pub use session::{SessionUser, keys as session_keys};
