//! Domain models for the console.
//!
//! Backend records live in [`crate::backend::types`]; this module holds what
//! the console itself keeps between requests.

pub mod session;

pub use session::{CurrentUser, keys as session_keys};
