//! Shop CRM Core - Shared types library.
//!
//! This crate provides common types used across the Shop CRM components:
//! - `console` - The web console server (session, guards, backend client)
//! - `integration-tests` - End-to-end tests against a fake backend
//!
//! # Architecture
//!
//! The core crate contains only types and the rules attached to them - no I/O,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, roles, statuses, prices and phone numbers

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
