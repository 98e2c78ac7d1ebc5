//! Secret Santa Paws Core - Shared types library.
//!
//! This crate provides the types shared by every Secret Santa Paws component:
//! - `web` - The server-rendered gift exchange site
//! - `cli` - Command-line tools for migrations and exchange management
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access, no HTTP.
//! Database encoding is available behind the `postgres` feature.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, email addresses and US state codes

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
