//! Core types for Secret Santa Paws.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod us_state;

pub use email::{Email, EmailError};
pub use id::*;
pub use us_state::{UnknownStateCode, UsState};
