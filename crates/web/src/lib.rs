//! Secret Santa Paws web library.
//!
//! The binary in `main.rs` wires this up with config, Sentry and a real
//! `PostgreSQL` pool; tests drive the same router with in-memory sessions.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod filters;
pub mod forms;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
