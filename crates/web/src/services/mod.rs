//! Business logic services.
//!
//! # Services
//!
//! - `auth` - Local email + password accounts
//! - `profile` - Atomic profile upsert (address + corgis)
//! - `exchange` - Joining exchanges, listings and the dashboard
//! - `image` - Photo upload normalization

pub mod auth;
pub mod exchange;
pub mod image;
pub mod profile;

pub use auth::{AuthError, AuthService};
pub use exchange::{Dashboard, ExchangeService, JoinError};
pub use self::image::ImageError;
pub use profile::{Profile, ProfileError, ProfileService};
