//! Session-related types.
//!
//! Types stored in the session for authentication state.

use serde::{Deserialize, Serialize};

use santa_paws_core::{Email, UserId};

use super::profile::DEFAULT_FIRST_NAME;

/// Session-stored sign-in identity.
///
/// The id doubles as the `User.id` once a profile has been saved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentIdentity {
    /// Account ID (and exchange profile ID).
    pub id: UserId,
    /// Sign-in email.
    pub email: Email,
    /// Given name, if the account has one.
    pub first_name: Option<String>,
    /// Family name, if the account has one.
    pub last_name: Option<String>,
}

impl CurrentIdentity {
    /// First name to store on the exchange profile.
    #[must_use]
    pub fn profile_first_name(&self) -> &str {
        self.first_name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(DEFAULT_FIRST_NAME)
    }

    /// Last name to store on the exchange profile.
    #[must_use]
    pub fn profile_last_name(&self) -> &str {
        self.last_name.as_deref().map_or("", str::trim)
    }
}

/// Session keys for authentication data.
pub mod keys {
    /// Key for storing the current signed-in identity.
    pub const CURRENT_IDENTITY: &str = "current_identity";
}
