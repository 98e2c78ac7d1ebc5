//! Sign-in account domain type.

use chrono::{DateTime, Utc};

use santa_paws_core::{Email, UserId};

use super::CurrentIdentity;

/// A local sign-in identity.
#[derive(Debug, Clone)]
pub struct Account {
    /// Account ID, reused as the profile's `UserId`.
    pub id: UserId,
    /// Sign-in email.
    pub email: Email,
    /// Given name entered at sign-up.
    pub first_name: Option<String>,
    /// Family name entered at sign-up.
    pub last_name: Option<String>,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
}

impl From<Account> for CurrentIdentity {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            email: account.email,
            first_name: account.first_name,
            last_name: account.last_name,
        }
    }
}
