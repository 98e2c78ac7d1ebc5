//! Profile domain models: the exchange user, their address and their corgis.

use core::fmt;

use chrono::{DateTime, Datelike as _, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use santa_paws_core::{CorgiId, Email, UsState, UserId};

/// First name used when the identity has none.
pub const DEFAULT_FIRST_NAME: &str = "Corgi Parent";

/// An exchange participant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Same as the sign-in identity's ID.
    pub id: UserId,
    /// Contact email.
    pub email: Email,
    /// Given name.
    pub first_name: String,
    /// Family name (may be empty).
    pub last_name: String,
    /// When the profile was first saved.
    pub created_at: DateTime<Utc>,
    /// When the profile was last saved.
    pub updated_at: DateTime<Utc>,
}

/// Where a Santa should ship the gift.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailingAddress {
    /// Street address.
    pub address1: String,
    /// Apartment, suite, etc.
    pub address2: Option<String>,
    /// City.
    pub city: String,
    /// State or DC.
    pub state: UsState,
    /// ZIP or ZIP+4.
    pub zip: String,
    /// Contact phone.
    pub phone: String,
}

/// A pet that can act as Santa or recipient.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Corgi {
    /// Unique corgi ID.
    pub id: CorgiId,
    /// Owning user.
    pub owner_id: UserId,
    /// Pet name.
    pub name: String,
    /// Birthday, if known.
    pub birth_date: Option<NaiveDate>,
    /// Photo as an inline `data:image/...` URI.
    pub image_uri: String,
}

impl Corgi {
    /// Age on `today`, or `None` without a birth date.
    #[must_use]
    pub fn age_on(&self, today: NaiveDate) -> Option<Age> {
        Age::between(self.birth_date?, today)
    }
}

/// Whole years and months since a birth date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Age {
    /// Completed years.
    pub years: u32,
    /// Completed months past the last birthday.
    pub months: u32,
}

impl Age {
    /// Age from `birth` to `today`. `None` if `birth` is after `today`.
    #[must_use]
    pub fn between(birth: NaiveDate, today: NaiveDate) -> Option<Self> {
        let mut months = i64::from(today.year() - birth.year()) * 12
            + i64::from(today.month())
            - i64::from(birth.month());
        if today.day() < birth.day() {
            months -= 1;
        }
        let months = u32::try_from(months).ok()?;
        Some(Self {
            years: months / 12,
            months: months % 12,
        })
    }
}

impl fmt::Display for Age {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unit = |n: u32, one: &str, many: &str| {
            format!("{n} {}", if n == 1 { one } else { many })
        };
        match (self.years, self.months) {
            (0, m) => f.write_str(&unit(m, "month", "months")),
            (y, 0) => f.write_str(&unit(y, "year", "years")),
            (y, m) => write!(f, "{}, {}", unit(y, "year", "years"), unit(m, "month", "months")),
        }
    }
}

/// A validated pet from the profile editor.
#[derive(Debug, Clone)]
pub struct CorgiInput {
    /// Existing ID, or `None` for a new pet.
    pub id: Option<CorgiId>,
    /// Pet name.
    pub name: String,
    /// Birthday, if known.
    pub birth_date: Option<NaiveDate>,
    /// Photo data URI.
    pub image_uri: String,
}

/// A validated profile editor submission.
#[derive(Debug, Clone)]
pub struct ProfileInput {
    /// Shipping address.
    pub address: MailingAddress,
    /// The complete set of pets the user should own afterwards.
    pub corgis: Vec<CorgiInput>,
    /// Local path to redirect to after saving.
    pub redirect_to: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_age_between() {
        assert_eq!(
            Age::between(date(2020, 3, 15), date(2023, 5, 20)),
            Some(Age { years: 3, months: 2 })
        );
        assert_eq!(
            Age::between(date(2020, 3, 15), date(2023, 3, 14)),
            Some(Age { years: 2, months: 11 })
        );
        assert_eq!(
            Age::between(date(2023, 1, 1), date(2023, 1, 1)),
            Some(Age { years: 0, months: 0 })
        );
    }

    #[test]
    fn test_age_future_birth_date() {
        assert_eq!(Age::between(date(2030, 1, 1), date(2023, 1, 1)), None);
    }

    #[test]
    fn test_age_display() {
        assert_eq!(Age { years: 0, months: 5 }.to_string(), "5 months");
        assert_eq!(Age { years: 1, months: 0 }.to_string(), "1 year");
        assert_eq!(Age { years: 2, months: 1 }.to_string(), "2 years, 1 month");
    }

    #[test]
    fn test_corgi_without_birth_date_has_no_age() {
        let corgi = Corgi {
            id: CorgiId::new_random(),
            owner_id: UserId::new_random(),
            name: "Biscuit".to_owned(),
            birth_date: None,
            image_uri: "data:image/webp;base64,AAAA".to_owned(),
        };
        assert_eq!(corgi.age_on(date(2024, 1, 1)), None);
    }
}
