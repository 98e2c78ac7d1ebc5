//! US state and district codes for mailing addresses.
//!
//! Gifts ship within the United States, so the mailing address form only
//! accepts the USPS two-letter codes listed here.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Error returned when a state code is not a known USPS code.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown state code: {0}")]
pub struct UnknownStateCode(pub String);

macro_rules! us_states {
    ($($variant:ident => $code:literal, $name:literal;)*) => {
        /// A US state (or the District of Columbia), keyed by USPS code.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum UsState {
            $(
                #[doc = $name]
                #[serde(rename = $code)]
                $variant,
            )*
        }

        impl UsState {
            /// Every state, in the order shown in the address form.
            pub const ALL: &'static [Self] = &[$(Self::$variant),*];

            /// The USPS two-letter code (e.g. `"CA"`).
            #[must_use]
            pub const fn code(self) -> &'static str {
                match self {
                    $(Self::$variant => $code,)*
                }
            }

            /// The display name (e.g. `"California"`).
            #[must_use]
            pub const fn name(self) -> &'static str {
                match self {
                    $(Self::$variant => $name,)*
                }
            }

            /// Look up a state by USPS code, ignoring case and surrounding spaces.
            ///
            /// # Errors
            ///
            /// Returns [`UnknownStateCode`] if the code is not listed.
            pub fn parse(code: &str) -> Result<Self, UnknownStateCode> {
                let upper = code.trim().to_ascii_uppercase();
                match upper.as_str() {
                    $($code => Ok(Self::$variant),)*
                    _ => Err(UnknownStateCode(code.to_owned())),
                }
            }
        }
    };
}

us_states! {
    Alabama => "AL", "Alabama";
    Alaska => "AK", "Alaska";
    Arizona => "AZ", "Arizona";
    Arkansas => "AR", "Arkansas";
    California => "CA", "California";
    Colorado => "CO", "Colorado";
    Connecticut => "CT", "Connecticut";
    Delaware => "DE", "Delaware";
    DistrictOfColumbia => "DC", "District Of Columbia";
    Florida => "FL", "Florida";
    Georgia => "GA", "Georgia";
    Hawaii => "HI", "Hawaii";
    Idaho => "ID", "Idaho";
    Illinois => "IL", "Illinois";
    Indiana => "IN", "Indiana";
    Iowa => "IA", "Iowa";
    Kansas => "KS", "Kansas";
    Kentucky => "KY", "Kentucky";
    Louisiana => "LA", "Louisiana";
    Maine => "ME", "Maine";
    Maryland => "MD", "Maryland";
    Massachusetts => "MA", "Massachusetts";
    Michigan => "MI", "Michigan";
    Minnesota => "MN", "Minnesota";
    Mississippi => "MS", "Mississippi";
    Missouri => "MO", "Missouri";
    Montana => "MT", "Montana";
    Nebraska => "NE", "Nebraska";
    Nevada => "NV", "Nevada";
    NewHampshire => "NH", "New Hampshire";
    NewJersey => "NJ", "New Jersey";
    NewMexico => "NM", "New Mexico";
    NewYork => "NY", "New York";
    NorthCarolina => "NC", "North Carolina";
    NorthDakota => "ND", "North Dakota";
    Ohio => "OH", "Ohio";
    Oklahoma => "OK", "Oklahoma";
    Oregon => "OR", "Oregon";
    Pennsylvania => "PA", "Pennsylvania";
    RhodeIsland => "RI", "Rhode Island";
    SouthCarolina => "SC", "South Carolina";
    SouthDakota => "SD", "South Dakota";
    Tennessee => "TN", "Tennessee";
    Texas => "TX", "Texas";
    Utah => "UT", "Utah";
    Vermont => "VT", "Vermont";
    Virginia => "VA", "Virginia";
    Washington => "WA", "Washington";
    WestVirginia => "WV", "West Virginia";
    Wisconsin => "WI", "Wisconsin";
    Wyoming => "WY", "Wyoming";
}

impl fmt::Display for UsState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl std::str::FromStr for UsState {
    type Err = UnknownStateCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
