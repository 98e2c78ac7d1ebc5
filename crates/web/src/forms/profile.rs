//! Profile editor form: mailing address plus a repeatable corgi sub-form.

use std::collections::HashSet;

use chrono::{NaiveDate, Utc};
use validator::{Validate, ValidationError};

use santa_paws_core::{CorgiId, UsState};

use super::{FieldErrors, field, indexed_items, invalid};
use crate::models::{Corgi, CorgiInput, MailingAddress, ProfileInput};

/// Default post-save destination.
pub const DEFAULT_REDIRECT: &str = "/";

/// What the submit button asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    /// Validate and save.
    Submit,
    /// Append an empty corgi sub-form.
    AddCorgi,
    /// Drop the corgi sub-form at this position.
    RemoveCorgi(usize),
}

impl Intent {
    /// Parse the `intent` field. Anything unrecognized is a submit.
    #[must_use]
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("add-corgi") => Self::AddCorgi,
            Some(other) => other
                .strip_prefix("remove-corgi:")
                .and_then(|n| n.parse().ok())
                .map_or(Self::Submit, Self::RemoveCorgi),
            None => Self::Submit,
        }
    }
}

/// One corgi sub-form, as submitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Validate)]
pub struct CorgiForm {
    /// Existing corgi id; empty for a new corgi.
    #[validate(custom(function = "validate_optional_uuid"))]
    pub id: String,
    #[validate(
        custom(function = "required"),
        length(max = 50, message = "Keep names under 50 characters")
    )]
    pub name: String,
    /// `YYYY-MM-DD`, optional.
    #[validate(custom(function = "validate_birth_date"))]
    pub birth_date: String,
    /// Photo data URI filled in by the upload script.
    #[validate(custom(function = "validate_image_uri"))]
    pub image_uri: String,
}

impl From<&Corgi> for CorgiForm {
    fn from(corgi: &Corgi) -> Self {
        Self {
            id: corgi.id.to_string(),
            name: corgi.name.clone(),
            birth_date: corgi
                .birth_date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            image_uri: corgi.image_uri.clone(),
        }
    }
}

/// The whole profile editor, as submitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Validate)]
pub struct ProfileForm {
    #[validate(
        custom(function = "required"),
        length(max = 100, message = "Keep this under 100 characters")
    )]
    pub address1: String,
    #[validate(length(max = 100, message = "Keep this under 100 characters"))]
    pub address2: String,
    #[validate(
        custom(function = "required"),
        length(max = 100, message = "Keep this under 100 characters")
    )]
    pub city: String,
    #[validate(custom(function = "validate_state"))]
    pub state: String,
    #[validate(custom(function = "validate_zip"))]
    pub zip: String,
    #[validate(custom(function = "validate_phone"))]
    pub phone: String,
    #[validate(nested)]
    pub corgis: Vec<CorgiForm>,
    #[validate(custom(function = "validate_redirect"))]
    pub redirect_uri: String,
}

impl ProfileForm {
    /// Parse submitted pairs into a form and the requested intent.
    #[must_use]
    pub fn from_pairs(pairs: &[(String, String)]) -> (Self, Intent) {
        let get = |key: &str| field(pairs, key).unwrap_or_default().to_owned();

        let corgis = indexed_items(pairs, "corgis")
            .into_values()
            .map(|fields| {
                let mut corgi = CorgiForm::default();
                for (name, value) in fields {
                    let slot = match name {
                        "id" => &mut corgi.id,
                        "name" => &mut corgi.name,
                        "birth_date" => &mut corgi.birth_date,
                        "image_uri" => &mut corgi.image_uri,
                        _ => continue,
                    };
                    value.clone_into(slot);
                }
                corgi
            })
            .collect();

        let redirect_uri = field(pairs, "redirect_uri")
            .filter(|v| !v.is_empty())
            .unwrap_or(DEFAULT_REDIRECT)
            .to_owned();

        let form = Self {
            address1: get("address1"),
            address2: get("address2"),
            city: get("city"),
            state: get("state").to_ascii_uppercase(),
            zip: get("zip"),
            phone: get("phone"),
            corgis,
            redirect_uri,
        };

        (form, Intent::parse(field(pairs, "intent")))
    }

    /// Pre-fill the editor from a saved profile.
    #[must_use]
    pub fn from_profile(
        address: Option<&MailingAddress>,
        corgis: &[Corgi],
        redirect_uri: &str,
    ) -> Self {
        let mut form = Self {
            corgis: corgis.iter().map(CorgiForm::from).collect(),
            redirect_uri: redirect_uri.to_owned(),
            ..Self::default()
        };
        if let Some(a) = address {
            form.address1.clone_from(&a.address1);
            form.address2 = a.address2.clone().unwrap_or_default();
            form.city.clone_from(&a.city);
            form.state = a.state.code().to_owned();
            form.zip.clone_from(&a.zip);
            form.phone.clone_from(&a.phone);
        }
        if form.corgis.is_empty() {
            form.corgis.push(CorgiForm::default());
        }
        form
    }

    /// Apply a non-submit intent. Returns `false` for [`Intent::Submit`].
    pub fn apply_intent(&mut self, intent: Intent) -> bool {
        match intent {
            Intent::Submit => false,
            Intent::AddCorgi => {
                self.corgis.push(CorgiForm::default());
                true
            }
            Intent::RemoveCorgi(index) => {
                if index < self.corgis.len() {
                    self.corgis.remove(index);
                }
                true
            }
        }
    }

    /// Validate the form and convert it into a [`ProfileInput`].
    ///
    /// # Errors
    ///
    /// Returns every field error found, keyed by field path.
    pub fn to_input(&self) -> Result<ProfileInput, FieldErrors> {
        let mut errors = match self.validate() {
            Ok(()) => FieldErrors::new(),
            Err(e) => FieldErrors::from_validation(&e),
        };

        if self.corgis.is_empty() {
            errors.insert("corgis", "Add at least one corgi");
        }

        let mut seen = HashSet::new();
        for (index, corgi) in self.corgis.iter().enumerate() {
            if let Ok(id) = CorgiId::parse(&corgi.id)
                && !seen.insert(id)
            {
                errors.insert(format!("corgis[{index}].id"), "This corgi is listed twice");
            }
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        // Everything below was checked by `validate`.
        let corgis = self
            .corgis
            .iter()
            .map(|c| CorgiInput {
                id: CorgiId::parse(&c.id).ok(),
                name: c.name.clone(),
                birth_date: parse_date(&c.birth_date),
                image_uri: c.image_uri.clone(),
            })
            .collect();

        let state = UsState::parse(&self.state).map_err(|_| {
            let mut e = FieldErrors::new();
            e.insert("state", "Choose a state");
            e
        })?;

        Ok(ProfileInput {
            address: MailingAddress {
                address1: self.address1.clone(),
                address2: Some(self.address2.clone()).filter(|a| !a.is_empty()),
                city: self.city.clone(),
                state,
                zip: self.zip.clone(),
                phone: self.phone.clone(),
            },
            corgis,
            redirect_to: self.redirect_uri.clone(),
        })
    }
}

// =============================================================================
// Field Validators
// =============================================================================

fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}

fn required(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(invalid("required", "Required"));
    }
    Ok(())
}

fn validate_optional_uuid(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() || CorgiId::parse(value).is_ok() {
        return Ok(());
    }
    Err(invalid("uuid", "Invalid corgi id"))
}

fn validate_birth_date(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Ok(());
    }
    let date = parse_date(value).ok_or_else(|| invalid("date", "Enter a date as YYYY-MM-DD"))?;
    if date > Utc::now().date_naive() {
        return Err(invalid("future_date", "Date should be before today"));
    }
    Ok(())
}

fn validate_image_uri(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(invalid("required", "Upload a photo"));
    }
    if !value.starts_with("data:image/") {
        return Err(invalid("image_uri", "Upload a photo"));
    }
    Ok(())
}

fn validate_state(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(invalid("required", "Required"));
    }
    UsState::parse(value)
        .map(|_| ())
        .map_err(|_| invalid("state", "Choose a state"))
}

fn validate_zip(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(invalid("required", "Required"));
    }
    let digits = |s: &str, n: usize| s.len() == n && s.bytes().all(|b| b.is_ascii_digit());
    let ok = match value.split_once('-') {
        Some((five, four)) => digits(five, 5) && digits(four, 4),
        None => digits(value, 5),
    };
    if !ok {
        return Err(invalid("zip", "Enter a ZIP code like 12345 or 12345-6789"));
    }
    Ok(())
}

fn validate_phone(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(invalid("required", "Required"));
    }
    let allowed = |c: char| c.is_ascii_digit() || " +-().".contains(c);
    let digits = value.chars().filter(char::is_ascii_digit).count();
    if !value.chars().all(allowed) || !(10..=15).contains(&digits) {
        return Err(invalid("phone", "Enter a phone number with 10 to 15 digits"));
    }
    Ok(())
}

fn validate_redirect(value: &str) -> Result<(), ValidationError> {
    if value.starts_with('/') && !value.starts_with("//") && !value.contains('\\') {
        return Ok(());
    }
    Err(invalid("redirect", "Invalid redirect target"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    const PHOTO: &str = "data:image/webp;base64,UklGRg==";

    fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    fn valid_pairs() -> Vec<(String, String)> {
        pairs(&[
            ("address1", "1 Fluff Lane"),
            ("address2", ""),
            ("city", "Braidwood"),
            ("state", "il"),
            ("zip", "60408"),
            ("phone", "(815) 555-0100"),
            ("corgis[0].name", "Biscuit"),
            ("corgis[0].birth_date", "2021-04-01"),
            ("corgis[0].image_uri", PHOTO),
        ])
    }

    #[test]
    fn test_valid_form_converts() {
        let (form, intent) = ProfileForm::from_pairs(&valid_pairs());
        assert_eq!(intent, Intent::Submit);
        let input = form.to_input().unwrap();
        assert_eq!(input.address.state, UsState::Illinois);
        assert_eq!(input.address.address2, None);
        assert_eq!(input.redirect_to, "/");
        assert_eq!(input.corgis.len(), 1);
        assert!(input.corgis[0].id.is_none());
        assert_eq!(
            input.corgis[0].birth_date,
            NaiveDate::from_ymd_opt(2021, 4, 1)
        );
    }

    #[test]
    fn test_sparse_indices_are_ordered() {
        let mut raw = valid_pairs();
        raw.extend(pairs(&[
            ("corgis[5].name", "Waffles"),
            ("corgis[5].image_uri", PHOTO),
        ]));
        let (form, _) = ProfileForm::from_pairs(&raw);
        let names: Vec<&str> = form.corgis.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Biscuit", "Waffles"]);
    }

    #[test]
    fn test_errors_are_keyed_by_field_path() {
        let mut raw = valid_pairs();
        raw.extend(pairs(&[
            ("corgis[1].name", "Future Pup"),
            ("corgis[1].birth_date", "2999-01-01"),
            ("corgis[1].image_uri", PHOTO),
        ]));
        raw.retain(|(k, _)| k != "zip");
        let (form, _) = ProfileForm::from_pairs(&raw);
        let errors = form.to_input().unwrap_err();
        assert_eq!(errors.get("corgis[1].birth_date"), "Date should be before today");
        assert_eq!(errors.get("zip"), "Required");
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_at_least_one_corgi() {
        let mut raw = valid_pairs();
        raw.retain(|(k, _)| !k.starts_with("corgis"));
        let (form, _) = ProfileForm::from_pairs(&raw);
        let errors = form.to_input().unwrap_err();
        assert!(errors.contains("corgis"));
    }

    #[test]
    fn test_image_uri_must_be_data_uri() {
        let mut raw = valid_pairs();
        raw.push(("corgis[0].image_uri".into(), "https://example.com/a.png".into()));
        let (form, _) = ProfileForm::from_pairs(&raw);
        let errors = form.to_input().unwrap_err();
        assert_eq!(errors.get("corgis[0].image_uri"), "Upload a photo");
    }

    #[test]
    fn test_duplicate_corgi_ids_rejected() {
        let id = CorgiId::new_random().to_string();
        let mut raw = valid_pairs();
        raw.extend(pairs(&[
            ("corgis[0].id", &id),
            ("corgis[1].id", &id),
            ("corgis[1].name", "Twin"),
            ("corgis[1].image_uri", PHOTO),
        ]));
        let (form, _) = ProfileForm::from_pairs(&raw);
        let errors = form.to_input().unwrap_err();
        assert!(errors.contains("corgis[1].id"));
    }

    #[test]
    fn test_field_validators() {
        assert!(validate_zip("12345").is_ok());
        assert!(validate_zip("12345-6789").is_ok());
        assert!(validate_zip("1234").is_err());
        assert!(validate_zip("12345-67").is_err());
        assert!(validate_phone("+1 (815) 555-0100").is_ok());
        assert!(validate_phone("555-0100").is_err());
        assert!(validate_phone("815-555-CORG").is_err());
        assert!(validate_redirect("/exchanges/current").is_ok());
        assert!(validate_redirect("//evil.example").is_err());
        assert!(validate_redirect("https://evil.example").is_err());
        assert!(validate_optional_uuid("").is_ok());
        assert!(validate_optional_uuid("nope").is_err());
    }

    #[test]
    fn test_redirect_defaults_to_root() {
        let (form, _) = ProfileForm::from_pairs(&pairs(&[("redirect_uri", "")]));
        assert_eq!(form.redirect_uri, "/");
    }

    #[test]
    fn test_intents() {
        assert_eq!(Intent::parse(None), Intent::Submit);
        assert_eq!(Intent::parse(Some("add-corgi")), Intent::AddCorgi);
        assert_eq!(Intent::parse(Some("remove-corgi:2")), Intent::RemoveCorgi(2));
        assert_eq!(Intent::parse(Some("remove-corgi:x")), Intent::Submit);

        let (mut form, _) = ProfileForm::from_pairs(&valid_pairs());
        assert!(form.apply_intent(Intent::AddCorgi));
        assert_eq!(form.corgis.len(), 2);
        assert!(form.apply_intent(Intent::RemoveCorgi(0)));
        assert_eq!(form.corgis.len(), 1);
        assert_eq!(form.corgis[0], CorgiForm::default());
        assert!(form.apply_intent(Intent::RemoveCorgi(9)));
        assert!(!form.apply_intent(Intent::Submit));
    }

    #[test]
    fn test_from_profile_prefills_one_empty_corgi() {
        let form = ProfileForm::from_profile(None, &[], "/");
        assert_eq!(form.corgis.len(), 1);
        assert!(form.address1.is_empty());
    }
}
