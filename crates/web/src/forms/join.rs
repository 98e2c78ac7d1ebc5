//! Exchange join form: one row per corgi, with a checkbox and notes.

use std::collections::HashSet;

use validator::{Validate, ValidationError};

use santa_paws_core::{CorgiId, ExchangeId};

use super::{FieldErrors, indexed_items, invalid};
use crate::models::{Corgi, NewEntry};

/// One corgi row of the join form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Validate)]
pub struct JoinEntryForm {
    /// Whether the corgi was ticked.
    pub selected: bool,
    #[validate(custom(function = "validate_uuid"))]
    pub santa_id: String,
    #[validate(custom(function = "validate_uuid"))]
    pub exchange_id: String,
    /// Display only; not submitted back by the browser.
    pub santa_name: String,
    #[validate(length(max = 500, message = "Keep notes under 500 characters"))]
    pub notes: String,
}

/// The join form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Validate)]
pub struct JoinForm {
    #[validate(nested)]
    pub entries: Vec<JoinEntryForm>,
}

impl JoinForm {
    /// Parse submitted `entries[N].field` pairs.
    #[must_use]
    pub fn from_pairs(pairs: &[(String, String)]) -> Self {
        let entries = indexed_items(pairs, "entries")
            .into_values()
            .map(|fields| {
                let mut entry = JoinEntryForm::default();
                for (name, value) in fields {
                    match name {
                        "selected" => entry.selected = !value.is_empty(),
                        "santa_id" => value.clone_into(&mut entry.santa_id),
                        "exchange_id" => value.clone_into(&mut entry.exchange_id),
                        "notes" => value.clone_into(&mut entry.notes),
                        _ => {}
                    }
                }
                entry
            })
            .collect();

        Self { entries }
    }

    /// An unticked row for each of the user's corgis.
    #[must_use]
    pub fn for_corgis(exchange_id: ExchangeId, corgis: &[Corgi]) -> Self {
        let entries = corgis
            .iter()
            .map(|c| JoinEntryForm {
                selected: false,
                santa_id: c.id.to_string(),
                exchange_id: exchange_id.to_string(),
                santa_name: c.name.clone(),
                notes: String::new(),
            })
            .collect();

        Self { entries }
    }

    /// Fill display names back in after a failed submit.
    pub fn attach_names(&mut self, corgis: &[Corgi]) {
        for entry in &mut self.entries {
            if let Some(c) = corgis.iter().find(|c| c.id.to_string() == entry.santa_id) {
                entry.santa_name.clone_from(&c.name);
            }
        }
    }

    /// Validate and keep the ticked rows for `exchange_id`.
    ///
    /// # Errors
    ///
    /// Returns field errors if a row is malformed, belongs to a different
    /// exchange, repeats a corgi, or if nothing was ticked.
    pub fn to_entries(&self, exchange_id: ExchangeId) -> Result<Vec<NewEntry>, FieldErrors> {
        let mut errors = match self.validate() {
            Ok(()) => FieldErrors::new(),
            Err(e) => FieldErrors::from_validation(&e),
        };

        let mut entries = Vec::new();
        let mut seen = HashSet::new();
        for (index, row) in self.entries.iter().enumerate() {
            if !row.selected {
                continue;
            }
            // Malformed ids were already reported by `validate`.
            let (Ok(santa_id), Ok(row_exchange)) = (
                CorgiId::parse(&row.santa_id),
                ExchangeId::parse(&row.exchange_id),
            ) else {
                continue;
            };
            if row_exchange != exchange_id {
                errors.insert(
                    format!("entries[{index}].exchange_id"),
                    "Does not match this exchange",
                );
                continue;
            }
            if !seen.insert(santa_id) {
                errors.insert(
                    format!("entries[{index}].santa_id"),
                    "This corgi is selected twice",
                );
                continue;
            }
            entries.push(NewEntry {
                exchange_id,
                santa_id,
                notes: Some(row.notes.clone()).filter(|n| !n.is_empty()),
            });
        }

        if entries.is_empty() && errors.is_empty() {
            errors.insert("entries", "Select at least one corgi");
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(entries)
    }
}

fn validate_uuid(value: &str) -> Result<(), ValidationError> {
    if uuid::Uuid::parse_str(value.trim()).is_ok() {
        return Ok(());
    }
    Err(invalid("uuid", "Invalid id"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn pairs(raw: &[(&str, String)]) -> Vec<(String, String)> {
        raw.iter().map(|(k, v)| ((*k).to_owned(), v.clone())).collect()
    }

    #[test]
    fn test_selected_rows_become_entries() {
        let exchange = ExchangeId::new_random();
        let a = CorgiId::new_random();
        let b = CorgiId::new_random();
        let form = JoinForm::from_pairs(&pairs(&[
            ("entries[0].selected", "on".into()),
            ("entries[0].santa_id", a.to_string()),
            ("entries[0].exchange_id", exchange.to_string()),
            ("entries[0].notes", "  loves squeaky toys ".into()),
            ("entries[1].santa_id", b.to_string()),
            ("entries[1].exchange_id", exchange.to_string()),
            ("entries[1].notes", "   ".into()),
        ]));
        let entries = form.to_entries(exchange).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].santa_id, a);
        assert_eq!(entries[0].notes.as_deref(), Some("loves squeaky toys"));
    }

    #[test]
    fn test_blank_notes_are_none() {
        let exchange = ExchangeId::new_random();
        let form = JoinForm::from_pairs(&pairs(&[
            ("entries[0].selected", "on".into()),
            ("entries[0].santa_id", CorgiId::new_random().to_string()),
            ("entries[0].exchange_id", exchange.to_string()),
            ("entries[0].notes", "  ".into()),
        ]));
        let entries = form.to_entries(exchange).unwrap();
        assert_eq!(entries[0].notes, None);
    }

    #[test]
    fn test_nothing_selected() {
        let exchange = ExchangeId::new_random();
        let form = JoinForm::for_corgis(exchange, &[]);
        let errors = form.to_entries(exchange).unwrap_err();
        assert_eq!(errors.get("entries"), "Select at least one corgi");
    }

    #[test]
    fn test_exchange_mismatch() {
        let exchange = ExchangeId::new_random();
        let form = JoinForm::from_pairs(&pairs(&[
            ("entries[0].selected", "on".into()),
            ("entries[0].santa_id", CorgiId::new_random().to_string()),
            ("entries[0].exchange_id", ExchangeId::new_random().to_string()),
        ]));
        let errors = form.to_entries(exchange).unwrap_err();
        assert!(errors.contains("entries[0].exchange_id"));
    }

    #[test]
    fn test_same_corgi_twice_is_rejected() {
        let exchange = ExchangeId::new_random();
        let santa = CorgiId::new_random().to_string();
        let form = JoinForm::from_pairs(&pairs(&[
            ("entries[0].selected", "on".into()),
            ("entries[0].santa_id", santa.clone()),
            ("entries[0].exchange_id", exchange.to_string()),
            ("entries[3].selected", "on".into()),
            ("entries[3].santa_id", santa),
            ("entries[3].exchange_id", exchange.to_string()),
        ]));
        let errors = form.to_entries(exchange).unwrap_err();
        assert!(!errors.contains("entries[0].santa_id"));
        assert_eq!(errors.get("entries[1].santa_id"), "This corgi is selected twice");
    }

    #[test]
    fn test_notes_too_long() {
        let exchange = ExchangeId::new_random();
        let form = JoinForm::from_pairs(&pairs(&[
            ("entries[0].selected", "on".into()),
            ("entries[0].santa_id", CorgiId::new_random().to_string()),
            ("entries[0].exchange_id", exchange.to_string()),
            ("entries[0].notes", "a".repeat(501)),
        ]));
        let errors = form.to_entries(exchange).unwrap_err();
        assert!(errors.contains("entries[0].notes"));
    }
}
