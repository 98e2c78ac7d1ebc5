//! HTML form parsing and validation.
//!
//! Forms arrive as URL-encoded pairs. Repeated sub-forms use indexed keys such
//! as `corgis[2].name`; indices need not be contiguous and items are ordered by
//! index. Validation failures are reported per field path, using the item's
//! position after ordering (e.g. `corgis[0].birth_date`).

pub mod join;
pub mod profile;

use std::collections::BTreeMap;

use validator::{ValidationError, ValidationErrors, ValidationErrorsKind};

pub use join::{JoinEntryForm, JoinForm};
pub use profile::{CorgiForm, Intent, ProfileForm};

/// Raw URL-encoded form pairs, in submission order.
pub type FormPairs = Vec<(String, String)>;

/// Split `corgis[3].name` into `("corgis", 3, "name")`.
fn parse_indexed_key(key: &str) -> Option<(&str, usize, &str)> {
    let (list, rest) = key.split_once('[')?;
    let (index, rest) = rest.split_once(']')?;
    let field = rest.strip_prefix('.')?;
    Some((list, index.parse().ok()?, field))
}

/// Group the `list[N].field` pairs of one list by index.
///
/// Values are trimmed. Later duplicates of the same field win.
pub(crate) fn indexed_items<'a>(
    pairs: &'a [(String, String)],
    list: &str,
) -> BTreeMap<usize, Vec<(&'a str, &'a str)>> {
    let mut items: BTreeMap<usize, Vec<(&str, &str)>> = BTreeMap::new();
    for (key, value) in pairs {
        if let Some((name, index, field)) = parse_indexed_key(key)
            && name == list
        {
            items.entry(index).or_default().push((field, value.trim()));
        }
    }
    items
}

/// Last value submitted for a top-level key, trimmed.
pub(crate) fn field<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    pairs
        .iter()
        .rev()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.trim())
}

/// Build a validation error with a user-facing message.
pub(crate) fn invalid(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}

/// Field-level error messages keyed by field path.
///
/// Only the first message per field is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    /// Create an empty error set.
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Record an error unless the field already has one.
    pub fn insert(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.0.entry(path.into()).or_insert_with(|| message.into());
    }

    /// Message for a field, or `""` if it is valid.
    #[must_use]
    pub fn get(&self, path: &str) -> &str {
        self.0.get(path).map_or("", String::as_str)
    }

    /// Whether the field has an error.
    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.0.contains_key(path)
    }

    /// Whether no field has an error.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of fields with errors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate over `(path, message)` pairs in path order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Flatten `validator` errors (including nested lists) into field paths.
    #[must_use]
    pub fn from_validation(errors: &ValidationErrors) -> Self {
        let mut out = Self::new();
        out.collect(String::new(), errors);
        out
    }

    fn collect(&mut self, prefix: String, errors: &ValidationErrors) {
        for (name, kind) in errors.errors() {
            let path = if prefix.is_empty() {
                name.to_string()
            } else {
                format!("{prefix}.{name}")
            };
            match kind {
                ValidationErrorsKind::Field(list) => {
                    if let Some(first) = list.first() {
                        let message = first
                            .message
                            .as_ref()
                            .map_or_else(|| format!("Invalid {name}"), ToString::to_string);
                        self.insert(path, message);
                    }
                }
                ValidationErrorsKind::Struct(inner) => self.collect(path, inner),
                ValidationErrorsKind::List(items) => {
                    for (index, inner) in items {
                        self.collect(format!("{path}[{index}]"), inner);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn pairs(raw: &[(&str, &str)]) -> FormPairs {
        raw.iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn test_parse_indexed_key() {
        assert_eq!(
            parse_indexed_key("corgis[12].birth_date"),
            Some(("corgis", 12, "birth_date"))
        );
        assert_eq!(parse_indexed_key("corgis[x].name"), None);
        assert_eq!(parse_indexed_key("corgis[1]name"), None);
        assert_eq!(parse_indexed_key("city"), None);
    }

    #[test]
    fn test_indexed_items_sorted_and_sparse() {
        let form = pairs(&[
            ("corgis[7].name", " Waffles "),
            ("corgis[2].name", "Biscuit"),
            ("corgis[7].image_uri", "data:image/png;base64,AA"),
            ("entries[0].notes", "ignored"),
        ]);
        let items = indexed_items(&form, "corgis");
        let keys: Vec<usize> = items.keys().copied().collect();
        assert_eq!(keys, vec![2, 7]);
        assert_eq!(items[&7][0], ("name", "Waffles"));
        assert_eq!(items[&7].len(), 2);
    }

    #[test]
    fn test_field_uses_last_value() {
        let form = pairs(&[("intent", "add-corgi"), ("intent", " submit ")]);
        assert_eq!(field(&form, "intent"), Some("submit"));
        assert_eq!(field(&form, "missing"), None);
    }

    #[test]
    fn test_field_errors_keep_first_message() {
        let mut errors = FieldErrors::new();
        errors.insert("zip", "Required");
        errors.insert("zip", "Enter a 5-digit ZIP code");
        assert_eq!(errors.get("zip"), "Required");
        assert_eq!(errors.get("city"), "");
        assert_eq!(errors.len(), 1);
    }
}
