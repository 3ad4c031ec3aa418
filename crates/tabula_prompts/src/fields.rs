//! Field rows submitted with a prompt.

use std::str::FromStr;
use tabula_core::{FieldSpec, FieldType};

/// Pair submitted field names with types by position.
///
/// A missing type means `string`, rows with a blank name are skipped, and any
/// type other than `string` or `number` (case-insensitive) becomes `string`.
///
/// # Examples
///
/// ```
/// use tabula_core::FieldSpec;
/// use tabula_prompts::parse_field_rows;
///
/// let rows = parse_field_rows(&["age", " ", "name"], &["NUMBER", "number"]);
/// assert_eq!(rows, vec![FieldSpec::number("age"), FieldSpec::string("name")]);
/// ```
pub fn parse_field_rows<N, T>(names: &[N], types: &[T]) -> Vec<FieldSpec>
where
    N: AsRef<str>,
    T: AsRef<str>,
{
    names
        .iter()
        .enumerate()
        .filter_map(|(i, name)| {
            let name = name.as_ref().trim();
            if name.is_empty() {
                return None;
            }
            let field_type = types
                .get(i)
                .and_then(|t| FieldType::from_str(t.as_ref().trim()).ok())
                .unwrap_or_default();
            Some(FieldSpec::new(name, field_type))
        })
        .collect()
}

/// Rows a fresh form starts with, also used when none are submitted.
pub fn default_field_rows() -> Vec<FieldSpec> {
    vec![
        FieldSpec::string("inventorFullName"),
        FieldSpec::number("inventorBirthYear"),
        FieldSpec::number("numberOnTheShirt"),
    ]
}
