//! Desired output field definitions.

use serde::{Deserialize, Serialize};

/// Type tag of a requested output field.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    Serialize,
    Deserialize,
    derive_more::Display,
    strum::EnumIter,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(ascii_case_insensitive)]
pub enum FieldType {
    /// Free text
    #[default]
    #[display("string")]
    #[strum(serialize = "string")]
    String,
    /// Numeric value
    #[display("number")]
    #[strum(serialize = "number")]
    Number,
}

impl FieldType {
    /// String form used in prompts and persisted rows.
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Number => "number",
        }
    }
}

/// One desired output field: a name and a type tag.
///
/// An ordered sequence of these is the schema of one generation request.
///
/// # Examples
///
/// ```
/// use tabula_core::{FieldSpec, FieldType};
///
/// let field = FieldSpec::new("age", FieldType::Number);
/// assert_eq!(field.name(), "age");
/// assert_eq!(*field.field_type(), FieldType::Number);
/// ```
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, derive_getters::Getters,
)]
pub struct FieldSpec {
    /// Field name as the model should emit it
    name: String,
    /// Requested value type
    #[serde(default)]
    field_type: FieldType,
}

impl FieldSpec {
    /// Create a field spec.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
        }
    }

    /// Shorthand for a string field.
    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::String)
    }

    /// Shorthand for a numeric field.
    pub fn number(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Number)
    }
}
