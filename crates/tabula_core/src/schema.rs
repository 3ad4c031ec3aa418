//! Reusable prompt schemas.

use crate::{FieldSpec, FieldType};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tabula_error::{ValidationError, ValidationErrorKind};

/// Field of a reusable schema.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, derive_getters::Getters)]
pub struct SchemaField {
    /// Field name, unique within its schema
    name: String,
    /// Value type
    field_type: FieldType,
    /// Position within the schema
    sort_order: u16,
}

impl SchemaField {
    /// Create a schema field.
    pub fn new(name: impl Into<String>, field_type: FieldType, sort_order: u16) -> Self {
        Self {
            name: name.into(),
            field_type,
            sort_order,
        }
    }
}

/// Named, reusable set of output fields.
///
/// # Examples
///
/// ```
/// use tabula_core::{FieldType, PromptSchema, SchemaField};
///
/// let schema = PromptSchema::new(
///     "inventor",
///     "",
///     vec![
///         SchemaField::new("birth_year", FieldType::Number, 2),
///         SchemaField::new("full_name", FieldType::String, 1),
///     ],
/// )
/// .unwrap();
/// let specs = schema.field_specs();
/// assert_eq!(specs[0].name(), "full_name");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_getters::Getters)]
pub struct PromptSchema {
    /// Schema name
    name: String,
    /// Free-form description
    description: String,
    /// Whether the schema is offered to users
    is_active: bool,
    /// Fields in declaration order
    fields: Vec<SchemaField>,
}

impl PromptSchema {
    /// Create an active schema.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationErrorKind::BlankSchemaName`] or
    /// [`ValidationErrorKind::DuplicateSchemaField`].
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        fields: Vec<SchemaField>,
    ) -> Result<Self, ValidationError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ValidationError::new(ValidationErrorKind::BlankSchemaName));
        }

        let mut seen = HashSet::new();
        for field in &fields {
            if !seen.insert(field.name.as_str()) {
                return Err(ValidationError::new(
                    ValidationErrorKind::DuplicateSchemaField {
                        schema: name.clone(),
                        field: field.name.clone(),
                    },
                ));
            }
        }

        Ok(Self {
            name,
            description: description.into(),
            is_active: true,
            fields,
        })
    }

    /// Mark the schema inactive.
    pub fn deactivate(mut self) -> Self {
        self.is_active = false;
        self
    }

    /// Fields as generation specs, ordered by sort order.
    pub fn field_specs(&self) -> Vec<FieldSpec> {
        let mut fields: Vec<&SchemaField> = self.fields.iter().collect();
        fields.sort_by_key(|field| field.sort_order);
        fields
            .into_iter()
            .map(|field| FieldSpec::new(field.name.clone(), field.field_type))
            .collect()
    }
}
