//! Instruction payload construction.

use crate::Message;
use tabula_core::FieldSpec;

/// System message sent with every structured generation request.
pub const SYSTEM_INSTRUCTION: &str =
    "You are a structured data generator. Always respond with valid JSON.";

/// Render one `- name: type` line per field.
///
/// An empty field list renders the single implicit field `response_text`.
///
/// # Examples
///
/// ```
/// use tabula_core::FieldSpec;
/// use tabula_models::render_field_instructions;
///
/// assert_eq!(render_field_instructions(&[]), "- response_text: string");
/// assert_eq!(render_field_instructions(&[FieldSpec::number("age")]), "- age: number");
/// ```
pub fn render_field_instructions(fields: &[FieldSpec]) -> String {
    if fields.is_empty() {
        return "- response_text: string".to_string();
    }
    fields
        .iter()
        .map(|field| format!("- {}: {}", field.name(), field.field_type().as_str()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Build the system and user messages for one request.
pub fn build_messages(
    prompt_text: &str,
    field_instructions: &str,
    image_url: Option<&str>,
) -> Vec<Message> {
    let image_hint = image_url
        .filter(|url| !url.is_empty())
        .map(|url| format!("An image has been uploaded. URL: {}\n", url))
        .unwrap_or_default();

    let user_message = format!(
        "{}Respond to the following prompt.\nPrompt:\n{}\n\n\
         Return a JSON object that strictly follows these fields:\n\
         {}.\nUse lower_snake_case keys and numbers for numeric fields.",
        image_hint,
        prompt_text.trim(),
        field_instructions
    );

    vec![Message::system(SYSTEM_INSTRUCTION), Message::user(user_message)]
}
