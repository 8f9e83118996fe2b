//! Structural validation of a payload against the Measurement Protocol base
//! content schema, see `schemas/base_content.json`.

use {
    crate::message::{
        ValidationMessage,
        MAX_ITEMS_ERROR,
        MAX_LENGTH_ERROR,
        MAX_PROPERTIES_ERROR,
    },
    jsonschema::{error::ValidationErrorKind, ValidationError, Validator},
    lazy_regex::Lazy,
    serde_json::Value,
};

/// Raw JSON of the base content schema.
pub const BASE_CONTENT_SCHEMA: &str = include_str!("../schemas/base_content.json");

static VALIDATOR: Lazy<Validator> = Lazy::new(|| {
    let schema: Value =
        serde_json::from_str(BASE_CONTENT_SCHEMA).expect("Base content schema must be valid JSON");

    jsonschema::validator_for(&schema).expect("Base content schema must compile")
});

/// Whether the payload satisfies the base content schema.
pub fn is_valid(payload: &Value) -> bool {
    VALIDATOR.is_valid(payload)
}

/// All schema violations of the payload. Field paths are `#` followed by the
/// JSON pointer of the offending value; for missing or unexpected properties
/// the property name is appended.
pub fn get_errors(payload: &Value) -> Vec<ValidationMessage> {
    VALIDATOR
        .iter_errors(payload)
        .flat_map(|error| messages_for(&error))
        .collect()
}

fn messages_for(error: &ValidationError<'_>) -> Vec<ValidationMessage> {
    let pointer = error.instance_path.to_string();
    let code = code_for(&error.kind);

    match &error.kind {
        ValidationErrorKind::Required { property } => {
            let property = property
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| property.to_string());

            vec![ValidationMessage::new(
                format!("#{pointer}/{property}"),
                error.to_string(),
                code,
            )]
        }
        ValidationErrorKind::AdditionalProperties { unexpected } => unexpected
            .iter()
            .map(|key| {
                ValidationMessage::new(
                    format!("#{pointer}/{key}"),
                    format!("Additional properties are not allowed ('{key}' was unexpected)"),
                    code,
                )
            })
            .collect(),
        _ => vec![ValidationMessage::new(
            format!("#{pointer}"),
            error.to_string(),
            code,
        )],
    }
}

fn code_for(kind: &ValidationErrorKind) -> &'static str {
    match kind {
        ValidationErrorKind::Required { .. } => "required-error",
        ValidationErrorKind::AdditionalProperties { .. } => "additional-properties-error",
        ValidationErrorKind::Type { .. } => "type-error",
        ValidationErrorKind::Pattern { .. } => "pattern-error",
        ValidationErrorKind::MaxLength { .. } => MAX_LENGTH_ERROR,
        ValidationErrorKind::MaxProperties { .. } => MAX_PROPERTIES_ERROR,
        ValidationErrorKind::MaxItems { .. } => MAX_ITEMS_ERROR,
        _ => "schema-error",
    }
}
