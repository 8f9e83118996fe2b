use serde::{Deserialize, Serialize};

/// Code attached to every finding of the business rule checker.
pub const FORMAT_CHECK_ERROR: &str = "FormatCheckError";
/// Code attached to findings about a missing identifier or secret.
pub const VALUE_REQUIRED: &str = "VALUE_REQUIRED";
/// Code attached to the payload size finding.
pub const MAX_BODY_SIZE: &str = "max-body-size";
pub const MAX_LENGTH_ERROR: &str = "max-length-error";
pub const MAX_PROPERTIES_ERROR: &str = "max-properties-error";
pub const MAX_ITEMS_ERROR: &str = "max-items-error";

/// A single validation finding. Produced by the schema validator, the business
/// rule checker and the remote debug endpoint, which all share this shape.
///
/// The serialized form uses the camelCase keys of the debug endpoint response
/// so remote messages deserialize directly into this struct.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationMessage {
    #[serde(default)]
    pub field_path: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub validation_code: String,
    /// Link to the relevant Measurement Protocol documentation. Attached by
    /// [crate::response::format_error_messages].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,
}

impl ValidationMessage {
    pub fn new(
        field_path: impl Into<String>,
        description: impl Into<String>,
        validation_code: impl Into<String>,
    ) -> Self {
        Self {
            field_path: field_path.into(),
            description: description.into(),
            validation_code: validation_code.into(),
            documentation: None,
        }
    }
}

impl std::fmt::Display for ValidationMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.field_path, self.description)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserializes_remote_message() {
        let json = r#"{
            "fieldPath": "events",
            "description": "Event at index: [0] has invalid name [_badEventName].",
            "validationCode": "NAME_INVALID"
        }"#;

        let message: ValidationMessage = serde_json::from_str(json).unwrap();

        assert_eq!(message.field_path, "events");
        assert_eq!(message.validation_code, "NAME_INVALID");
        assert_eq!(message.documentation, None);
    }

    #[test]
    fn test_documentation_is_omitted_when_missing() {
        let message = ValidationMessage::new("#", "broken", "format_invalid");
        let json = serde_json::to_value(&message).unwrap();

        assert!(json.get("documentation").is_none());
        assert_eq!(json["fieldPath"], "#");
    }
}
