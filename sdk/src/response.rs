//! Rewrites raw findings into user facing text and links each one to the
//! Measurement Protocol documentation.

use {
    crate::message::{
        ValidationMessage,
        MAX_BODY_SIZE,
        MAX_ITEMS_ERROR,
        MAX_LENGTH_ERROR,
        MAX_PROPERTIES_ERROR,
        VALUE_REQUIRED,
    },
    serde_json::Value,
};

const NAME_PATTERN: &str = "^(?!ga_|google_|firebase_)[A-Za-z][A-Za-z0-9_]*$";
const ALPHA_NUMERIC_OVERRIDE: &str = " may only contain alpha-numeric characters and underscores,start with an alphabetic character, and cannot contain google_, ga_, firebase_";
const CUSTOM_PARAMS_NAME: &str = "can have at most [10] custom params.";
const ITEM_INVALID_KEY_OVERRIDE: &str = "Item array has invalid key";
const ITEMS_FIELD_PATH: &str = "#/events/0/params/items";
const ONEOF_SCHEMA_ERROR: &str = "does not match any given oneof schema";
const ONEOF_OVERRIDE_CLIENT_ID: &str = "Measurement requires a client_id.";
const ONEOF_OVERRIDE_APP_INSTANCE_ID: &str = "Measurement requires an app_instance_id.";

pub const API_DOC_LIMITATIONS_URL: &str = "https://developers.google.com/analytics/devguides/collection/protocol/ga4/sending-events?hl=en&client_type=firebase#limitations";
pub const API_DOC_BASE_PAYLOAD_URL: &str =
    "https://developers.google.com/analytics/devguides/collection/protocol/ga4/reference#";
pub const API_DOC_EVENT_URL: &str =
    "https://developers.google.com/analytics/devguides/collection/protocol/ga4/reference/events#";
pub const API_DOC_GTAG_REQUIRED_URL: &str = "https://developers.google.com/analytics/devguides/collection/protocol/ga4/sending-events?client_type=gtag#required_parameters";
pub const API_DOC_USER_PROPERTIES_URL: &str = "https://developers.google.com/analytics/devguides/collection/protocol/ga4/user-properties?hl=en&client_type=firebase";
pub const API_DOC_SENDING_EVENTS_URL: &str = "https://developers.google.com/analytics/devguides/collection/protocol/ga4/sending-events?hl=en&client_type=firebase";
pub const API_DOC_JSON_POST_BODY_URL: &str = "https://developers.google.com/analytics/devguides/collection/protocol/ga4/reference?hl=en&client_type=firebase#payload_post_body";

/// Top level payload attributes documented on the base reference page.
pub const BASE_PAYLOAD_ATTRIBUTES: &[&str] = &[
    "app_instance_id",
    "api_secret",
    "firebase_app_id",
    "user_id",
    "timestamp_micros",
    "user_properties",
    "non_personalized_ads",
];

/// Rewrites descriptions and field paths, then attaches documentation to
/// every message. The order of `errors` is kept.
pub fn format_error_messages(
    errors: Vec<ValidationMessage>,
    payload: &Value,
    use_firebase: bool,
) -> Vec<ValidationMessage> {
    errors
        .into_iter()
        .map(|error| rewrite(error, use_firebase))
        .map(|mut error| {
            error.documentation = Some(documentation_for(&error, payload, use_firebase));
            error
        })
        .collect()
}

/// The single finding reported when the text payload is not valid JSON.
pub fn format_validation_message() -> Vec<ValidationMessage> {
    vec![ValidationMessage {
        field_path: "#".to_string(),
        description: "Fix formatting issue and re-validate payload".to_string(),
        validation_code: "format_invalid".to_string(),
        documentation: Some(API_DOC_JSON_POST_BODY_URL.to_string()),
    }]
}

fn rewrite(mut error: ValidationMessage, use_firebase: bool) -> ValidationMessage {
    if error.description.ends_with(CUSTOM_PARAMS_NAME) {
        error.description = ITEM_INVALID_KEY_OVERRIDE.to_string();
        error.validation_code = "value_invalid".to_string();
        error.field_path = ITEMS_FIELD_PATH.to_string();

        return error;
    }

    if let Some(subject) = strip_name_pattern_suffix(&error.description) {
        error.description = format!("{subject}{ALPHA_NUMERIC_OVERRIDE}");

        return error;
    }

    if error.description.ends_with(ONEOF_SCHEMA_ERROR) {
        let (description, field_path) = if use_firebase {
            (ONEOF_OVERRIDE_APP_INSTANCE_ID, "app_instance_id")
        } else {
            (ONEOF_OVERRIDE_CLIENT_ID, "client_id")
        };

        error.description = description.to_string();
        error.field_path = field_path.to_string();
        error.validation_code = VALUE_REQUIRED.to_string();

        return error;
    }

    if let Some(stripped) = error.field_path.get(2..) {
        if BASE_PAYLOAD_ATTRIBUTES.contains(&stripped) {
            error.field_path = stripped.to_string();
        }
    }

    error
}

/// The part of the description before the name pattern mismatch suffix.
/// Both quote styles show up depending on which validator produced the text.
fn strip_name_pattern_suffix(description: &str) -> Option<&str> {
    [
        format!("does not match '{NAME_PATTERN}'"),
        format!("does not match \"{NAME_PATTERN}\""),
    ]
    .iter()
    .find_map(|suffix| description.strip_suffix(suffix.as_str()))
}

fn documentation_for(error: &ValidationMessage, payload: &Value, use_firebase: bool) -> String {
    let code = error.validation_code.as_str();
    let path = error.field_path.as_str();

    if [MAX_LENGTH_ERROR, MAX_PROPERTIES_ERROR, MAX_ITEMS_ERROR, MAX_BODY_SIZE].contains(&code) {
        return API_DOC_LIMITATIONS_URL.to_string();
    }

    if path.starts_with("#/events/") {
        let name = payload
            .pointer("/events/0/name")
            .and_then(Value::as_str)
            .unwrap_or("");

        return format!("{API_DOC_EVENT_URL}{name}");
    }

    if !use_firebase && (path == "client_id" || path == "measurement_id") {
        return API_DOC_GTAG_REQUIRED_URL.to_string();
    }

    if BASE_PAYLOAD_ATTRIBUTES.contains(&path) {
        return format!("{API_DOC_BASE_PAYLOAD_URL}{path}");
    }

    if path.starts_with("#/user_properties") {
        return API_DOC_USER_PROPERTIES_URL.to_string();
    }

    API_DOC_SENDING_EVENTS_URL.to_string()
}

#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest, serde_json::json};

    fn format_one(error: ValidationMessage, use_firebase: bool) -> ValidationMessage {
        let payload = json!({"events": [{"name": "purchase"}]});

        format_error_messages(vec![error], &payload, use_firebase).remove(0)
    }

    #[test]
    fn test_custom_params_message_becomes_item_key_error() {
        let error = ValidationMessage::new(
            "#/events/0/params/items/0",
            "Item at index [0] can have at most [10] custom params.",
            "VALUE_INVALID",
        );

        let formatted = format_one(error, false);

        assert_eq!(formatted.description, "Item array has invalid key");
        assert_eq!(formatted.validation_code, "value_invalid");
        assert_eq!(formatted.field_path, "#/events/0/params/items");
        assert_eq!(
            formatted.documentation.as_deref(),
            Some(format!("{API_DOC_EVENT_URL}purchase").as_str())
        );
    }

    #[rstest]
    #[case("\"ga_name\" does not match \"^(?!ga_|google_|firebase_)[A-Za-z][A-Za-z0-9_]*$\"")]
    #[case("\"ga_name\" does not match '^(?!ga_|google_|firebase_)[A-Za-z][A-Za-z0-9_]*$'")]
    fn test_name_pattern_suffix_is_explained(#[case] description: &str) {
        let error = ValidationMessage::new("#/events/0/name", description, "pattern-error");

        let formatted = format_one(error, false);

        assert_eq!(
            formatted.description,
            format!("\"ga_name\" {ALPHA_NUMERIC_OVERRIDE}")
        );
    }

    #[rstest]
    #[case(true, "Measurement requires an app_instance_id.", "app_instance_id")]
    #[case(false, "Measurement requires a client_id.", "client_id")]
    fn test_oneof_message_depends_on_client_type(
        #[case] use_firebase: bool,
        #[case] description: &str,
        #[case] field_path: &str,
    ) {
        let error = ValidationMessage::new(
            "#",
            "{} does not match any given oneof schema",
            "schema-error",
        );

        let formatted = format_one(error, use_firebase);

        assert_eq!(formatted.description, description);
        assert_eq!(formatted.field_path, field_path);
        assert_eq!(formatted.validation_code, VALUE_REQUIRED);
    }

    #[test]
    fn test_base_attribute_path_is_stripped_and_anchored() {
        let error = ValidationMessage::new("#/timestamp_micros", "not an integer", "type-error");

        let formatted = format_one(error, true);

        assert_eq!(formatted.field_path, "timestamp_micros");
        assert_eq!(
            formatted.documentation.as_deref(),
            Some(format!("{API_DOC_BASE_PAYLOAD_URL}timestamp_micros").as_str())
        );
    }

    #[rstest]
    #[case("#/events/0/params/x", MAX_LENGTH_ERROR, false, API_DOC_LIMITATIONS_URL)]
    #[case("#", MAX_BODY_SIZE, false, API_DOC_LIMITATIONS_URL)]
    #[case("client_id", VALUE_REQUIRED, false, API_DOC_GTAG_REQUIRED_URL)]
    #[case("measurement_id", VALUE_REQUIRED, false, API_DOC_GTAG_REQUIRED_URL)]
    #[case("#/user_properties/tier", "pattern-error", false, API_DOC_USER_PROPERTIES_URL)]
    #[case("#", "format_invalid", false, API_DOC_SENDING_EVENTS_URL)]
    #[case("client_id", VALUE_REQUIRED, true, API_DOC_SENDING_EVENTS_URL)]
    fn test_documentation_links(
        #[case] field_path: &str,
        #[case] code: &str,
        #[case] use_firebase: bool,
        #[case] url: &str,
    ) {
        let formatted = format_one(ValidationMessage::new(field_path, "x", code), use_firebase);

        assert_eq!(formatted.documentation.as_deref(), Some(url));
    }

    #[test]
    fn test_event_doc_without_events() {
        let formatted = format_error_messages(
            vec![ValidationMessage::new("#/events/0/name", "x", "required-error")],
            &json!({}),
            false,
        );

        assert_eq!(
            formatted[0].documentation.as_deref(),
            Some(API_DOC_EVENT_URL)
        );
    }

    #[test]
    fn test_format_validation_message() {
        let messages = format_validation_message();

        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].field_path, "#");
        assert_eq!(messages[0].validation_code, "format_invalid");
        assert_eq!(
            messages[0].documentation.as_deref(),
            Some(API_DOC_JSON_POST_BODY_URL)
        );
    }
}
