//! Semantic checks on a payload that the base content schema cannot express.
//!
//! Every check is independent and returns zero or more findings. The final
//! list keeps the fixed check order so results read the same way each run.

use {
    crate::{
        ids::{non_empty, InstanceId},
        message::{ValidationMessage, FORMAT_CHECK_ERROR, MAX_BODY_SIZE, VALUE_REQUIRED},
    },
    lazy_regex::regex_is_match,
    serde_json::{Map, Value},
};

pub const RESERVED_EVENT_NAMES: &[&str] = &[
    "ad_activeview",
    "ad_click",
    "ad_exposure",
    "ad_impression",
    "ad_query",
    "adunit_exposure",
    "app_clear_data",
    "app_install",
    "app_update",
    "app_remove",
    "error",
    "first_open",
    "first_visit",
    "in_app_purchase",
    "notification_dismiss",
    "notification_foreground",
    "notification_open",
    "notification_receive",
    "os_update",
    "screen_view",
    "session_start",
    "user_engagement",
];

pub const RESERVED_USER_PROPERTY_NAMES: &[&str] = &[
    "first_open_time",
    "first_visit_time",
    "last_deep_link_referrer",
    "user_id",
    "first_open_after_install",
];

/// Recommended events that are meaningless without at least one item.
pub const EVENTS_REQUIRING_ITEMS: &[&str] = &[
    "add_payment_info",
    "add_shipping_info",
    "add_to_cart",
    "add_to_wishlist",
    "begin_checkout",
    "purchase",
    "remove_from_cart",
    "select_item",
    "view_cart",
    "view_item",
    "view_item_list",
];

/// Maximum size of a serialized request body.
pub const MAX_PAYLOAD_SIZE_BYTES: usize = 130_000;

/// Runs every business rule against `payload` and concatenates the findings.
pub fn format_check(
    payload: &Value,
    instance_id: &InstanceId,
    api_secret: &str,
    use_firebase: bool,
) -> Vec<ValidationMessage> {
    let events = events_of(payload);

    [
        client_identity_errors(payload, use_firebase),
        reserved_event_name_errors(&events),
        reserved_user_property_errors(payload),
        currency_errors(&events),
        empty_items_errors(&events),
        item_key_errors(&events),
        instance_id_errors(instance_id, use_firebase),
        api_secret_errors(api_secret),
        payload_size_errors(payload),
    ]
    .into_iter()
    .flatten()
    .collect()
}

/// Events with their index. Anything that is not an object is skipped, the
/// schema validator reports those.
fn events_of(payload: &Value) -> Vec<(usize, &Map<String, Value>)> {
    payload
        .get("events")
        .and_then(Value::as_array)
        .map(|events| {
            events
                .iter()
                .enumerate()
                .filter_map(|(idx, event)| event.as_object().map(|event| (idx, event)))
                .collect()
        })
        .unwrap_or_default()
}

fn params_of(event: &Map<String, Value>) -> Option<&Map<String, Value>> {
    event.get("params").and_then(Value::as_object)
}

fn client_identity_errors(payload: &Value, use_firebase: bool) -> Vec<ValidationMessage> {
    if !use_firebase {
        let client_id = payload.get("client_id").and_then(Value::as_str).unwrap_or("");

        if client_id.is_empty() {
            return vec![ValidationMessage::new(
                "client_id",
                "Measurement requires a client_id.",
                VALUE_REQUIRED,
            )];
        }

        return vec![];
    }

    let app_instance_id = payload
        .get("app_instance_id")
        .and_then(Value::as_str)
        .unwrap_or("");
    let mut errors = vec![];
    let length = app_instance_id.chars().count();

    if length != 32 {
        errors.push(ValidationMessage::new(
            "app_instance_id",
            format!(
                "Measurement app_instance_id is expected to be a 32 digit hexadecimal number but was [{length}] digits."
            ),
            FORMAT_CHECK_ERROR,
        ));
    }

    if let Some(offending) = app_instance_id.chars().find(|c| !c.is_ascii_hexdigit()) {
        errors.push(ValidationMessage::new(
            "app_instance_id",
            format!("Measurement app_instance_id contains non hexadecimal character [{offending}]."),
            FORMAT_CHECK_ERROR,
        ));
    }

    errors
}

fn reserved_event_name_errors(events: &[(usize, &Map<String, Value>)]) -> Vec<ValidationMessage> {
    events
        .iter()
        .filter_map(|(idx, event)| {
            let name = event.get("name").and_then(Value::as_str)?;

            RESERVED_EVENT_NAMES.contains(&name).then(|| {
                ValidationMessage::new(
                    format!("#/events/{idx}/name"),
                    format!("{name} is a reserved event name"),
                    FORMAT_CHECK_ERROR,
                )
            })
        })
        .collect()
}

fn reserved_user_property_errors(payload: &Value) -> Vec<ValidationMessage> {
    let Some(user_properties) = payload.get("user_properties").and_then(Value::as_object) else {
        return vec![];
    };

    user_properties
        .keys()
        .filter(|name| RESERVED_USER_PROPERTY_NAMES.contains(&name.as_str()))
        .map(|name| {
            ValidationMessage::new(
                format!("#/user_properties/{name}"),
                format!("user_property: {name} is a reserved user property name"),
                FORMAT_CHECK_ERROR,
            )
        })
        .collect()
}

fn currency_errors(events: &[(usize, &Map<String, Value>)]) -> Vec<ValidationMessage> {
    events
        .iter()
        .filter_map(|(idx, event)| {
            let currency = params_of(event)?.get("currency")?;

            let valid = currency
                .as_str()
                .is_some_and(|code| regex_is_match!(r"^[A-Z]{3}$", code));

            if valid {
                return None;
            }

            let shown = match currency {
                Value::String(code) => code.clone(),
                other => other.to_string(),
            };

            Some(ValidationMessage::new(
                format!("#/events/{idx}/params/currency"),
                format!("currency: {shown} must be a valid uppercase 3-letter ISO 4217 format"),
                FORMAT_CHECK_ERROR,
            ))
        })
        .collect()
}

fn items_of(event: &Map<String, Value>) -> Option<&Vec<Value>> {
    params_of(event)?.get("items")?.as_array()
}

fn empty_items_errors(events: &[(usize, &Map<String, Value>)]) -> Vec<ValidationMessage> {
    events
        .iter()
        .filter_map(|(idx, event)| {
            let items = items_of(event)?;
            let name = event.get("name").and_then(Value::as_str).unwrap_or("");

            (items.is_empty() && EVENTS_REQUIRING_ITEMS.contains(&name)).then(|| {
                ValidationMessage::new(
                    format!("#/events/{idx}/params/items"),
                    "'items' should not be empty; One of 'item_id' or 'item_name' is a required key",
                    FORMAT_CHECK_ERROR,
                )
            })
        })
        .collect()
}

/// Only the first item is inspected.
fn item_key_errors(events: &[(usize, &Map<String, Value>)]) -> Vec<ValidationMessage> {
    events
        .iter()
        .filter_map(|(idx, event)| {
            let first = items_of(event)?.first()?;

            let has_key = |key: &str| match first.get(key) {
                Some(Value::String(value)) => !value.is_empty(),
                Some(Value::Null) | None => false,
                Some(_) => true,
            };

            (!has_key("item_id") && !has_key("item_name")).then(|| {
                ValidationMessage::new(
                    format!("#/events/{idx}/params/items/0"),
                    "'items' object must contain one of the following keys: 'item_id' or 'item_name'",
                    FORMAT_CHECK_ERROR,
                )
            })
        })
        .collect()
}

fn instance_id_errors(instance_id: &InstanceId, use_firebase: bool) -> Vec<ValidationMessage> {
    if use_firebase {
        return match non_empty(&instance_id.firebase_app_id) {
            Some(id) if !regex_is_match!(r"^[0-9]:[0-9]+:[a-zA-Z]+:[a-zA-Z0-9]+$", id) => {
                vec![ValidationMessage::new(
                    "firebase_app_id",
                    format!("{id} does not follow firebase_app_id pattern of X:XX:XX:XX at path"),
                    FORMAT_CHECK_ERROR,
                )]
            }
            _ => vec![],
        };
    }

    match non_empty(&instance_id.measurement_id) {
        Some(_) => vec![],
        None => vec![ValidationMessage::new(
            "measurement_id",
            "Measurement requires a measurement_id.",
            VALUE_REQUIRED,
        )],
    }
}

fn api_secret_errors(api_secret: &str) -> Vec<ValidationMessage> {
    if api_secret.is_empty() {
        vec![ValidationMessage::new(
            "api_secret",
            "Measurement requires an api_secret.",
            VALUE_REQUIRED,
        )]
    } else {
        vec![]
    }
}

fn payload_size_errors(payload: &Value) -> Vec<ValidationMessage> {
    let size = serde_json::to_vec(payload).map(|bytes| bytes.len()).unwrap_or(0);

    if size > MAX_PAYLOAD_SIZE_BYTES {
        vec![ValidationMessage::new(
            "#",
            format!(
                "Measurement payload is [{size}] bytes which exceeds the maximum size of [{MAX_PAYLOAD_SIZE_BYTES}] bytes."
            ),
            MAX_BODY_SIZE,
        )]
    } else {
        vec![]
    }
}

#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest, serde_json::json};

    const FIREBASE_APP_ID: &str = "1:1233455666:android:abcdefgh";

    fn firebase_check(payload: Value) -> Vec<ValidationMessage> {
        format_check(
            &payload,
            &InstanceId::firebase(FIREBASE_APP_ID),
            "secret",
            true,
        )
    }

    fn web_check(payload: Value) -> Vec<ValidationMessage> {
        format_check(&payload, &InstanceId::web("G-XXXXXXX"), "secret", false)
    }

    fn descriptions(errors: &[ValidationMessage]) -> Vec<&str> {
        errors.iter().map(|e| e.description.as_str()).collect()
    }

    #[test]
    fn test_valid_firebase_payload_has_no_errors() {
        let errors = format_check(
            &json!({"app_instance_id": "12345678901234567890123456789012"}),
            &InstanceId::firebase("1:123:android:abc"),
            "secret",
            true,
        );

        assert_eq!(errors, vec![]);
    }

    #[test]
    fn test_app_instance_id_length() {
        let errors = firebase_check(json!({"app_instance_id": "123"}));

        assert_eq!(
            errors[0].description,
            "Measurement app_instance_id is expected to be a 32 digit hexadecimal number but was [3] digits."
        );
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_app_instance_id_non_hex_character() {
        let errors = firebase_check(json!({"app_instance_id": "1234567890123456789012345678901g"}));

        assert_eq!(
            descriptions(&errors),
            vec!["Measurement app_instance_id contains non hexadecimal character [g]."]
        );
    }

    #[test]
    fn test_app_instance_id_both_errors() {
        let errors = firebase_check(json!({"app_instance_id": "xyz"}));

        assert_eq!(errors.len(), 2);
        assert!(errors[1].description.ends_with("[x]."));
    }

    #[test]
    fn test_missing_app_instance_id() {
        let errors = firebase_check(json!({}));

        assert!(errors[0].description.ends_with("but was [0] digits."));
    }

    #[test]
    fn test_missing_client_id() {
        let errors = format_check(
            &json!({"client_id": ""}),
            &InstanceId::web("x"),
            "secret",
            false,
        );

        assert_eq!(errors[0].description, "Measurement requires a client_id.");
        assert_eq!(errors.len(), 1);
    }

    #[rstest]
    #[case("ad_click")]
    #[case("session_start")]
    #[case("screen_view")]
    #[case("first_open")]
    fn test_reserved_event_names(#[case] name: &str) {
        let errors = web_check(json!({"client_id": "1", "events": [{"name": name}]}));

        assert_eq!(
            descriptions(&errors),
            vec![format!("{name} is a reserved event name")]
        );
        assert_eq!(errors[0].field_path, "#/events/0/name");
    }

    #[test]
    fn test_reserved_event_name_regardless_of_other_fields() {
        let errors = format_check(
            &json!({"events": [{"name": "ad_click"}]}),
            &InstanceId::default(),
            "",
            false,
        );

        assert!(descriptions(&errors).contains(&"ad_click is a reserved event name"));
    }

    #[test]
    fn test_valid_event_name() {
        let errors = web_check(json!({"client_id": "1", "events": [{"name": "add_payment_info"}]}));

        assert!(errors.is_empty());
    }

    #[test]
    fn test_reserved_user_property() {
        let errors = web_check(json!({
            "client_id": "1",
            "user_properties": {"first_open_time": {"value": "x"}, "tier": {"value": "gold"}}
        }));

        assert_eq!(
            descriptions(&errors),
            vec!["user_property: first_open_time is a reserved user property name"]
        );
    }

    #[rstest]
    #[case(json!("USD"), true)]
    #[case(json!("usd"), false)]
    #[case(json!("USDD"), false)]
    #[case(json!("US"), false)]
    #[case(json!(840), false)]
    fn test_currency(#[case] currency: Value, #[case] valid: bool) {
        let errors = web_check(json!({
            "client_id": "1",
            "events": [{"name": "generate_lead", "params": {"currency": currency}}]
        }));

        assert_eq!(errors.is_empty(), valid);
        if !valid {
            assert!(errors[0].description.starts_with("currency: "));
            assert_eq!(errors[0].field_path, "#/events/0/params/currency");
        }
    }

    #[test]
    fn test_empty_items_for_item_event() {
        let errors = web_check(json!({
            "client_id": "1",
            "events": [{"name": "purchase", "params": {"items": []}}]
        }));

        assert_eq!(
            descriptions(&errors),
            vec!["'items' should not be empty; One of 'item_id' or 'item_name' is a required key"]
        );
    }

    #[test]
    fn test_empty_items_for_custom_event_is_fine() {
        let errors = web_check(json!({
            "client_id": "1",
            "events": [{"name": "my_event", "params": {"items": []}}]
        }));

        assert!(errors.is_empty());
    }

    #[rstest]
    #[case(json!([{"item_id": 1234}]), true)]
    #[case(json!([{"item_name": "jeggings"}]), true)]
    #[case(json!([{"item_namee": "test"}]), false)]
    #[case(json!([{"item_id": "", "item_name": ""}]), false)]
    // Only the first item is inspected.
    #[case(json!([{"item_id": "1"}, {"price": 3}]), true)]
    fn test_item_required_key(#[case] items: Value, #[case] valid: bool) {
        let errors = web_check(json!({
            "client_id": "1",
            "events": [{"name": "my_event", "params": {"items": items}}]
        }));

        assert_eq!(errors.is_empty(), valid);
        if !valid {
            assert_eq!(
                errors[0].description,
                "'items' object must contain one of the following keys: 'item_id' or 'item_name'"
            );
        }
    }

    #[rstest]
    #[case("1:1233455666:android:abcdefgh", true)]
    #[case("1:123:ios:abc123", true)]
    #[case("1233455666:android:abcdefgh", false)]
    #[case("1:abc:android:abc", false)]
    fn test_firebase_app_id_pattern(#[case] firebase_app_id: &str, #[case] valid: bool) {
        let errors = format_check(
            &json!({"app_instance_id": "0123456789abcdef0123456789ABCDEF"}),
            &InstanceId::firebase(firebase_app_id),
            "secret",
            true,
        );

        assert_eq!(errors.is_empty(), valid);
        if !valid {
            assert_eq!(
                errors[0].description,
                format!("{firebase_app_id} does not follow firebase_app_id pattern of X:XX:XX:XX at path")
            );
        }
    }

    #[test]
    fn test_missing_measurement_id_and_secret() {
        let errors = format_check(
            &json!({"client_id": "1"}),
            &InstanceId::default(),
            "",
            false,
        );

        assert_eq!(
            descriptions(&errors),
            vec![
                "Measurement requires a measurement_id.",
                "Measurement requires an api_secret."
            ]
        );
    }

    #[test]
    fn test_oversized_payload() {
        let errors = web_check(json!({
            "client_id": "1",
            "events": [{"name": "my_event", "params": {"blob": "x".repeat(MAX_PAYLOAD_SIZE_BYTES)}}]
        }));

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].validation_code, MAX_BODY_SIZE);
    }

    #[test]
    fn test_findings_keep_check_order() {
        let errors = format_check(
            &json!({
                "events": [{"name": "ad_click", "params": {"currency": "usd"}}]
            }),
            &InstanceId::default(),
            "",
            false,
        );

        assert_eq!(
            errors.iter().map(|e| e.field_path.as_str()).collect::<Vec<_>>(),
            vec![
                "client_id",
                "#/events/0/name",
                "#/events/0/params/currency",
                "measurement_id",
                "api_secret"
            ]
        );
    }
}
