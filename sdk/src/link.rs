//! Sharable event links.
//!
//! An [EventState] is spread over single letter query parameters so a link
//! can be pasted into a chat and reopened elsewhere. Two encodings exist:
//!
//! - version 1 (no `p` parameter or `p=1`): the event type and parameters
//!   travel together in `g` as standard base64 JSON, user properties in `m`,
//! - version 2 (`p=2`): every list has its own key and is encoded as URL
//!   safe base64 JSON without padding.
//!
//! Encoding always produces version 2. Decoding branches on `p`.

use {
    crate::{
        error::MpError,
        event::{EventState, EventType},
        parameter::{Item, Parameter},
    },
    base64::{
        engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD},
        Engine as _,
    },
    serde::{de::DeserializeOwned, Deserialize, Serialize},
    std::{collections::HashMap, str::FromStr},
    url::Url,
};

/// Where links point to unless configured otherwise.
pub const DEFAULT_LINK_BASE_URL: &str = "https://ga-dev-tools.google/ga4/event-builder/";

/// Version written by [encode_sharable_link].
pub const LINK_VERSION: u8 = 2;

/// Query parameter keys.
pub mod key {
    pub const PARAMETERS: &str = "a";
    pub const ITEMS: &str = "b";
    pub const EVENT_TYPE: &str = "c";
    pub const USE_FIREBASE: &str = "d";
    pub const TIMESTAMP_MICROS: &str = "e";
    pub const NON_PERSONALIZED_ADS: &str = "f";
    pub const EVENT_DATA: &str = "g";
    pub const FIREBASE_APP_ID: &str = "h";
    pub const MEASUREMENT_ID: &str = "i";
    pub const EVENT_NAME: &str = "j";
    pub const API_SECRET: &str = "k";
    pub const USER_ID: &str = "l";
    pub const USER_PROPERTIES: &str = "m";
    pub const CLIENT_ID: &str = "n";
    pub const APP_INSTANCE_ID: &str = "o";
    pub const VERSION: &str = "p";
}

/// Event type and parameters as carried by version 1 links.
#[derive(Serialize, Deserialize)]
struct EventData {
    #[serde(rename = "type")]
    event_type: String,
    #[serde(default)]
    parameters: Option<Vec<Parameter>>,
}

/// Builds a version 2 link to `base_url` that reproduces `state`.
pub fn encode_sharable_link(base_url: &str, state: &EventState) -> Result<Url, MpError> {
    let mut url = Url::parse(base_url)?;

    {
        let mut pairs = url.query_pairs_mut();
        let mut append = |key: &str, value: &str| {
            if !value.is_empty() {
                pairs.append_pair(key, value);
            }
        };

        append(key::VERSION, &LINK_VERSION.to_string());
        append(key::EVENT_TYPE, state.event_type.as_ref());

        if state.event_type == EventType::CustomEvent {
            append(key::EVENT_NAME, &state.event_name);
        }

        if state.use_firebase {
            append(key::USE_FIREBASE, "1");
        }

        if !state.parameters.is_empty() {
            append(key::PARAMETERS, &encode_json(&state.parameters)?);
        }

        if let Some(items) = &state.items {
            append(key::ITEMS, &encode_json(items)?);
        }

        if !state.user_properties.is_empty() {
            append(key::USER_PROPERTIES, &encode_json(&state.user_properties)?);
        }

        let ids = &state.client_ids;
        let instance = &state.instance_id;

        for (name, value) in [
            (key::CLIENT_ID, &ids.client_id),
            (key::APP_INSTANCE_ID, &ids.app_instance_id),
            (key::USER_ID, &ids.user_id),
            (key::MEASUREMENT_ID, &instance.measurement_id),
            (key::FIREBASE_APP_ID, &instance.firebase_app_id),
            (key::TIMESTAMP_MICROS, &state.timestamp_micros),
        ] {
            append(name, value.as_deref().unwrap_or_default());
        }

        append(key::API_SECRET, &state.api_secret);

        if let Some(non_personalized_ads) = state.non_personalized_ads {
            append(
                key::NON_PERSONALIZED_ADS,
                if non_personalized_ads { "1" } else { "0" },
            );
        }
    }

    Ok(url)
}

/// Restores the event state carried by `url`.
pub fn decode_sharable_link(url: &Url) -> Result<EventState, MpError> {
    let params = url.query_pairs().into_owned().collect::<HashMap<_, _>>();

    let mut state = match params.get(key::VERSION).map(String::as_str) {
        None | Some("1") => decode_v1(&params)?,
        Some("2") => decode_v2(&params)?,
        Some(other) => {
            return Err(MpError::Link(format!("Unsupported link version '{other}'")))
        }
    };

    let text = |key: &str| params.get(key).filter(|v| !v.is_empty()).cloned();

    state.use_firebase = params.get(key::USE_FIREBASE).is_some_and(|v| is_truthy(v));
    state.client_ids.client_id = text(key::CLIENT_ID);
    state.client_ids.app_instance_id = text(key::APP_INSTANCE_ID);
    state.client_ids.user_id = text(key::USER_ID);
    state.instance_id.measurement_id = text(key::MEASUREMENT_ID);
    state.instance_id.firebase_app_id = text(key::FIREBASE_APP_ID);
    state.api_secret = text(key::API_SECRET).unwrap_or_default();
    state.timestamp_micros = text(key::TIMESTAMP_MICROS);
    state.non_personalized_ads = params.get(key::NON_PERSONALIZED_ADS).map(|v| is_truthy(v));

    Ok(state)
}

fn decode_v1(params: &HashMap<String, String>) -> Result<EventState, MpError> {
    let mut state = match params.get(key::EVENT_DATA) {
        Some(data) => {
            let data: EventData = serde_json::from_slice(&STANDARD.decode(data)?)?;
            let mut state = EventState::for_type(parse_event_type(&data.event_type)?);

            if let Some(parameters) = data.parameters {
                state.parameters = parameters;
            }

            state
        }
        None => EventState::default(),
    };

    apply_custom_name(&mut state, params);

    if let Some(encoded) = params.get(key::USER_PROPERTIES) {
        state.user_properties = serde_json::from_slice(&STANDARD.decode(encoded)?)?;
    }

    Ok(state)
}

fn decode_v2(params: &HashMap<String, String>) -> Result<EventState, MpError> {
    let event_type = params
        .get(key::EVENT_TYPE)
        .map(|t| parse_event_type(t))
        .transpose()?
        .unwrap_or_default();

    let mut state = EventState::for_type(event_type);

    apply_custom_name(&mut state, params);

    state.parameters = decode_json::<Vec<Parameter>>(params.get(key::PARAMETERS))?.unwrap_or_default();
    state.items = decode_json::<Vec<Item>>(params.get(key::ITEMS))?;
    state.user_properties =
        decode_json::<Vec<Parameter>>(params.get(key::USER_PROPERTIES))?.unwrap_or_default();

    Ok(state)
}

fn apply_custom_name(state: &mut EventState, params: &HashMap<String, String>) {
    if state.event_type != EventType::CustomEvent {
        return;
    }

    if let Some(name) = params.get(key::EVENT_NAME) {
        state.event_name = name.clone();
    }
}

fn parse_event_type(raw: &str) -> Result<EventType, MpError> {
    EventType::from_str(raw).map_err(|_| MpError::Link(format!("Unknown event type '{raw}'")))
}

fn is_truthy(raw: &str) -> bool {
    matches!(raw, "1" | "true")
}

fn encode_json<T: Serialize + ?Sized>(value: &T) -> Result<String, MpError> {
    Ok(URL_SAFE_NO_PAD.encode(serde_json::to_vec(value)?))
}

fn decode_json<T: DeserializeOwned>(encoded: Option<&String>) -> Result<Option<T>, MpError> {
    encoded
        .map(|encoded| -> Result<T, MpError> {
            Ok(serde_json::from_slice(&URL_SAFE_NO_PAD.decode(encoded)?)?)
        })
        .transpose()
}
