//! Turns the form inputs of an event into the JSON body the Measurement
//! Protocol expects.
//!
//! Assembly goes through a typed intermediate [Payload] first so that the
//! rules about which rows make it into the body live in one place:
//!
//! - rows with an empty name or an empty value are dropped,
//! - number rows are coerced like JavaScript `parseFloat` and dropped when
//!   they have no finite numeric prefix,
//! - items that end up empty are removed from the `items` array,
//! - empty objects, empty strings and empty keys never reach the output.

use {
    crate::{
        ids::{non_empty, ClientIds},
        parameter::{Item, Parameter},
    },
    lazy_regex::regex,
    serde_json::{Map, Number, Value},
};

/// Borrowed inputs of the assembler, usually obtained through
/// [crate::EventState::payload_input].
#[derive(Clone, Copy, Debug)]
pub struct PayloadInput<'a> {
    pub use_firebase: bool,
    pub event_name: &'a str,
    pub parameters: &'a [Parameter],
    pub items: Option<&'a [Item]>,
    pub user_properties: &'a [Parameter],
    pub client_ids: &'a ClientIds,
    pub timestamp_micros: Option<&'a str>,
    pub non_personalized_ads: Option<bool>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ParamValue {
    Text(String),
    Number(f64),
}

impl ParamValue {
    fn to_value(&self) -> Value {
        match self {
            Self::Text(text) => Value::String(text.clone()),
            Self::Number(number) => number_value(*number),
        }
    }
}

/// Which identifier shape the payload carries. Never both.
#[derive(Clone, Debug, PartialEq)]
pub enum ClientIdentity {
    Web { client_id: Option<String> },
    Firebase { app_instance_id: Option<String> },
}

#[derive(Clone, Debug, PartialEq)]
pub enum Timestamp {
    Micros(u64),
    /// Unparseable input is kept verbatim so schema validation can flag it.
    Raw(String),
}

pub type Fields = Vec<(String, ParamValue)>;

#[derive(Clone, Debug, PartialEq)]
pub struct EventPayload {
    pub name: String,
    pub params: Fields,
    /// `None` when the event has no items parameter at all.
    pub items: Option<Vec<Fields>>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Payload {
    pub client: ClientIdentity,
    pub user_id: Option<String>,
    pub timestamp_micros: Option<Timestamp>,
    pub non_personalized_ads: Option<bool>,
    pub user_properties: Fields,
    pub events: Vec<EventPayload>,
}

/// Builds the typed payload. Pure function of its input.
pub fn assemble(input: &PayloadInput<'_>) -> Payload {
    let client = if input.use_firebase {
        ClientIdentity::Firebase {
            app_instance_id: non_empty(&input.client_ids.app_instance_id).map(str::to_string),
        }
    } else {
        ClientIdentity::Web {
            client_id: non_empty(&input.client_ids.client_id).map(str::to_string),
        }
    };

    let items = input.items.map(|items| {
        items
            .iter()
            .map(|item| reduce_parameters(&item.parameters))
            .filter(|fields| !fields.is_empty())
            .collect()
    });

    let timestamp_micros = input
        .timestamp_micros
        .filter(|raw| !raw.is_empty())
        .map(|raw| match raw.trim().parse::<u64>() {
            Ok(micros) => Timestamp::Micros(micros),
            Err(_) => Timestamp::Raw(raw.to_string()),
        });

    Payload {
        client,
        user_id: non_empty(&input.client_ids.user_id).map(str::to_string),
        timestamp_micros,
        non_personalized_ads: input.non_personalized_ads,
        user_properties: reduce_parameters(input.user_properties),
        events: vec![EventPayload {
            name: input.event_name.to_string(),
            params: reduce_parameters(input.parameters),
            items,
        }],
    }
}

/// Shorthand for `assemble(input).to_value()`.
pub fn assemble_payload(input: &PayloadInput<'_>) -> Value {
    assemble(input).to_value()
}

impl Payload {
    /// Serializes into the exact JSON body, with empty values stripped.
    pub fn to_value(&self) -> Value {
        let mut body = Map::new();

        match &self.client {
            ClientIdentity::Web { client_id } => {
                insert_opt_string(&mut body, "client_id", client_id);
            }
            ClientIdentity::Firebase { app_instance_id } => {
                insert_opt_string(&mut body, "app_instance_id", app_instance_id);
            }
        }

        insert_opt_string(&mut body, "user_id", &self.user_id);

        match &self.timestamp_micros {
            Some(Timestamp::Micros(micros)) => {
                body.insert("timestamp_micros".to_string(), Value::from(*micros));
            }
            Some(Timestamp::Raw(raw)) => {
                body.insert("timestamp_micros".to_string(), Value::String(raw.clone()));
            }
            None => (),
        }

        if let Some(npa) = self.non_personalized_ads {
            body.insert("non_personalized_ads".to_string(), Value::Bool(npa));
        }

        let user_properties = self
            .user_properties
            .iter()
            .map(|(name, value)| {
                let mut wrapped = Map::new();
                wrapped.insert("value".to_string(), value.to_value());

                (name.clone(), Value::Object(wrapped))
            })
            .collect::<Map<_, _>>();

        body.insert("user_properties".to_string(), Value::Object(user_properties));

        let events = self
            .events
            .iter()
            .map(|event| {
                let mut params = fields_to_map(&event.params);

                if let Some(items) = &event.items {
                    let items = items
                        .iter()
                        .map(|fields| Value::Object(fields_to_map(fields)))
                        .collect();

                    params.insert("items".to_string(), Value::Array(items));
                }

                let mut object = Map::new();
                object.insert("name".to_string(), Value::String(event.name.clone()));
                object.insert("params".to_string(), Value::Object(params));

                Value::Object(object)
            })
            .collect();

        body.insert("events".to_string(), Value::Array(events));

        strip_empty(Value::Object(body))
    }
}

/// Reduces a list of rows to `(name, value)` pairs, dropping rows without a
/// usable name or value.
fn reduce_parameters(parameters: &[Parameter]) -> Fields {
    parameters
        .iter()
        .filter(|param| !param.name().is_empty())
        .filter_map(|param| {
            let raw = param.value().filter(|value| !value.is_empty())?;

            let value = if param.is_number() {
                ParamValue::Number(parse_float(raw)?)
            } else {
                ParamValue::Text(raw.to_string())
            };

            Some((param.name().to_string(), value))
        })
        .collect()
}

/// JavaScript `parseFloat` semantics: leading whitespace is skipped and the
/// longest numeric prefix is parsed. Returns `None` where JavaScript would
/// produce `NaN`, and for infinities.
pub fn parse_float(raw: &str) -> Option<f64> {
    let trimmed = raw.trim_start();
    let prefix = regex!(r"^[+-]?(?:[0-9]+\.?[0-9]*|\.[0-9]+)(?:[eE][+-]?[0-9]+)?")
        .find(trimmed)?
        .as_str();

    prefix.parse::<f64>().ok().filter(|number| number.is_finite())
}

/// Integral values are written as JSON integers, matching how JavaScript
/// serializes them.
fn number_value(number: f64) -> Value {
    const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

    if number.fract() == 0.0 && number.abs() <= MAX_SAFE_INTEGER {
        Value::from(number as i64)
    } else {
        Number::from_f64(number).map(Value::Number).unwrap_or(Value::Null)
    }
}

fn fields_to_map(fields: &Fields) -> Map<String, Value> {
    fields
        .iter()
        .map(|(name, value)| (name.clone(), value.to_value()))
        .collect()
}

fn insert_opt_string(body: &mut Map<String, Value>, key: &str, value: &Option<String>) {
    if let Some(value) = value {
        body.insert(key.to_string(), Value::String(value.clone()));
    }
}

/// Removes empty keys, `null`s, empty strings and empty objects from every
/// object in the tree. Array elements are kept as they are, only their
/// contents are cleaned.
pub fn strip_empty(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(key, _)| !key.is_empty())
                .map(|(key, value)| (key, strip_empty(value)))
                .filter(|(_, value)| !is_empty_value(value))
                .collect(),
        ),
        Value::Array(values) => Value::Array(values.into_iter().map(strip_empty).collect()),
        other => other,
    }
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}
