use serde::{Deserialize, Serialize};

/// A single event, item or user property row as edited in the event form.
///
/// The value is kept as the raw text the user typed. Number parameters are
/// only coerced when the payload is assembled, see [crate::payload].
///
/// Names are expected to be unique within one list, which is up to the
/// caller to enforce.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Parameter {
    String {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<String>,
        #[serde(
            default,
            rename = "exampleValue",
            skip_serializing_if = "Option::is_none"
        )]
        example_value: Option<String>,
    },
    Number {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<String>,
        #[serde(
            default,
            rename = "exampleValue",
            skip_serializing_if = "Option::is_none"
        )]
        example_value: Option<f64>,
    },
}

impl Parameter {
    /// A string row with no value yet.
    pub fn string(name: impl Into<String>, example_value: Option<&str>) -> Self {
        Self::String {
            name: name.into(),
            value: None,
            example_value: example_value.map(str::to_string),
        }
    }

    /// A number row with no value yet.
    pub fn number(name: impl Into<String>, example_value: Option<f64>) -> Self {
        Self::Number {
            name: name.into(),
            value: None,
            example_value,
        }
    }

    /// Builder-style helper used mostly by tests and the link decoder.
    pub fn with_value(mut self, new_value: impl Into<String>) -> Self {
        self.set_value(new_value);
        self
    }

    pub fn name(&self) -> &str {
        match self {
            Self::String { name, .. } | Self::Number { name, .. } => name,
        }
    }

    pub fn value(&self) -> Option<&str> {
        match self {
            Self::String { value, .. } | Self::Number { value, .. } => value.as_deref(),
        }
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Self::Number { .. })
    }

    pub fn set_name(&mut self, new_name: impl Into<String>) {
        match self {
            Self::String { name, .. } | Self::Number { name, .. } => *name = new_name.into(),
        }
    }

    pub fn set_value(&mut self, new_value: impl Into<String>) {
        match self {
            Self::String { value, .. } | Self::Number { value, .. } => {
                *value = Some(new_value.into())
            }
        }
    }

    /// Same name, type and example value with the value cleared.
    pub fn blank_copy(&self) -> Self {
        match self {
            Self::String {
                name,
                example_value,
                ..
            } => Self::String {
                name: name.clone(),
                value: None,
                example_value: example_value.clone(),
            },
            Self::Number {
                name,
                example_value,
                ..
            } => Self::Number {
                name: name.clone(),
                value: None,
                example_value: *example_value,
            },
        }
    }
}

/// One entry of an e-commerce `items` array. Each item owns its own list of
/// parameters.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Item {
    pub parameters: Vec<Parameter>,
}

impl Item {
    pub fn new(parameters: Vec<Parameter>) -> Self {
        Self { parameters }
    }

    /// A new item shaped like `template`: every row keeps its name, type and
    /// example value but starts out empty.
    pub fn templated_from(template: &Item) -> Self {
        Self {
            parameters: template.parameters.iter().map(Parameter::blank_copy).collect(),
        }
    }
}
