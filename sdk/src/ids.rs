use serde::{Deserialize, Serialize};

/// Identifies the GA4 property (web) or Firebase app (mobile) that a payload
/// targets. Exactly one of the two is expected to be set for a given client
/// type.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceId {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub measurement_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub firebase_app_id: Option<String>,
}

impl InstanceId {
    pub fn web(measurement_id: impl Into<String>) -> Self {
        Self {
            measurement_id: Some(measurement_id.into()),
            firebase_app_id: None,
        }
    }

    pub fn firebase(firebase_app_id: impl Into<String>) -> Self {
        Self {
            measurement_id: None,
            firebase_app_id: Some(firebase_app_id.into()),
        }
    }

    /// The query parameter selecting the instance on the collect endpoints.
    /// `firebase_app_id` wins when both are set; `None` when neither is.
    pub fn query_pair(&self) -> Option<(&'static str, &str)> {
        match (non_empty(&self.firebase_app_id), non_empty(&self.measurement_id)) {
            (Some(id), _) => Some(("firebase_app_id", id)),
            (None, Some(id)) => Some(("measurement_id", id)),
            (None, None) => None,
        }
    }
}

/// Client identifiers held by the event form. Only the identifier matching
/// the client type makes it into the payload.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientIds {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_instance_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

pub(crate) fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_pair_prefers_firebase() {
        let both = InstanceId {
            measurement_id: Some("G-XXXX".to_string()),
            firebase_app_id: Some("1:1:android:a".to_string()),
        };

        assert_eq!(both.query_pair(), Some(("firebase_app_id", "1:1:android:a")));
        assert_eq!(
            InstanceId::web("G-XXXX").query_pair(),
            Some(("measurement_id", "G-XXXX"))
        );
        assert_eq!(InstanceId::web("").query_pair(), None);
        assert_eq!(InstanceId::default().query_pair(), None);
    }
}
