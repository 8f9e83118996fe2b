use {
    crate::{error::MpError, ids::InstanceId, message::ValidationMessage},
    log::debug,
    reqwest::Client,
    serde::Deserialize,
    serde_json::Value,
    std::time::Duration,
};

/// Default Measurement Protocol host.
pub const GA_BASE_URL: &str = "https://www.google-analytics.com";
/// Path of the endpoint that records hits.
pub const COLLECT_PATH: &str = "/mp/collect";
/// Path of the endpoint that only returns validation diagnostics.
pub const DEBUG_COLLECT_PATH: &str = "/debug/mp/collect";
/// Default per request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const VALIDATION_BEHAVIOR: (&str, &str) = ("validationBehavior", "ENFORCE_RECOMMENDATIONS");

/// Builder for MpClient configuration
pub struct MpClientBuilder {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl Default for MpClientBuilder {
    fn default() -> Self {
        Self {
            client: Client::new(),
            base_url: GA_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl MpClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a custom HTTP client
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    /// Set a custom base URL, mostly useful for pointing at a mock server.
    /// A trailing slash is ignored.
    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> MpClient {
        MpClient {
            client: self.client,
            base_url: self.base_url,
            timeout: self.timeout,
        }
    }
}

/// Client for the Measurement Protocol collect and debug collect endpoints.
#[derive(Clone, Debug)]
pub struct MpClient {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl Default for MpClient {
    fn default() -> Self {
        MpClientBuilder::default().build()
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DebugResponse {
    #[serde(default)]
    validation_messages: Vec<ValidationMessage>,
}

impl MpClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> MpClientBuilder {
        MpClientBuilder::default()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Ask the debug endpoint to validate `payload`.
    ///
    /// # Returns
    /// * `Result<Vec<ValidationMessage>, MpError>` - Messages reported by the
    ///   endpoint, empty when the hit is valid
    pub async fn validate_hit(
        &self,
        payload: &Value,
        instance_id: &InstanceId,
        api_secret: &str,
    ) -> Result<Vec<ValidationMessage>, MpError> {
        let text = self
            .post(DEBUG_COLLECT_PATH, payload, instance_id, api_secret)
            .await?;

        if text.trim().is_empty() {
            return Ok(vec![]);
        }

        let response: DebugResponse = serde_json::from_str(&text)?;

        Ok(response.validation_messages)
    }

    /// Send `payload` to the live collect endpoint. The response body is
    /// ignored.
    pub async fn send_hit(
        &self,
        payload: &Value,
        instance_id: &InstanceId,
        api_secret: &str,
    ) -> Result<(), MpError> {
        self.post(COLLECT_PATH, payload, instance_id, api_secret)
            .await
            .map(|_| ())
    }

    async fn post(
        &self,
        path: &str,
        payload: &Value,
        instance_id: &InstanceId,
        api_secret: &str,
    ) -> Result<String, MpError> {
        let body = with_validation_behavior(payload)?;
        let url = format!("{}{}", self.base_url, path);

        let mut query = vec![("api_secret", api_secret)];
        if let Some(pair) = instance_id.query_pair() {
            query.push(pair);
        }

        debug!("POST {url} with instance {:?}", instance_id.query_pair());

        let response = self
            .client
            .post(&url)
            .query(&query)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(MpError::from_network_error)?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(MpError::from_network_error)?;

        if !status.is_success() {
            return Err(MpError::Http {
                status: status.as_u16(),
                body: text,
            });
        }

        Ok(text)
    }
}

/// The request body: the payload with the fixed validation behavior appended.
pub fn with_validation_behavior(payload: &Value) -> Result<Value, MpError> {
    let Value::Object(map) = payload else {
        return Err(MpError::Schema("payload must be a JSON object".to_string()));
    };

    let mut body = map.clone();
    body.insert(
        VALIDATION_BEHAVIOR.0.to_string(),
        Value::String(VALIDATION_BEHAVIOR.1.to_string()),
    );

    Ok(Value::Object(body))
}

#[cfg(test)]
mod tests {
    use {super::*, assert_matches::assert_matches, serde_json::json};

    #[test]
    fn test_validation_behavior_is_appended() {
        let body = with_validation_behavior(&json!({"client_id": "1"})).unwrap();

        assert_eq!(
            body,
            json!({"client_id": "1", "validationBehavior": "ENFORCE_RECOMMENDATIONS"})
        );
    }

    #[test]
    fn test_non_object_payload_is_rejected() {
        assert_matches!(
            with_validation_behavior(&json!([1, 2])),
            Err(MpError::Schema(_))
        );
    }

    #[test]
    fn test_builder_trims_trailing_slash() {
        let client = MpClient::builder()
            .with_base_url("http://localhost:1234/")
            .build();

        assert_eq!(client.base_url(), "http://localhost:1234");
    }
}
