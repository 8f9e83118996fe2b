//! The validation request of a single event session.
//!
//! ```text
//! NotStarted --validate_event--> InProgress --> Successful
//!     ^                              |      \-> Failed --validate_event--> InProgress
//!     |                              v
//!     +---- payload changes ----- (any state)
//! ```
//!
//! A failed network call puts the session back into the state it was in
//! before the request and surfaces the error to the caller.

use {
    crate::{
        client::MpClient,
        error::MpError,
        event::EventState,
        format_check::format_check,
        link::{encode_sharable_link, DEFAULT_LINK_BASE_URL},
        message::ValidationMessage,
        payload::assemble_payload,
        response::{format_error_messages, format_validation_message},
        schema,
    },
    log::{debug, error, warn},
    serde_json::Value,
    std::{collections::HashSet, time::Duration},
    strum_macros::Display,
    tokio::sync::watch,
    url::Url,
};

/// Delay applied after the debug endpoint answered and before the result is
/// committed.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(250);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Display)]
pub enum RequestStatus {
    #[default]
    NotStarted,
    InProgress,
    Successful,
    Failed,
}

#[derive(Clone, Debug)]
pub struct SessionOptions {
    pub settle_delay: Duration,
    /// Base URL of generated sharable links.
    pub link_base_url: String,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            settle_delay: DEFAULT_SETTLE_DELAY,
            link_base_url: DEFAULT_LINK_BASE_URL.to_string(),
        }
    }
}

/// What the current state allows a caller to look at.
#[derive(Clone, Debug, PartialEq)]
pub enum ValidationView<'a> {
    NotStarted,
    InProgress,
    Successful { sent: bool },
    Failed { messages: &'a [ValidationMessage] },
}

/// Owns the inputs of one event and the state of its validation request.
pub struct EventSession {
    client: MpClient,
    options: SessionOptions,
    state: EventState,
    /// Raw JSON typed by the user. When set, it replaces the payload
    /// assembled from `state`.
    text_payload: Option<String>,
    status: watch::Sender<RequestStatus>,
    messages: Vec<ValidationMessage>,
    sent: bool,
}

impl EventSession {
    pub fn new(client: MpClient, state: EventState) -> Self {
        Self {
            client,
            options: SessionOptions::default(),
            state,
            text_payload: None,
            status: watch::Sender::new(RequestStatus::NotStarted),
            messages: vec![],
            sent: false,
        }
    }

    pub fn with_options(mut self, options: SessionOptions) -> Self {
        self.options = options;
        self
    }

    pub fn state(&self) -> &EventState {
        &self.state
    }

    pub fn status(&self) -> RequestStatus {
        *self.status.borrow()
    }

    /// Receives every status change from now on.
    pub fn subscribe(&self) -> watch::Receiver<RequestStatus> {
        self.status.subscribe()
    }

    pub fn messages(&self) -> &[ValidationMessage] {
        &self.messages
    }

    pub fn sent(&self) -> bool {
        self.sent
    }

    pub fn is_text_mode(&self) -> bool {
        self.text_payload.is_some()
    }

    /// Edits the event inputs. The request starts over if the payload changed.
    pub fn update<F>(&mut self, edit: F)
    where
        F: FnOnce(&mut EventState),
    {
        let before = self.payload();

        edit(&mut self.state);

        if self.payload() != before {
            self.reset();
        }
    }

    /// Switches to text box mode. The request starts over whenever the raw
    /// text differs from what was there before.
    pub fn set_text_payload(&mut self, text: impl Into<String>) {
        let text = text.into();

        if self.text_payload.as_deref() != Some(text.as_str()) {
            self.text_payload = Some(text);
            self.reset();
        }
    }

    /// Leaves text box mode and goes back to the assembled payload.
    pub fn clear_text_payload(&mut self) {
        if self.text_payload.take().is_some() {
            self.reset();
        }
    }

    /// The payload that would be validated right now. In text box mode this
    /// is `None` when the text is not a non-empty JSON object.
    pub fn payload(&self) -> Option<Value> {
        match &self.text_payload {
            None => Some(assemble_payload(&self.state.payload_input())),
            Some(text) => serde_json::from_str::<Value>(text)
                .ok()
                .filter(|value| value.as_object().is_some_and(|map| !map.is_empty())),
        }
    }

    /// Runs local and remote validation and commits the merged outcome.
    ///
    /// Only starts from [RequestStatus::NotStarted] or [RequestStatus::Failed];
    /// in any other state the current status is returned unchanged.
    pub async fn validate_event(&mut self) -> Result<RequestStatus, MpError> {
        let previous = self.status();

        if !matches!(previous, RequestStatus::NotStarted | RequestStatus::Failed) {
            debug!("Validation requested while {previous}, ignoring");

            return Ok(previous);
        }

        // Messages of the previous run are kept until commit.
        self.status.send_replace(RequestStatus::InProgress);

        let Some(payload) = self.payload() else {
            return Ok(self.commit(format_validation_message(), RequestStatus::Failed));
        };

        let use_firebase = self.state.use_firebase;
        let instance_id = self.state.instance_id.clone();
        let api_secret = self.state.api_secret.clone();

        let mut errors = schema::get_errors(&payload);
        errors.extend(format_check(&payload, &instance_id, &api_secret, use_firebase));

        let remote = match self
            .client
            .validate_hit(&payload, &instance_id, &api_secret)
            .await
        {
            Ok(remote) => remote,
            Err(e) => {
                error!("Remote validation failed: {e}");
                self.status.send_replace(previous);

                return Err(e);
            }
        };

        tokio::time::sleep(self.options.settle_delay).await;

        let local = errors
            .iter()
            .map(|e| e.description.clone())
            .collect::<HashSet<_>>();

        for message in remote {
            if !keep_remote_message(&message, use_firebase) {
                warn!("Dropping remote message for the other client type: {message}");
                continue;
            }

            if local.contains(&message.description) {
                continue;
            }

            errors.push(message);
        }

        if errors.is_empty() {
            return Ok(self.commit(vec![], RequestStatus::Successful));
        }

        let messages = format_error_messages(errors, &payload, use_firebase);

        Ok(self.commit(messages, RequestStatus::Failed))
    }

    /// Sends the validated payload to the live endpoint. Does nothing unless
    /// the last validation succeeded; returns whether the hit was sent.
    pub async fn send_to_ga(&mut self) -> Result<bool, MpError> {
        if self.status() != RequestStatus::Successful {
            return Ok(false);
        }

        let Some(payload) = self.payload() else {
            return Ok(false);
        };

        self.client
            .send_hit(&payload, &self.state.instance_id, &self.state.api_secret)
            .await
            .inspect_err(|e| error!("Sending hit failed: {e}"))?;

        self.sent = true;

        Ok(true)
    }

    /// The payload pretty printed with two space indentation.
    pub fn copy_payload(&self) -> Option<String> {
        self.payload()
            .and_then(|payload| serde_json::to_string_pretty(&payload).ok())
    }

    pub fn sharable_link(&self) -> Result<Url, MpError> {
        encode_sharable_link(&self.options.link_base_url, &self.state)
    }

    pub fn validation_view(&self) -> ValidationView<'_> {
        match self.status() {
            RequestStatus::NotStarted => ValidationView::NotStarted,
            RequestStatus::InProgress => ValidationView::InProgress,
            RequestStatus::Successful => ValidationView::Successful { sent: self.sent },
            RequestStatus::Failed => ValidationView::Failed {
                messages: &self.messages,
            },
        }
    }

    fn commit(&mut self, messages: Vec<ValidationMessage>, status: RequestStatus) -> RequestStatus {
        self.messages = messages;
        self.status.send_replace(status);

        status
    }

    fn reset(&mut self) {
        self.messages.clear();
        self.sent = false;
        self.status.send_replace(RequestStatus::NotStarted);
    }
}

/// Remote findings about the instance id of the other client type are noise.
fn keep_remote_message(message: &ValidationMessage, use_firebase: bool) -> bool {
    match message.field_path.as_str() {
        "measurement_id" => !use_firebase,
        "firebase_app_id" => use_firebase,
        _ => true,
    }
}
