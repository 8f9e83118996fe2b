use {
    super::load_event,
    crate::{command_title, prelude::*},
    ga4_mp_sdk::assemble_payload,
    serde_json::Value,
};

/// Print the payload that would be posted for the event at `path`.
pub(crate) async fn print_payload(path: PathBuf) -> AnyResult<Value, MpCliError> {
    let state = load_event(&path).await?;

    command_title!("Payload of '{}'", state.event_name);

    let payload = assemble_payload(&state.payload_input());
    let pretty = serde_json::to_string_pretty(&payload).map_err(|e| MpCliError::Any(e.into()))?;

    // The payload is the output in both modes.
    println!("{pretty}");

    Ok(payload)
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::event::save_event,
        ga4_mp_sdk::{EventState, EventType},
        serde_json::json,
    };

    #[tokio::test]
    async fn test_payload_of_event_file() {
        let tempdir = tempfile::tempdir().unwrap();
        let path = tempdir.path().join("event.json");

        let mut state = EventState::for_type(EventType::Login);
        state.client_ids.client_id = Some("123.456".to_string());
        state.set_param_value(0, "Google");
        save_event(&state, Some(&path)).await.unwrap();

        let payload = print_payload(path).await.unwrap();

        assert_eq!(
            payload,
            json!({
                "client_id": "123.456",
                "events": [{ "name": "login", "params": { "method": "Google" } }]
            })
        );
    }
}
