#![cfg(feature = "lifecycle")]

use {
    anyhow::Result,
    assert_matches::assert_matches,
    ga4_mp_sdk::{
        ClientIds,
        EventSession,
        EventState,
        EventType,
        InstanceId,
        MpClient,
        MpError,
        Parameter,
        RequestStatus,
        SessionOptions,
        ValidationView,
    },
    mockito::{Matcher, Server, ServerGuard},
    serde_json::json,
    std::time::Duration,
};

fn web_login() -> EventState {
    let mut state = EventState::for_type(EventType::Login);
    state.client_ids = ClientIds {
        client_id: Some("123.456".to_string()),
        ..Default::default()
    };
    state.instance_id = InstanceId::web("G-XXXXXXX");
    state.api_secret = "secret".to_string();

    state
}

fn firebase_login() -> EventState {
    let mut state = EventState::for_type(EventType::Login);
    state.use_firebase = true;
    state.client_ids = ClientIds {
        app_instance_id: Some("0123456789abcdef0123456789abcdef".to_string()),
        ..Default::default()
    };
    state.instance_id = InstanceId::firebase("1:123:android:abc");
    state.api_secret = "secret".to_string();

    state
}

/// Setup mock server and a session pointing at it
async fn setup_session(state: EventState) -> (ServerGuard, EventSession) {
    let server = Server::new_async().await;
    let client = MpClient::builder().with_base_url(&server.url()).build();

    let session = EventSession::new(client, state).with_options(SessionOptions {
        settle_delay: Duration::ZERO,
        ..Default::default()
    });

    (server, session)
}

async fn mock_debug_response(server: &mut ServerGuard, body: serde_json::Value) -> mockito::Mock {
    server
        .mock("POST", Matcher::Regex("^/debug/mp/collect".to_string()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body.to_string())
        .create_async()
        .await
}

#[tokio::test]
async fn test_valid_event_goes_through_in_progress_to_successful() -> Result<()> {
    let (mut server, mut session) = setup_session(web_login()).await;
    let mock = mock_debug_response(&mut server, json!({"validationMessages": []})).await;

    let mut rx = session.subscribe();
    let observer = tokio::spawn(async move {
        let mut seen = vec![];
        while rx.changed().await.is_ok() {
            seen.push(*rx.borrow_and_update());
        }
        seen
    });

    assert_eq!(session.status(), RequestStatus::NotStarted);

    let status = session.validate_event().await?;

    assert_eq!(status, RequestStatus::Successful);
    assert_eq!(
        session.validation_view(),
        ValidationView::Successful { sent: false }
    );
    mock.assert_async().await;

    drop(session);
    let seen = observer.await?;

    assert!(seen.contains(&RequestStatus::InProgress));
    assert_eq!(seen.last(), Some(&RequestStatus::Successful));

    Ok(())
}

#[tokio::test]
async fn test_changing_input_after_success_resets() -> Result<()> {
    let (mut server, mut session) = setup_session(web_login()).await;
    let _mock = mock_debug_response(&mut server, json!({})).await;

    session.validate_event().await?;
    assert_eq!(session.status(), RequestStatus::Successful);

    session.update(|state| {
        state.add_user_property(Parameter::string("tier", None).with_value("gold"))
    });

    assert_eq!(session.status(), RequestStatus::NotStarted);

    Ok(())
}

#[tokio::test]
async fn test_send_to_ga_after_success() -> Result<()> {
    let (mut server, mut session) = setup_session(web_login()).await;
    let _debug = mock_debug_response(&mut server, json!({"validationMessages": []})).await;
    let collect = server
        .mock("POST", Matcher::Regex("^/mp/collect".to_string()))
        .match_body(Matcher::PartialJson(json!({
            "client_id": "123.456",
            "events": [{"name": "login"}]
        })))
        .with_status(204)
        .create_async()
        .await;

    session.validate_event().await?;

    assert!(session.send_to_ga().await?);
    assert!(session.sent());
    assert_eq!(
        session.validation_view(),
        ValidationView::Successful { sent: true }
    );
    collect.assert_async().await;

    Ok(())
}

#[tokio::test]
async fn test_local_and_remote_messages_are_merged_and_deduplicated() -> Result<()> {
    let mut state = web_login();
    state.event_name = "ad_click".to_string();

    let (mut server, mut session) = setup_session(state).await;
    let _mock = mock_debug_response(
        &mut server,
        json!({
            "validationMessages": [
                {
                    "fieldPath": "events",
                    "description": "ad_click is a reserved event name",
                    "validationCode": "NAME_RESERVED"
                },
                {
                    "fieldPath": "events",
                    "description": "Something only the server knows.",
                    "validationCode": "VALUE_INVALID"
                }
            ]
        }),
    )
    .await;

    let status = session.validate_event().await?;

    assert_eq!(status, RequestStatus::Failed);

    let descriptions = session
        .messages()
        .iter()
        .map(|m| m.description.as_str())
        .collect::<Vec<_>>();

    assert_eq!(
        descriptions,
        vec![
            "ad_click is a reserved event name",
            "Something only the server knows."
        ]
    );
    assert!(session.messages().iter().all(|m| m.documentation.is_some()));
    assert_eq!(
        session.messages()[0].documentation.as_deref(),
        Some("https://developers.google.com/analytics/devguides/collection/protocol/ga4/reference/events#ad_click")
    );
    assert_matches!(session.validation_view(), ValidationView::Failed { messages } if messages.len() == 2);

    Ok(())
}

#[tokio::test]
async fn test_remote_messages_for_other_client_type_are_dropped() -> Result<()> {
    let (mut server, mut session) = setup_session(firebase_login()).await;
    let _mock = mock_debug_response(
        &mut server,
        json!({
            "validationMessages": [{
                "fieldPath": "measurement_id",
                "description": "Unable to find measurement_id.",
                "validationCode": "VALUE_REQUIRED"
            }]
        }),
    )
    .await;

    let status = session.validate_event().await?;

    assert_eq!(status, RequestStatus::Successful);
    assert!(session.messages().is_empty());

    Ok(())
}

#[tokio::test]
async fn test_failed_validation_can_be_retried() -> Result<()> {
    let mut state = web_login();
    state.api_secret = String::new();

    let (mut server, mut session) = setup_session(state).await;
    let _mock = mock_debug_response(&mut server, json!({})).await;

    assert_eq!(session.validate_event().await?, RequestStatus::Failed);
    assert_eq!(
        session.messages()[0].description,
        "Measurement requires an api_secret."
    );

    session.update(|state| state.api_secret = "secret".to_string());

    // The secret is not part of the payload, the status is kept.
    assert_eq!(session.status(), RequestStatus::Failed);
    assert_eq!(session.validate_event().await?, RequestStatus::Successful);

    Ok(())
}

#[tokio::test]
async fn test_network_failure_restores_previous_status() -> Result<()> {
    let (mut server, mut session) = setup_session(web_login()).await;
    let _mock = server
        .mock("POST", Matcher::Regex("^/debug/mp/collect".to_string()))
        .with_status(503)
        .create_async()
        .await;

    let result = session.validate_event().await;

    assert_matches!(result, Err(MpError::Http { status: 503, .. }));
    assert_eq!(session.status(), RequestStatus::NotStarted);

    Ok(())
}

#[tokio::test]
async fn test_network_failure_on_retry_keeps_previous_messages() -> Result<()> {
    let mut state = web_login();
    state.api_secret = String::new();

    let (mut server, mut session) = setup_session(state).await;
    let ok_mock = mock_debug_response(&mut server, json!({})).await;

    assert_eq!(session.validate_event().await?, RequestStatus::Failed);
    assert_eq!(session.messages().len(), 1);

    ok_mock.remove_async().await;

    let _unavailable = server
        .mock("POST", Matcher::Regex("^/debug/mp/collect".to_string()))
        .with_status(503)
        .create_async()
        .await;

    let result = session.validate_event().await;

    assert_matches!(result, Err(MpError::Http { status: 503, .. }));
    assert_eq!(session.status(), RequestStatus::Failed);
    assert_matches!(
        session.validation_view(),
        ValidationView::Failed { messages }
            if messages.len() == 1 && messages[0].description == "Measurement requires an api_secret."
    );

    Ok(())
}

#[tokio::test]
async fn test_repeated_remote_messages_are_only_checked_against_local_ones() -> Result<()> {
    let (mut server, mut session) = setup_session(web_login()).await;
    let repeated = json!({
        "fieldPath": "events",
        "description": "Something only the server knows.",
        "validationCode": "VALUE_INVALID"
    });
    let _mock = mock_debug_response(
        &mut server,
        json!({ "validationMessages": [repeated.clone(), repeated] }),
    )
    .await;

    assert_eq!(session.validate_event().await?, RequestStatus::Failed);
    assert_eq!(session.messages().len(), 2);

    Ok(())
}

#[tokio::test]
async fn test_text_payload_mode() -> Result<()> {
    let (mut server, mut session) = setup_session(web_login()).await;
    let mock = server
        .mock("POST", Matcher::Regex("^/debug/mp/collect".to_string()))
        .match_body(Matcher::PartialJson(json!({"client_id": "typed"})))
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;

    session.set_text_payload(r#"{"client_id": "typed", "events": [{"name": "login"}]}"#);

    assert_eq!(session.validate_event().await?, RequestStatus::Successful);
    mock.assert_async().await;

    session.set_text_payload("{ oops");

    assert_eq!(session.status(), RequestStatus::NotStarted);
    assert_eq!(session.validate_event().await?, RequestStatus::Failed);
    assert_eq!(session.messages()[0].validation_code, "format_invalid");

    Ok(())
}

#[tokio::test]
async fn test_sharable_link_round_trip() -> Result<()> {
    let (_server, session) = setup_session(firebase_login()).await;

    let url = session.sharable_link()?;
    let decoded = ga4_mp_sdk::decode_sharable_link(&url)?;

    assert_eq!(&decoded, session.state());
    assert!(session.copy_payload().is_some_and(|p| p.contains("\n  \"app_instance_id\"")));

    Ok(())
}
