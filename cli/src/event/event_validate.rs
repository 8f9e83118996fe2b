use {
    super::{apply_conf_defaults, load_event, session_for},
    crate::{
        command_title,
        display::{json_output, print_validation_messages},
        item,
        loading,
        notify_success,
        prelude::*,
    },
    ga4_mp_sdk::{EventSession, RequestStatus, ValidationMessage, ValidationView},
};

#[derive(Serialize)]
struct ValidationReport<'a> {
    status: String,
    messages: &'a [ValidationMessage],
    sent: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    link: Option<String>,
}

/// Validate the event at `path` with identifiers from the configuration
/// filling the gaps.
pub(crate) async fn validate_event(
    path: PathBuf,
    send: bool,
    conf_path: PathBuf,
) -> AnyResult<(), MpCliError> {
    let conf = CliConf::load_or_default(&conf_path).await;
    let mut state = load_event(&path).await?;

    apply_conf_defaults(&mut state, &conf);

    command_title!("Validating '{}' event", state.event_name);

    let mut session = session_for(state, &conf);

    report_validation(&mut session, send).await.map(|_| ())
}

/// Run one validation request on `session`, print the outcome and
/// optionally send the hit. Findings turn into [MpCliError::Invalid].
pub(crate) async fn report_validation(
    session: &mut EventSession,
    send: bool,
) -> AnyResult<RequestStatus, MpCliError> {
    let validate_handle = loading!("Validating payload...");

    let status = match session.validate_event().await {
        Ok(status) => status,
        Err(e) => {
            validate_handle.error();

            return Err(e.into());
        }
    };

    if status == RequestStatus::Successful {
        validate_handle.success();
    } else {
        validate_handle.error();
    }

    let link = match session.is_text_mode() {
        true => None,
        false => session.sharable_link().ok().map(|url| url.to_string()),
    };

    if let ValidationView::Failed { messages } = session.validation_view() {
        print_validation_messages(messages);

        json_output(&ValidationReport {
            status: status.to_string(),
            messages,
            sent: false,
            link,
        })?;

        return Err(MpCliError::Invalid(messages.len()));
    }

    notify_success!("Payload is valid");

    if send {
        let send_handle = loading!("Sending event to GA...");

        match session.send_to_ga().await {
            Ok(_) => send_handle.success(),
            Err(e) => {
                send_handle.error();

                return Err(e.into());
            }
        }
    }

    if let Some(link) = &link {
        item!("Sharable link: {}", link.truecolor(100, 100, 100));
    }

    json_output(&ValidationReport {
        status: status.to_string(),
        messages: &[],
        sent: session.sent(),
        link,
    })?;

    Ok(status)
}
