use {
    super::save_event,
    crate::{command_title, notify_success, prelude::*},
    ga4_mp_sdk::{decode_sharable_link, EventState},
};

/// Decode a sharable link into an event file.
pub(crate) async fn import_event(
    url: url::Url,
    output: Option<PathBuf>,
) -> AnyResult<EventState, MpCliError> {
    if output.is_some() {
        command_title!("Importing event from sharable link");
    }

    let state = decode_sharable_link(&url)?;

    save_event(&state, output.as_deref()).await?;

    if let Some(path) = output {
        notify_success!(
            "Event '{name}' written to {path}",
            name = state.event_name,
            path = path.display().to_string().truecolor(100, 100, 100)
        );
    }

    Ok(state)
}
