use {
    super::{save_event, EventEdits},
    crate::{command_title, notify_success, prelude::*},
    ga4_mp_sdk::{EventState, EventType},
};

/// Create a new event file from the catalog template of `event_type`.
pub(crate) async fn new_event(
    event_type: EventType,
    firebase: bool,
    edits: EventEdits,
    output: Option<PathBuf>,
) -> AnyResult<EventState, MpCliError> {
    if output.is_some() {
        command_title!("Creating a new '{event_type}' event");
    }

    let mut state = EventState::for_type(event_type);
    state.use_firebase = firebase;

    edits.apply(&mut state).map_err(MpCliError::Event)?;

    save_event(&state, output.as_deref()).await?;

    if let Some(path) = output {
        notify_success!(
            "Event written to {path}",
            path = path.display().to_string().truecolor(100, 100, 100)
        );
    }

    Ok(state)
}
