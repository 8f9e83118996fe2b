use {
    super::{load_event, save_event, EventEdits},
    crate::{command_title, notify_success, prelude::*},
    ga4_mp_sdk::EventState,
};

/// Apply `edits` to the event stored at `path` and write it back.
pub(crate) async fn edit_event(
    path: PathBuf,
    edits: EventEdits,
) -> AnyResult<EventState, MpCliError> {
    command_title!("Editing event at '{}'", path.display());

    let mut state = load_event(&path).await?;

    edits.apply(&mut state).map_err(MpCliError::Event)?;

    save_event(&state, Some(&path)).await?;

    notify_success!("Event '{}' updated", state.event_name);

    Ok(state)
}
