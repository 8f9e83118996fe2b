use {
    crate::{command_title, display::json_output, item, prelude::*},
    ga4_mp_sdk::{event::suggested_event_for, EventType},
    strum::IntoEnumIterator,
};

#[derive(Serialize)]
struct EventTypeEntry {
    name: String,
    categories: Vec<String>,
    parameters: Vec<String>,
    has_items: bool,
}

/// Print every recommended event type with its categories and parameters.
pub(crate) fn list_event_types() -> AnyResult<(), MpCliError> {
    command_title!("Recommended event types");

    let entries = EventType::iter()
        .map(|event_type| {
            let suggested = suggested_event_for(event_type);

            EventTypeEntry {
                name: event_type.to_string(),
                categories: suggested.categories.iter().map(ToString::to_string).collect(),
                parameters: suggested
                    .parameters
                    .iter()
                    .map(|p| p.name().to_string())
                    .collect(),
                has_items: suggested.items.is_some(),
            }
        })
        .collect::<Vec<_>>();

    for entry in &entries {
        item!(
            "{name} {categories}",
            name = entry.name.bold(),
            categories = format!("[{}]", entry.categories.join(", ")).truecolor(100, 100, 100)
        );

        if !entry.parameters.is_empty() {
            println!("        {}", entry.parameters.join(", "));
        }
    }

    json_output(&entries)
}
