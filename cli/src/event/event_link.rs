use {
    super::{apply_conf_defaults, load_event},
    crate::{command_title, display::json_output, prelude::*},
    ga4_mp_sdk::encode_sharable_link,
};

#[derive(Serialize)]
struct LinkOutput {
    link: String,
}

/// Print a sharable link for the event at `path`.
pub(crate) async fn sharable_link(path: PathBuf, conf_path: PathBuf) -> AnyResult<url::Url, MpCliError> {
    let conf = CliConf::load_or_default(&conf_path).await;
    let mut state = load_event(&path).await?;

    apply_conf_defaults(&mut state, &conf);

    command_title!("Sharable link for '{}'", state.event_name);

    let link = encode_sharable_link(conf.endpoint.link_base_url.as_str(), &state)?;

    if !JSON_MODE.load(Ordering::Relaxed) {
        println!("{link}");
    }

    json_output(&LinkOutput {
        link: link.to_string(),
    })?;

    Ok(link)
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::event::save_event,
        ga4_mp_sdk::{decode_sharable_link, EventState, EventType},
    };

    #[tokio::test]
    async fn test_link_uses_configured_base_and_defaults() {
        let tempdir = tempfile::tempdir().unwrap();
        let conf_path = tempdir.path().join("conf.toml");
        let event_path = tempdir.path().join("event.json");

        let conf = CliConf {
            measurement: MeasurementConf {
                measurement_id: Some("G-XXXXXXX".to_string()),
                ..Default::default()
            },
            endpoint: EndpointConf {
                link_base_url: url::Url::parse("https://tools.example.com/builder/").unwrap(),
                ..Default::default()
            },
        };
        conf.save(&conf_path).await.unwrap();

        let state = EventState::for_type(EventType::Share);
        save_event(&state, Some(&event_path)).await.unwrap();

        let link = sharable_link(event_path, conf_path).await.unwrap();

        assert_eq!(link.host_str(), Some("tools.example.com"));
        assert_eq!(link.path(), "/builder/");

        let decoded = decode_sharable_link(&link).unwrap();

        assert_eq!(decoded.event_type, EventType::Share);
        assert_eq!(decoded.instance_id.measurement_id.as_deref(), Some("G-XXXXXXX"));
    }
}
