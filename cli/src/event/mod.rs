mod event_edit;
mod event_import;
mod event_link;
mod event_new;
mod event_payload;
mod event_types;
mod event_validate;

pub(crate) use event_validate::report_validation;
use {
    crate::prelude::*,
    event_edit::*,
    event_import::*,
    event_link::*,
    event_new::*,
    event_payload::*,
    event_types::*,
    event_validate::*,
    ga4_mp_sdk::{
        EventSession,
        EventState,
        EventType,
        InstanceId,
        MpClient,
        Parameter,
        SessionOptions,
    },
    std::str::FromStr,
};

#[derive(Subcommand)]
pub(crate) enum EventCommand {
    #[command(about = "List the recommended event types")]
    Types,

    #[command(about = "Create an event file from the recommended event catalog")]
    New {
        #[arg(
            long = "type",
            short = 't',
            help = "The recommended event type, or custom_event",
            value_name = "TYPE",
            value_parser = EventType::from_str,
            default_value = "select_content"
        )]
        event_type: EventType,
        /// Build the event for a Firebase app stream instead of a web stream.
        #[arg(long = "firebase", help = "Use app_instance_id and firebase_app_id")]
        firebase: bool,
        #[command(flatten)]
        edits: EventEdits,
        #[arg(
            long = "output",
            short = 'o',
            help = "Where to write the event file, stdout if omitted",
            value_name = "PATH",
            value_parser = ValueParser::from(expand_tilde)
        )]
        output: Option<PathBuf>,
    },

    #[command(about = "Change values of an existing event file")]
    Edit {
        #[command(flatten)]
        event: EventFile,
        #[command(flatten)]
        edits: EventEdits,
    },

    #[command(about = "Print the assembled Measurement Protocol payload")]
    Payload {
        #[command(flatten)]
        event: EventFile,
    },

    #[command(about = "Validate an event locally and against the debug endpoint")]
    Validate {
        #[command(flatten)]
        event: EventFile,
        /// Send the event to the live collect endpoint once it is valid.
        #[arg(long = "send", help = "Send the event to GA when it is valid")]
        send: bool,
        #[command(flatten)]
        conf: ConfPath,
    },

    #[command(about = "Print a sharable link that reproduces the event")]
    Link {
        #[command(flatten)]
        event: EventFile,
        #[command(flatten)]
        conf: ConfPath,
    },

    #[command(about = "Create an event file from a sharable link")]
    Import {
        #[arg(long = "url", short = 'u', help = "The sharable link", value_name = "URL")]
        url: url::Url,
        #[arg(
            long = "output",
            short = 'o',
            help = "Where to write the event file, stdout if omitted",
            value_name = "PATH",
            value_parser = ValueParser::from(expand_tilde)
        )]
        output: Option<PathBuf>,
    },
}

/// Path of an event file as written by `mp event new`.
#[derive(Args, Clone, Debug)]
pub(crate) struct EventFile {
    #[arg(
        long = "event",
        short = 'e',
        help = "Path to the event JSON file",
        value_name = "PATH",
        value_parser = ValueParser::from(expand_tilde)
    )]
    pub(crate) path: PathBuf,
}

/// Hidden argument used for testing to set the path of the configuration
/// file.
#[derive(Args, Clone, Debug)]
pub(crate) struct ConfPath {
    #[arg(
        long = "conf-path",
        hide = true,
        default_value = CLI_CONF_PATH,
        value_parser = ValueParser::from(expand_tilde)
    )]
    pub(crate) conf_path: PathBuf,
}

/// Values applied on top of an event. Parameters and user properties are
/// matched by name; unknown names are appended.
#[derive(Args, Clone, Debug, Default)]
pub(crate) struct EventEdits {
    #[arg(long = "name", help = "Event name, used by custom events", value_name = "NAME")]
    pub(crate) name: Option<String>,
    #[arg(
        long = "param",
        short = 'p',
        help = "Set a string parameter",
        value_name = "NAME=VALUE",
        value_parser = parse_key_val
    )]
    pub(crate) params: Vec<(String, String)>,
    #[arg(
        long = "number-param",
        help = "Set a number parameter",
        value_name = "NAME=VALUE",
        value_parser = parse_key_val
    )]
    pub(crate) number_params: Vec<(String, String)>,
    #[arg(
        long = "item",
        help = "Append an item, e.g. item_id=SKU_1,price=9.99",
        value_name = "NAME=VALUE,..."
    )]
    pub(crate) items: Vec<String>,
    #[arg(
        long = "user-property",
        help = "Set a string user property",
        value_name = "NAME=VALUE",
        value_parser = parse_key_val
    )]
    pub(crate) user_properties: Vec<(String, String)>,
    #[arg(
        long = "number-user-property",
        help = "Set a number user property",
        value_name = "NAME=VALUE",
        value_parser = parse_key_val
    )]
    pub(crate) number_user_properties: Vec<(String, String)>,
    #[arg(long = "client-id", help = "Web client ID", value_name = "ID")]
    pub(crate) client_id: Option<String>,
    #[arg(long = "app-instance-id", help = "Firebase app instance ID", value_name = "ID")]
    pub(crate) app_instance_id: Option<String>,
    #[arg(long = "user-id", help = "User ID", value_name = "ID")]
    pub(crate) user_id: Option<String>,
    #[arg(long = "measurement-id", help = "Measurement ID of a web stream", value_name = "ID")]
    pub(crate) measurement_id: Option<String>,
    #[arg(long = "firebase-app-id", help = "Firebase app ID", value_name = "ID")]
    pub(crate) firebase_app_id: Option<String>,
    #[arg(long = "api-secret", help = "Measurement Protocol API secret", value_name = "SECRET")]
    pub(crate) api_secret: Option<String>,
    #[arg(
        long = "timestamp-micros",
        help = "Event time in microseconds since the epoch",
        value_name = "MICROS"
    )]
    pub(crate) timestamp_micros: Option<String>,
    #[arg(
        long = "non-personalized-ads",
        help = "Mark the event as non personalized",
        value_name = "BOOL"
    )]
    pub(crate) non_personalized_ads: Option<bool>,
}

impl EventEdits {
    pub(crate) fn apply(self, state: &mut EventState) -> AnyResult<()> {
        if let Some(name) = self.name {
            state.event_name = name;
        }

        for (name, value) in self.params {
            upsert_param(&mut state.parameters, &name, &value, Parameter::string(&name, None));
        }

        for (name, value) in self.number_params {
            upsert_param(&mut state.parameters, &name, &value, Parameter::number(&name, None));
        }

        for item in self.items {
            let pairs = item
                .split(',')
                .map(parse_key_val)
                .collect::<AnyResult<Vec<_>>>()?;

            state.add_item();

            let Some(nu) = state.items.as_mut().and_then(|items| items.last_mut()) else {
                continue;
            };

            for (name, value) in pairs {
                upsert_param(&mut nu.parameters, &name, &value, Parameter::string(&name, None));
            }
        }

        for (name, value) in self.user_properties {
            upsert_param(&mut state.user_properties, &name, &value, Parameter::string(&name, None));
        }

        for (name, value) in self.number_user_properties {
            upsert_param(&mut state.user_properties, &name, &value, Parameter::number(&name, None));
        }

        let ids = &mut state.client_ids;
        ids.client_id = self.client_id.or(ids.client_id.take());
        ids.app_instance_id = self.app_instance_id.or(ids.app_instance_id.take());
        ids.user_id = self.user_id.or(ids.user_id.take());

        let instance = &mut state.instance_id;
        instance.measurement_id = self.measurement_id.or(instance.measurement_id.take());
        instance.firebase_app_id = self.firebase_app_id.or(instance.firebase_app_id.take());

        if let Some(api_secret) = self.api_secret {
            state.api_secret = api_secret;
        }

        state.timestamp_micros = self.timestamp_micros.or(state.timestamp_micros.take());
        state.non_personalized_ads = self.non_personalized_ads.or(state.non_personalized_ads);

        Ok(())
    }
}

/// Sets the value of the row called `name`, appending `fresh` if there is
/// none.
fn upsert_param(rows: &mut Vec<Parameter>, name: &str, value: &str, fresh: Parameter) {
    match rows.iter_mut().find(|row| row.name() == name) {
        Some(row) => row.set_value(value),
        None => rows.push(fresh.with_value(value)),
    }
}

/// Parses `NAME=VALUE`. The value may contain further `=`.
pub(crate) fn parse_key_val(raw: &str) -> AnyResult<(String, String)> {
    match raw.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.to_string()))
        }
        _ => Err(anyhow!("Expected NAME=VALUE but got '{raw}'")),
    }
}

pub(crate) async fn load_event(path: &Path) -> AnyResult<EventState, MpCliError> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(MpCliError::IoError)?;

    let mut deserializer = serde_json::Deserializer::from_str(&contents);

    serde_path_to_error::deserialize(&mut deserializer).map_err(|e| {
        MpCliError::Event(anyhow!(
            "Failed to parse event file {} at '{}': {}",
            path.display(),
            e.path(),
            e.inner()
        ))
    })
}

/// Write the event to `output`, or print it when no path is given.
pub(crate) async fn save_event(
    state: &EventState,
    output: Option<&Path>,
) -> AnyResult<(), MpCliError> {
    let json = serde_json::to_string_pretty(state).map_err(|e| MpCliError::Any(e.into()))?;

    let Some(path) = output else {
        println!("{json}");

        return Ok(());
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(MpCliError::IoError)?;
    }

    tokio::fs::write(path, json)
        .await
        .map_err(MpCliError::IoError)
}

/// Fill identifiers the event does not carry from the configuration. Only
/// the instance id matching the client type is taken.
pub(crate) fn apply_conf_defaults(state: &mut EventState, conf: &CliConf) {
    let measurement = &conf.measurement;

    if state.api_secret.is_empty() {
        state.api_secret = measurement.api_secret.clone().unwrap_or_default();
    }

    let InstanceId {
        measurement_id,
        firebase_app_id,
    } = &mut state.instance_id;

    if state.use_firebase {
        if firebase_app_id.as_deref().unwrap_or_default().is_empty() {
            *firebase_app_id = measurement.firebase_app_id.clone();
        }
    } else if measurement_id.as_deref().unwrap_or_default().is_empty() {
        *measurement_id = measurement.measurement_id.clone();
    }
}

/// A validation session talking to the configured endpoint.
pub(crate) fn session_for(state: EventState, conf: &CliConf) -> EventSession {
    let client = MpClient::builder()
        .with_base_url(conf.endpoint.base_url.as_str())
        .with_timeout(Duration::from_secs(conf.endpoint.timeout_secs))
        .build();

    EventSession::new(client, state).with_options(SessionOptions {
        settle_delay: Duration::from_millis(conf.endpoint.settle_delay_ms),
        link_base_url: conf.endpoint.link_base_url.to_string(),
    })
}

/// Handle the provided event command. The [EventCommand] instance is passed
/// from [crate::main].
pub(crate) async fn handle(command: EventCommand) -> AnyResult<(), MpCliError> {
    match command {
        // == `$ mp event types` ==
        EventCommand::Types => list_event_types(),

        // == `$ mp event new` ==
        EventCommand::New {
            event_type,
            firebase,
            edits,
            output,
        } => new_event(event_type, firebase, edits, output).await.map(|_| ()),

        // == `$ mp event edit` ==
        EventCommand::Edit { event, edits } => edit_event(event.path, edits).await.map(|_| ()),

        // == `$ mp event payload` ==
        EventCommand::Payload { event } => print_payload(event.path).await.map(|_| ()),

        // == `$ mp event validate` ==
        EventCommand::Validate { event, send, conf } => {
            validate_event(event.path, send, conf.conf_path).await
        }

        // == `$ mp event link` ==
        EventCommand::Link { event, conf } => {
            sharable_link(event.path, conf.conf_path).await.map(|_| ())
        }

        // == `$ mp event import` ==
        EventCommand::Import { url, output } => import_event(url, output).await.map(|_| ()),
    }
}
