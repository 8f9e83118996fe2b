use {
    crate::{
        command_title,
        event::{report_validation, session_for, ConfPath},
        prelude::*,
    },
    ga4_mp_sdk::{EventState, InstanceId},
    tokio::io::AsyncReadExt,
};

#[derive(Subcommand)]
pub(crate) enum PayloadCommand {
    #[command(about = "Validate a raw JSON payload against the debug endpoint")]
    Validate {
        #[arg(
            long = "file",
            short = 'f',
            help = "Path to the JSON payload, '-' reads stdin",
            value_name = "PATH"
        )]
        file: String,
        /// The payload belongs to a Firebase app stream.
        #[arg(long = "firebase", help = "Validate as an app stream payload")]
        firebase: bool,
        #[arg(long = "measurement-id", help = "Measurement ID of a web stream", value_name = "ID")]
        measurement_id: Option<String>,
        #[arg(long = "firebase-app-id", help = "Firebase app ID", value_name = "ID")]
        firebase_app_id: Option<String>,
        #[arg(long = "api-secret", help = "Measurement Protocol API secret", value_name = "SECRET")]
        api_secret: Option<String>,
        /// Send the payload to the live collect endpoint once it is valid.
        #[arg(long = "send", help = "Send the payload to GA when it is valid")]
        send: bool,
        #[command(flatten)]
        conf: ConfPath,
    },
}

/// Handle the provided payload command. The [PayloadCommand] instance is
/// passed from [crate::main].
pub(crate) async fn handle(command: PayloadCommand) -> AnyResult<(), MpCliError> {
    match command {
        // == `$ mp payload validate` ==
        PayloadCommand::Validate {
            file,
            firebase,
            measurement_id,
            firebase_app_id,
            api_secret,
            send,
            conf,
        } => {
            let text = read_payload(&file).await?;
            let conf = CliConf::load_or_default(&conf.conf_path).await;
            let measurement = &conf.measurement;

            let instance_id = match firebase {
                true => InstanceId {
                    measurement_id: None,
                    firebase_app_id: firebase_app_id.or(measurement.firebase_app_id.clone()),
                },
                false => InstanceId {
                    measurement_id: measurement_id.or(measurement.measurement_id.clone()),
                    firebase_app_id: None,
                },
            };

            let state = EventState {
                use_firebase: firebase,
                instance_id,
                api_secret: api_secret
                    .or(measurement.api_secret.clone())
                    .unwrap_or_default(),
                ..Default::default()
            };

            command_title!("Validating payload from '{file}'");

            let mut session = session_for(state, &conf);
            session.set_text_payload(text);

            report_validation(&mut session, send).await.map(|_| ())
        }
    }
}

async fn read_payload(file: &str) -> AnyResult<String, MpCliError> {
    if file == "-" {
        let mut text = String::new();

        tokio::io::stdin()
            .read_to_string(&mut text)
            .await
            .map_err(MpCliError::IoError)?;

        return Ok(text);
    }

    tokio::fs::read_to_string(expand_tilde(file).map_err(MpCliError::Any)?)
        .await
        .map_err(MpCliError::IoError)
}
