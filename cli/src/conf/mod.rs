use crate::{command_title, display::json_output, item, loading, prelude::*};

#[derive(Args, Clone, Debug)]
pub(crate) struct ConfCommand {
    #[arg(
        long = "api-secret",
        help = "Set the default Measurement Protocol API secret",
        value_name = "SECRET"
    )]
    api_secret: Option<String>,
    #[arg(
        long = "measurement-id",
        help = "Set the default measurement ID of web streams",
        value_name = "ID"
    )]
    measurement_id: Option<String>,
    #[arg(
        long = "firebase-app-id",
        help = "Set the default Firebase app ID of app streams",
        value_name = "ID"
    )]
    firebase_app_id: Option<String>,
    #[arg(
        long = "endpoint.base-url",
        help = "Set the Measurement Protocol host",
        value_name = "URL"
    )]
    base_url: Option<url::Url>,
    #[arg(
        long = "endpoint.timeout-secs",
        help = "Set the request timeout in seconds",
        value_name = "SECONDS"
    )]
    timeout_secs: Option<u64>,
    #[arg(
        long = "endpoint.settle-delay-ms",
        help = "Set the delay before a validation result is shown",
        value_name = "MILLIS"
    )]
    settle_delay_ms: Option<u64>,
    #[arg(
        long = "endpoint.link-base-url",
        help = "Set the base URL of sharable links",
        value_name = "URL"
    )]
    link_base_url: Option<url::Url>,
    /// Hidden argument used for testing to set the path of the configuration
    /// file.
    #[arg(
        long = "conf-path",
        hide = true,
        default_value = CLI_CONF_PATH,
        value_parser = ValueParser::from(expand_tilde)
    )]
    conf_path: PathBuf,
}

/// Handle the provided conf command. The [ConfCommand] instance is passed from
/// [crate::main].
pub(crate) async fn handle(
    ConfCommand {
        api_secret,
        measurement_id,
        firebase_app_id,
        base_url,
        timeout_secs,
        settle_delay_ms,
        link_base_url,
        conf_path,
    }: ConfCommand,
) -> AnyResult<(), MpCliError> {
    let mut conf = CliConf::load_or_default(&conf_path).await;

    // If all fields are None, we just want to display the current configuration.
    if api_secret.is_none()
        && measurement_id.is_none()
        && firebase_app_id.is_none()
        && base_url.is_none()
        && timeout_secs.is_none()
        && settle_delay_ms.is_none()
        && link_base_url.is_none()
    {
        command_title!("Current Measurement Protocol CLI Configuration");

        print_conf(&conf);

        return json_output(&conf);
    }

    command_title!("Updating Measurement Protocol CLI Configuration");

    let conf_handle = loading!("Updating configuration...");

    conf.measurement.api_secret = api_secret.or(conf.measurement.api_secret);
    conf.measurement.measurement_id = measurement_id.or(conf.measurement.measurement_id);
    conf.measurement.firebase_app_id = firebase_app_id.or(conf.measurement.firebase_app_id);
    conf.endpoint.base_url = base_url.unwrap_or(conf.endpoint.base_url);
    conf.endpoint.timeout_secs = timeout_secs.unwrap_or(conf.endpoint.timeout_secs);
    conf.endpoint.settle_delay_ms = settle_delay_ms.unwrap_or(conf.endpoint.settle_delay_ms);
    conf.endpoint.link_base_url = link_base_url.unwrap_or(conf.endpoint.link_base_url);

    match conf.save(&conf_path).await {
        Ok(()) => {
            conf_handle.success();

            json_output(&conf)
        }
        Err(e) => {
            conf_handle.error();

            Err(MpCliError::Any(e))
        }
    }
}

fn print_conf(conf: &CliConf) {
    let unset = || "<unset>".truecolor(100, 100, 100).to_string();
    let masked = conf
        .measurement
        .api_secret
        .as_deref()
        .map(mask_secret)
        .unwrap_or_else(unset);

    item!("api_secret: {masked}");
    item!(
        "measurement_id: {}",
        conf.measurement.measurement_id.clone().unwrap_or_else(unset)
    );
    item!(
        "firebase_app_id: {}",
        conf.measurement.firebase_app_id.clone().unwrap_or_else(unset)
    );
    item!("endpoint.base_url: {}", conf.endpoint.base_url);
    item!("endpoint.timeout_secs: {}", conf.endpoint.timeout_secs);
    item!("endpoint.settle_delay_ms: {}", conf.endpoint.settle_delay_ms);
    item!("endpoint.link_base_url: {}", conf.endpoint.link_base_url);
}

/// Keep the last four characters of a secret visible.
fn mask_secret(secret: &str) -> String {
    let visible = secret.len().saturating_sub(4);

    match secret.get(visible..) {
        Some(tail) if visible > 0 => format!("{}{tail}", "*".repeat(visible)),
        _ => "*".repeat(secret.len()),
    }
}
