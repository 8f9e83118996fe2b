pub(crate) use {
    crate::error::MpCliError,
    anyhow::{anyhow, Result as AnyResult},
    clap::{builder::ValueParser, Args, Parser, Subcommand, ValueEnum},
    colored::Colorize,
    serde::{Deserialize, Serialize},
    std::{
        path::{Path, PathBuf},
        sync::atomic::{AtomicBool, Ordering},
        time::Duration,
    },
};

// Where to find config file.
pub(crate) const CLI_CONF_PATH: &str = "~/.ga4mp/conf.toml";

/// When set, commands print machine readable JSON instead of the decorated
/// console output.
pub(crate) static JSON_MODE: AtomicBool = AtomicBool::new(false);

/// Struct holding the config structure.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub(crate) struct CliConf {
    #[serde(default)]
    pub(crate) measurement: MeasurementConf,
    #[serde(default)]
    pub(crate) endpoint: EndpointConf,
}

impl CliConf {
    pub(crate) async fn load_from_path(path: &Path) -> AnyResult<Self> {
        let conf = tokio::fs::read_to_string(path).await?;

        Ok(toml::from_str(&conf)?)
    }

    /// Like [CliConf::load_from_path] but a missing or broken file yields the
    /// defaults.
    pub(crate) async fn load_or_default(path: &Path) -> Self {
        Self::load_from_path(path).await.unwrap_or_else(|e| {
            log::debug!("Using default configuration, {}: {e}", path.display());

            Self::default()
        })
    }

    pub(crate) async fn save(&self, path: &Path) -> AnyResult<()> {
        let conf = toml::to_string_pretty(&self)?;

        if let Some(parent_folder) = path.parent() {
            tokio::fs::create_dir_all(parent_folder).await?;
        }

        tokio::fs::write(path, conf).await?;

        Ok(())
    }
}

/// Defaults filled into events that do not carry their own identifiers.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub(crate) struct MeasurementConf {
    pub(crate) api_secret: Option<String>,
    pub(crate) measurement_id: Option<String>,
    pub(crate) firebase_app_id: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct EndpointConf {
    #[serde(default = "default_base_url")]
    pub(crate) base_url: url::Url,
    #[serde(default = "default_timeout_secs")]
    pub(crate) timeout_secs: u64,
    #[serde(default = "default_settle_delay_ms")]
    pub(crate) settle_delay_ms: u64,
    #[serde(default = "default_link_base_url")]
    pub(crate) link_base_url: url::Url,
}

impl Default for EndpointConf {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            settle_delay_ms: default_settle_delay_ms(),
            link_base_url: default_link_base_url(),
        }
    }
}

// == Used by clap ==

/// Expands `~/` to the user's home directory in path arguments.
pub(crate) fn expand_tilde(path: &str) -> AnyResult<PathBuf> {
    if let Some(path) = path.strip_prefix("~/") {
        match home::home_dir() {
            Some(home) => return Ok(home.join(path)),
            None => return Err(anyhow!("Could not find home directory")),
        }
    }

    Ok(path.into())
}

// == Used by serde ==

fn default_base_url() -> url::Url {
    url::Url::parse(ga4_mp_sdk::client::GA_BASE_URL).expect("Default base URL must be valid")
}

fn default_timeout_secs() -> u64 {
    ga4_mp_sdk::client::DEFAULT_TIMEOUT.as_secs()
}

fn default_settle_delay_ms() -> u64 {
    ga4_mp_sdk::lifecycle::DEFAULT_SETTLE_DELAY.as_millis() as u64
}

fn default_link_base_url() -> url::Url {
    url::Url::parse(ga4_mp_sdk::link::DEFAULT_LINK_BASE_URL)
        .expect("Default link base URL must be valid")
}
