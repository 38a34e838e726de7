use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

const CONFIG_FILE: &str = "netquery_report";
const ENV_PREFIX: &str = "NETQUERY";

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    /// Tracing filter used when `RUST_LOG` is unset.
    #[serde(default = "default_log")]
    pub log: String,
    #[serde(default = "default_pretty")]
    pub pretty: bool,
    /// Files parsed per parallel chunk in `batch`.
    #[serde(default = "default_batch_chunk")]
    pub batch_chunk: usize,
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

fn default_log() -> String {
    "info".to_string()
}

fn default_pretty() -> bool {
    true
}

fn default_batch_chunk() -> usize {
    500
}

fn default_extensions() -> Vec<String> {
    vec!["md".to_string(), "txt".to_string()]
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            log: default_log(),
            pretty: default_pretty(),
            batch_chunk: default_batch_chunk(),
            extensions: default_extensions(),
        }
    }
}

impl Settings {
    /// Defaults, then `netquery_report.toml` if present, then `NETQUERY_*`.
    pub fn load() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::with_name(CONFIG_FILE).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("extensions"),
            )
            .build()?
            .try_deserialize()
    }

    pub fn accepts(&self, path: &std::path::Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|x| x.eq_ignore_ascii_case(ext)))
    }
}
