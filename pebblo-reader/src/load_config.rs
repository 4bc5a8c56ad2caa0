/// `load_config` module: Loads a static YAML config and maps it onto the core's
/// [`SafeReaderConfig`] and [`PebbloConfig`].
///
/// This is the only place where user-supplied YAML is parsed.
///
/// # Accepted schema
/// ```yaml
/// app:
///   name: my-app            # required, non-empty
///   owner: data-team        # optional
///   description: ingestion  # optional
/// classifier:               # optional section
///   url: http://localhost:8000
///   timeout_secs: 20
/// ```
///
/// `PEBBLO_CLASSIFIER_URL` in the environment (or a `.env` file) overrides `classifier.url`.
///
/// # Errors
/// All errors use `anyhow::Error` and are surfaced at the CLI boundary.
use anyhow::Result;
use pebblo_reader_core::config::{PebbloConfig, DEFAULT_CLASSIFIER_URL, DEFAULT_TIMEOUT_SECS};
use pebblo_reader_core::safe_reader::SafeReaderConfig;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::{error, info};

#[derive(Debug)]
pub struct CliConfig {
    pub reader: SafeReaderConfig,
    pub pebblo: PebbloConfig,
}

#[derive(Debug, Deserialize)]
struct AppSection {
    name: String,
    #[serde(default)]
    owner: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct ClassifierSection {
    #[serde(default = "default_url")]
    url: String,
    #[serde(default = "default_timeout")]
    timeout_secs: u64,
}

impl Default for ClassifierSection {
    fn default() -> Self {
        Self {
            url: default_url(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_url() -> String {
    DEFAULT_CLASSIFIER_URL.to_string()
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    app: AppSection,
    #[serde(default)]
    classifier: ClassifierSection,
}

/// Loads a static YAML config file and applies environment overrides.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<CliConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => content,
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    let raw: RawConfig = match serde_yaml::from_str(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            conf
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
        }
    };

    if raw.app.name.trim().is_empty() {
        error!(config_path = ?path_ref, "app.name is empty");
        return Err(anyhow::anyhow!("app.name must not be empty"));
    }

    let pebblo = PebbloConfig {
        classifier_url: raw.classifier.url,
        timeout_secs: raw.classifier.timeout_secs,
    }
    .with_env_overrides();
    pebblo.trace_loaded();

    Ok(CliConfig {
        reader: SafeReaderConfig {
            app_name: raw.app.name,
            owner: raw.app.owner,
            description: raw.app.description,
        },
        pebblo,
    })
}
