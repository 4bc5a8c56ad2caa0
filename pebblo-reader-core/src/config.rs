use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

pub const DEFAULT_CLASSIFIER_URL: &str = "http://localhost:8000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 20;

/// Environment variable that overrides the classifier base URL.
pub const CLASSIFIER_URL_ENV: &str = "PEBBLO_CLASSIFIER_URL";

/// Where and how to reach the Pebblo classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PebbloConfig {
    pub classifier_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for PebbloConfig {
    fn default() -> Self {
        Self {
            classifier_url: DEFAULT_CLASSIFIER_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl PebbloConfig {
    /// Defaults, with the classifier URL taken from `PEBBLO_CLASSIFIER_URL` when set.
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var(CLASSIFIER_URL_ENV) {
            if !url.trim().is_empty() {
                self.classifier_url = url;
            }
        }
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn trace_loaded(&self) {
        info!(
            classifier_url = %self.classifier_url,
            timeout_secs = self.timeout_secs,
            "Loaded PebbloConfig"
        );
        debug!(?self, "PebbloConfig loaded (full debug)");
    }
}
