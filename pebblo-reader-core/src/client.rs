//! HTTP implementation of [`PebbloClient`] over `reqwest`.
//!
//! Both calls are plain JSON POSTs against the configured classifier base URL.
//! Any status code is returned to the caller as a [`PebbloResponse`]; only
//! transport failures become errors.

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::app::App;
use crate::config::PebbloConfig;
use crate::contract::{PebbloClient, PebbloError, PebbloResponse};
use crate::loader::LoaderDoc;

pub const APP_DISCOVER_PATH: &str = "/v1/app/discover";
pub const LOADER_DOC_PATH: &str = "/v1/loader/doc";

pub struct HttpPebbloClient {
    http: Client,
    classifier_url: String,
}

impl HttpPebbloClient {
    pub fn new(config: &PebbloConfig) -> Result<Self, PebbloError> {
        let http = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(PebbloError::Build)?;
        info!(
            classifier_url = %config.classifier_url,
            timeout_secs = config.timeout_secs,
            "Initialized HttpPebbloClient"
        );
        Ok(Self {
            http,
            classifier_url: config.classifier_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn classifier_url(&self) -> &str {
        &self.classifier_url
    }

    async fn post_json<T: Serialize + Sync>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<PebbloResponse, PebbloError> {
        let url = format!("{}{}", self.classifier_url, path);
        debug!(url = %url, "Posting to Pebblo classifier");

        let resp = self
            .http
            .post(&url)
            .header(ACCEPT, "application/json")
            .json(body)
            .send()
            .await
            .map_err(PebbloError::Transport)?;

        let status = resp.status();
        if status != StatusCode::OK && status != StatusCode::BAD_GATEWAY {
            warn!(url = %url, status = status.as_u16(), "Received unexpected HTTP response code");
        }

        let body = resp.text().await.map_err(PebbloError::Transport)?;
        let data = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|json| json.get("data").cloned());
        debug!(url = %url, status = status.as_u16(), body = %body, "Pebblo classifier responded");

        Ok(PebbloResponse {
            status: status.as_u16(),
            data,
        })
    }
}

#[async_trait]
impl PebbloClient for HttpPebbloClient {
    async fn send_discover(&self, app: &App) -> Result<PebbloResponse, PebbloError> {
        info!(app = %app.name, load_id = %app.load_id, "Sending app discovery");
        self.post_json(APP_DISCOVER_PATH, app).await
    }

    async fn send_loader_doc(&self, doc: &LoaderDoc) -> Result<PebbloResponse, PebbloError> {
        info!(
            app = %doc.name,
            load_id = %doc.load_id,
            docs = doc.docs.len(),
            loading_end = doc.loading_end,
            "Sending loader docs"
        );
        self.post_json(LOADER_DOC_PATH, doc).await
    }
}
