//! # safe_reader: a reporting wrapper around any [`Reader`]
//!
//! [`PebbloSafeReader`] delegates the actual parsing to an injected reader and
//! reports every load to a Pebblo classifier through a [`PebbloClient`]:
//!
//! 1. [`PebbloSafeReader::discover`] announces the application once (name, owner,
//!    description, runtime, load id). The first [`load`](PebbloSafeReader::load)
//!    does it when the caller has not.
//! 2. [`PebbloSafeReader::load`] runs the delegate, rewrites each document's metadata
//!    to exactly `{filename, extension}`, posts a loader-doc payload and returns the
//!    documents in delegate order.
//!
//! # Error Handling
//! - Delegate errors are returned as-is; nothing is reported for a failed load.
//! - Classifier errors never reach the caller. They are logged at `warn` and the
//!    load carries on.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::app::{self, App, PLUGIN_VERSION};
use crate::contract::{Document, Metadata, PebbloClient, Reader, ReaderError};
use crate::loader::{self, IndexedDoc, LoaderDetails, LoaderDoc, SourceInfo, SourceType};

/// Descriptive fields sent along with every load.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SafeReaderConfig {
    pub app_name: String,
    pub owner: String,
    pub description: String,
}

#[derive(Debug, PartialEq)]
pub enum SafeReaderError {
    InvalidName,
}

impl fmt::Display for SafeReaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SafeReaderError::InvalidName => write!(f, "must specify a valid app name"),
        }
    }
}

impl std::error::Error for SafeReaderError {}

pub struct PebbloSafeReader<R, C> {
    reader: R,
    client: C,
    config: SafeReaderConfig,
    app: App,
    discover_attempted: AtomicBool,
    discover_sent: AtomicBool,
    loader_sent: AtomicBool,
}

impl<R, C> PebbloSafeReader<R, C>
where
    R: Reader,
    C: PebbloClient,
{
    /// Wrap `reader`. Nothing is sent until [`discover`](Self::discover) or [`load`](Self::load).
    pub fn new(reader: R, client: C, config: SafeReaderConfig) -> Result<Self, SafeReaderError> {
        if config.app_name.trim().is_empty() {
            return Err(SafeReaderError::InvalidName);
        }
        let load_id = uuid::Uuid::new_v4().to_string();
        let app = App::new(
            &config.app_name,
            &config.owner,
            &config.description,
            &load_id,
        );
        info!(
            app = %config.app_name,
            owner = %config.owner,
            loader = %reader.name(),
            load_id = %load_id,
            "Created PebbloSafeReader"
        );
        Ok(Self {
            reader,
            client,
            config,
            app,
            discover_attempted: AtomicBool::new(false),
            discover_sent: AtomicBool::new(false),
            loader_sent: AtomicBool::new(false),
        })
    }

    /// [`new`](Self::new) followed by [`discover`](Self::discover), so the app is
    /// announced before the first load.
    pub async fn connect(
        reader: R,
        client: C,
        config: SafeReaderConfig,
    ) -> Result<Self, SafeReaderError> {
        let safe_reader = Self::new(reader, client, config)?;
        safe_reader.discover().await;
        Ok(safe_reader)
    }

    pub fn config(&self) -> &SafeReaderConfig {
        &self.config
    }

    pub fn app(&self) -> &App {
        &self.app
    }

    pub fn load_id(&self) -> &str {
        &self.app.load_id
    }

    /// Whether the classifier accepted the app discovery.
    pub fn discover_sent(&self) -> bool {
        self.discover_sent.load(Ordering::SeqCst)
    }

    /// Whether a final loader-doc report has been attempted.
    pub fn loader_sent(&self) -> bool {
        self.loader_sent.load(Ordering::SeqCst)
    }

    /// Announce the application to the classifier. Best-effort.
    pub async fn discover(&self) {
        self.discover_attempted.store(true, Ordering::SeqCst);
        let mut payload = self.app.clone();
        payload.runtime.ip = app::host_ip(&payload.runtime.host).await;

        match self.client.send_discover(&payload).await {
            Ok(resp) if resp.is_accepted() => {
                self.discover_sent.store(true, Ordering::SeqCst);
                info!(app = %self.app.name, status = resp.status, "App discovery sent");
            }
            Ok(resp) => {
                warn!(app = %self.app.name, status = resp.status, "App discovery not accepted");
            }
            Err(e) => {
                warn!(app = %self.app.name, error = %e, "Unable to send app discovery");
            }
        }
    }

    /// Load `path` through the delegate and report the result.
    pub async fn load(&self, path: &Path) -> Result<Vec<Document>, ReaderError> {
        if !self.discover_attempted.swap(true, Ordering::SeqCst) {
            self.discover().await;
        }

        debug!(app = %self.config.app_name, path = %path.display(), "Delegating load");
        let mut docs = self.reader.load_data(path).await?;

        let payload = self.loader_doc(path, &docs).await;

        let metadata = file_metadata(path);
        for doc in docs.iter_mut() {
            doc.metadata = metadata.clone();
        }

        self.send_loader_doc(&payload).await;
        info!(
            app = %self.config.app_name,
            path = %path.display(),
            docs = docs.len(),
            "Loaded documents"
        );
        Ok(docs)
    }

    async fn send_loader_doc(&self, payload: &LoaderDoc) {
        match self.client.send_loader_doc(payload).await {
            Ok(resp) if resp.is_accepted() => {
                debug!(status = resp.status, "Loader docs sent");
            }
            Ok(resp) => {
                warn!(status = resp.status, "Loader docs not accepted");
            }
            Err(e) => {
                warn!(error = %e, "Unable to send loader docs");
            }
        }
        if payload.loading_end {
            self.loader_sent.store(true, Ordering::SeqCst);
        }
    }

    /// Build the report for a finished load, from the delegate's own metadata.
    /// Each distinct source path is inspected once.
    async fn loader_doc(&self, path: &Path, docs: &[Document]) -> LoaderDoc {
        let loader_name = self.reader.name();

        let mut paths: BTreeSet<PathBuf> = docs
            .iter()
            .filter_map(|doc| doc.metadata.get("file_path").map(PathBuf::from))
            .collect();
        paths.insert(path.to_path_buf());
        let sources = loader::describe_sources(paths).await;

        let source = source_info(&sources, path);
        let mut aggr_size = 0u64;

        let indexed = docs
            .iter()
            .map(|doc| {
                let doc_source = match doc.metadata.get("file_path") {
                    Some(p) => source_info(&sources, Path::new(p)),
                    None => source.clone(),
                };
                aggr_size += doc.text.len() as u64;
                IndexedDoc {
                    doc: doc.text.clone(),
                    source_path: doc_source.full_path.display().to_string(),
                    last_modified: doc.metadata.get("last_modified").cloned(),
                    file_owner: doc_source.owner,
                    source_path_size: doc_source.size,
                }
            })
            .collect();

        let file = file_metadata(path);
        LoaderDoc {
            name: self.config.app_name.clone(),
            owner: self.config.owner.clone(),
            description: self.app.description.clone(),
            filename: file.get("filename").cloned().unwrap_or_default(),
            extension: file.get("extension").cloned().unwrap_or_default(),
            docs: indexed,
            plugin_version: PLUGIN_VERSION.to_string(),
            load_id: self.app.load_id.clone(),
            loader_details: LoaderDetails {
                source_type: SourceType::of_reader(&loader_name),
                loader: loader_name,
                source_path: source.full_path.display().to_string(),
                source_path_size: source.size,
                source_aggr_size: Some(source.size.unwrap_or(0) + aggr_size),
            },
            loading_end: true,
            source_owner: source.owner,
        }
    }
}

fn source_info(sources: &BTreeMap<PathBuf, SourceInfo>, path: &Path) -> SourceInfo {
    sources
        .get(path)
        .cloned()
        .unwrap_or_else(|| SourceInfo::unknown(path))
}

#[async_trait]
impl<R, C> Reader for PebbloSafeReader<R, C>
where
    R: Reader,
    C: PebbloClient,
{
    fn name(&self) -> String {
        "PebbloSafeReader".to_string()
    }

    async fn load_data(&self, path: &Path) -> Result<Vec<Document>, ReaderError> {
        self.load(path).await
    }
}

/// `{filename, extension}` of `path`; the extension keeps its leading dot.
pub fn file_metadata(path: &Path) -> Metadata {
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = path
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default();

    let mut metadata = Metadata::new();
    metadata.insert("filename".to_string(), filename);
    metadata.insert("extension".to_string(), extension);
    metadata
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_metadata_keeps_the_dot() {
        let meta = file_metadata(Path::new("/data/test_nominal.csv"));
        assert_eq!(meta.get("filename").map(String::as_str), Some("test_nominal.csv"));
        assert_eq!(meta.get("extension").map(String::as_str), Some(".csv"));
        assert_eq!(meta.len(), 2);
    }

    #[test]
    fn file_metadata_without_extension() {
        let meta = file_metadata(Path::new("notes/README"));
        assert_eq!(meta.get("filename").map(String::as_str), Some("README"));
        assert_eq!(meta.get("extension").map(String::as_str), Some(""));

        let meta = file_metadata(Path::new("archive.tar.gz"));
        assert_eq!(meta.get("extension").map(String::as_str), Some(".gz"));
    }
}
