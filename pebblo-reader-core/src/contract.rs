//! # contract: the two seams of the safe reader
//!
//! This module defines the data model shared by every reader and the two traits
//! the [`PebbloSafeReader`](crate::safe_reader::PebbloSafeReader) is built on:
//!
//! - [`Reader`]: anything that turns a path into an ordered list of [`Document`]s.
//!   The safe reader wraps one and also implements it.
//! - [`PebbloClient`]: the notification side-channel to a Pebblo classifier.
//!
//! ## Mocking & Testing
//! - Both traits are annotated for `mockall`; `MockReader` and `MockPebbloClient`
//!   are exported with the `test-export-mocks` feature so dependents can use them.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use async_trait::async_trait;
use mockall::automock;
use serde::{Deserialize, Serialize};

use crate::app::App;
use crate::loader::LoaderDoc;

/// Document metadata. Ordered so serialised output is stable.
pub type Metadata = BTreeMap<String, String>;

/// A unit of extracted content plus its metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub text: String,
    #[serde(default)]
    pub metadata: Metadata,
}

impl Document {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            metadata: Metadata::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Error type for the Reader trait (boxed, passed through untouched by wrappers).
pub type ReaderError = Box<dyn std::error::Error + Send + Sync>;

/// Trait for loading documents from a filesystem path.
/// Implemented by concrete format readers, by the safe reader itself, and by mocks.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Reader: Send + Sync {
    /// Short type name of the reader, used to classify the load source.
    fn name(&self) -> String;

    /// Load the documents found at `path`, in source order.
    async fn load_data(&self, path: &Path) -> Result<Vec<Document>, ReaderError>;
}

/// What the classifier answered. The body's `data` field is kept but never interpreted.
#[derive(Debug, Clone, PartialEq)]
pub struct PebbloResponse {
    pub status: u16,
    pub data: Option<serde_json::Value>,
}

impl PebbloResponse {
    /// 200 and 502 both count as the classifier having taken the request.
    pub fn is_accepted(&self) -> bool {
        self.status == 200 || self.status == 502
    }
}

#[derive(Debug)]
pub enum PebbloError {
    /// The HTTP client could not be constructed.
    Build(reqwest::Error),
    /// The request never produced a response (connect, timeout, body read).
    Transport(reqwest::Error),
    Other(String),
}

impl fmt::Display for PebbloError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PebbloError::Build(e) => write!(f, "failed to build Pebblo HTTP client: {e}"),
            PebbloError::Transport(e) => write!(f, "unable to reach Pebblo server: {e}"),
            PebbloError::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for PebbloError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PebbloError::Build(e) | PebbloError::Transport(e) => Some(e),
            PebbloError::Other(_) => None,
        }
    }
}

/// Trait for the notification calls made to a Pebblo classifier.
/// The HTTP implementation lives in [`crate::client`]; tests use `MockPebbloClient`.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait PebbloClient: Send + Sync {
    /// Announce the application (sent once per safe reader).
    async fn send_discover(&self, app: &App) -> Result<PebbloResponse, PebbloError>;

    /// Report the documents of a single load.
    async fn send_loader_doc(&self, doc: &LoaderDoc) -> Result<PebbloResponse, PebbloError>;
}
