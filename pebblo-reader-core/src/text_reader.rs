use std::path::Path;

use async_trait::async_trait;
use tracing::{debug, error};

use crate::contract::{Document, Reader, ReaderError};

/// Reads a whole UTF-8 file into a single document.
#[derive(Debug, Default, Clone, Copy)]
pub struct TextFileReader;

#[async_trait]
impl Reader for TextFileReader {
    fn name(&self) -> String {
        "TextFileReader".to_string()
    }

    async fn load_data(&self, path: &Path) -> Result<Vec<Document>, ReaderError> {
        let text = tokio::fs::read_to_string(path).await.map_err(|e| {
            error!(error = ?e, path = %path.display(), "Failed to read text file");
            e
        })?;
        debug!(path = %path.display(), bytes = text.len(), "Read text file");
        Ok(vec![
            Document::new(text).with_metadata("file_path", path.display().to_string())
        ])
    }
}
