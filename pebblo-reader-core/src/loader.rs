//! Loader-doc payload: what was loaded, by which reader, and from where.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Serialize, Serializer};

/// Readers that take a single file.
const FILE_READERS: &[&str] = &[
    "TextFileReader",
    "CSVReader",
    "PandasCSVReader",
    "DocxReader",
    "HWPReader",
    "EpubReader",
    "FlatReader",
    "HTMLTagReader",
    "ImageReader",
    "IPYNBReader",
    "MarkdownReader",
    "MboxReader",
    "PDFReader",
    "PptxReader",
    "RTFReader",
    "VideoAudioReader",
    "JSONReader",
    "XMLReader",
];

/// Readers that walk a directory.
const DIR_READERS: &[&str] = &["SimpleDirectoryReader", "DirectoryReader"];

/// Readers fed from memory rather than the filesystem.
const IN_MEMORY_READERS: &[&str] = &["StringIterableReader", "DataFrameReader"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceType {
    File,
    Directory,
    InMemory,
    Unsupported,
}

impl SourceType {
    /// Classify a reader by its declared name.
    pub fn of_reader(name: &str) -> Self {
        if FILE_READERS.contains(&name) {
            SourceType::File
        } else if DIR_READERS.contains(&name) {
            SourceType::Directory
        } else if IN_MEMORY_READERS.contains(&name) {
            SourceType::InMemory
        } else {
            SourceType::Unsupported
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoaderDetails {
    pub loader: String,
    pub source_path: String,
    pub source_type: SourceType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_path_size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_aggr_size: Option<u64>,
}

/// One loaded document as reported to the classifier.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexedDoc {
    pub doc: String,
    pub source_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<String>,
    pub file_owner: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_path_size: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoaderDoc {
    pub name: String,
    pub owner: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub filename: String,
    pub extension: String,
    pub docs: Vec<IndexedDoc>,
    pub plugin_version: String,
    pub load_id: String,
    pub loader_details: LoaderDetails,
    #[serde(serialize_with = "bool_as_str")]
    pub loading_end: bool,
    pub source_owner: String,
}

// The classifier expects "true"/"false" strings here.
fn bool_as_str<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(if *value { "true" } else { "false" })
}

/// Filesystem facts about one source path.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceInfo {
    pub full_path: PathBuf,
    pub owner: String,
    pub size: Option<u64>,
}

impl SourceInfo {
    pub fn inspect(path: &Path) -> Self {
        let full_path = full_path(path);
        Self {
            owner: file_owner(&full_path),
            size: source_size(&full_path),
            full_path,
        }
    }

    pub fn unknown(path: &Path) -> Self {
        Self {
            full_path: path.to_path_buf(),
            owner: "unknown".to_string(),
            size: None,
        }
    }
}

/// Inspect each distinct path once, on the blocking pool.
pub async fn describe_sources(paths: BTreeSet<PathBuf>) -> BTreeMap<PathBuf, SourceInfo> {
    let fallback = paths.clone();
    let inspect = tokio::task::spawn_blocking(move || {
        paths
            .into_iter()
            .map(|path| {
                let info = SourceInfo::inspect(&path);
                (path, info)
            })
            .collect::<BTreeMap<_, _>>()
    });
    match inspect.await {
        Ok(sources) => sources,
        Err(e) => {
            tracing::warn!(error = %e, "Source inspection task failed");
            fallback
                .into_iter()
                .map(|path| {
                    let info = SourceInfo::unknown(&path);
                    (path, info)
                })
                .collect()
        }
    }
}

/// Absolute form of `path`, falling back to the path as given.
pub fn full_path(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Size in bytes of a file, or of every file below a directory.
pub fn source_size(path: &Path) -> Option<u64> {
    let meta = fs::metadata(path).ok()?;
    if meta.is_file() {
        return Some(meta.len());
    }
    if !meta.is_dir() {
        return None;
    }
    let mut total = 0;
    for entry in fs::read_dir(path).ok()?.flatten() {
        total += source_size(&entry.path()).unwrap_or(0);
    }
    Some(total)
}

/// Owner of a file: the user name on unix when it can be resolved, else the uid.
#[cfg(unix)]
pub fn file_owner(path: &Path) -> String {
    use std::os::unix::fs::MetadataExt;

    let uid = match fs::metadata(path) {
        Ok(meta) => meta.uid(),
        Err(_) => return "unknown".to_string(),
    };
    user_name(uid).unwrap_or_else(|| uid.to_string())
}

#[cfg(not(unix))]
pub fn file_owner(_path: &Path) -> String {
    "unknown".to_string()
}

#[cfg(unix)]
fn user_name(uid: u32) -> Option<String> {
    let passwd = fs::read_to_string("/etc/passwd").ok()?;
    passwd.lines().find_map(|line| {
        let mut fields = line.split(':');
        let name = fields.next()?;
        let entry_uid = fields.nth(1)?.parse::<u32>().ok()?;
        (entry_uid == uid).then(|| name.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn reader_names_map_to_source_types() {
        assert_eq!(SourceType::of_reader("CSVReader"), SourceType::File);
        assert_eq!(SourceType::of_reader("TextFileReader"), SourceType::File);
        assert_eq!(
            SourceType::of_reader("SimpleDirectoryReader"),
            SourceType::Directory
        );
        assert_eq!(
            SourceType::of_reader("StringIterableReader"),
            SourceType::InMemory
        );
        assert_eq!(
            SourceType::of_reader("SomethingElse"),
            SourceType::Unsupported
        );
    }

    #[test]
    fn loading_end_and_source_type_serialise_as_strings() {
        let doc = LoaderDoc {
            name: "app".into(),
            owner: "owner".into(),
            description: None,
            filename: "x".into(),
            extension: "".into(),
            docs: vec![],
            plugin_version: "0.1.0".into(),
            load_id: "id".into(),
            loader_details: LoaderDetails {
                loader: "StringIterableReader".into(),
                source_path: "/tmp/x".into(),
                source_type: SourceType::InMemory,
                source_path_size: None,
                source_aggr_size: Some(0),
            },
            loading_end: true,
            source_owner: "unknown".into(),
        };
        let json = serde_json::to_value(&doc).unwrap();

        assert_eq!(json["loading_end"], "true");
        assert_eq!(json["loader_details"]["source_type"], "in-memory");
        assert!(json["loader_details"].get("source_path_size").is_none());
    }

    #[test]
    fn source_size_sums_directory_contents() {
        let dir = tempfile::tempdir().unwrap();
        let mut a = fs::File::create(dir.path().join("a.txt")).unwrap();
        a.write_all(b"hello").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested/b.txt"), b"abc").unwrap();

        assert_eq!(source_size(&dir.path().join("a.txt")), Some(5));
        assert_eq!(source_size(dir.path()), Some(8));
        assert_eq!(source_size(&dir.path().join("missing")), None);
    }

    #[tokio::test]
    async fn describe_sources_inspects_each_distinct_path() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("rows.csv");
        fs::write(&file, b"a,b\n1,2\n").unwrap();
        let missing = dir.path().join("gone.csv");

        let paths = BTreeSet::from([file.clone(), missing.clone()]);
        let sources = describe_sources(paths).await;

        assert_eq!(sources.len(), 2);
        assert_eq!(sources[&file].size, Some(8));
        assert!(sources[&file].full_path.is_absolute());
        assert_eq!(sources[&missing].size, None);
        assert_eq!(sources[&missing].owner, "unknown");
        assert_eq!(sources[&missing].full_path, missing);
    }
}
