//! # Upload Validation
//!
//! Boundary checks for files offered to the upload card. A file is accepted
//! only when its extension is one of [`ALLOWED_EXTENSIONS`] (any case) and it
//! is strictly smaller than [`MAX_FILE_BYTES`]. Rejected files never reach
//! the list. Accepting a file does not send it anywhere.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::debug;
use serde::Serialize;

/// Component tag of the upload card.
pub const CARD_TAG: &str = "file_upload";

pub const ALLOWED_EXTENSIONS: [&str; 6] = ["csv", "sql", "json", "xlsx", "xls", "txt"];

/// 10 MiB. Sizes must be strictly below this.
pub const MAX_FILE_BYTES: u64 = 10 * 1024 * 1024;

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
    pub name: String,
    pub size_bytes: u64,
    /// Lowercased, without the dot.
    pub extension: String,
}

impl UploadedFile {
    /// Size in MiB with two decimals, e.g. `1.00 MB`.
    pub fn size_label(&self) -> String {
        format!("{:.2} MB", self.size_bytes as f64 / 1024.0 / 1024.0)
    }
}

#[derive(Debug)]
pub enum UploadError {
    UnsupportedType { name: String },
    TooLarge { name: String, size_bytes: u64 },
    Unreadable { path: PathBuf, source: io::Error },
}

impl fmt::Display for UploadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadError::UnsupportedType { name } => write!(
                f,
                "unsupported file type: {name} (only {} are supported)",
                ALLOWED_EXTENSIONS
                    .iter()
                    .map(|ext| format!(".{ext}"))
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            UploadError::TooLarge { name, .. } => {
                write!(f, "{name} is too large (files must be under 10 MB)")
            }
            UploadError::Unreadable { path, source } => {
                write!(f, "cannot read {}: {source}", path.display())
            }
        }
    }
}

impl std::error::Error for UploadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            UploadError::Unreadable { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Lowercased text after the last dot, if any.
fn extension_of(name: &str) -> Option<String> {
    name.rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty())
}

/// Check a file by name and size.
pub fn validate(name: &str, size_bytes: u64) -> Result<UploadedFile, UploadError> {
    let extension = extension_of(name)
        .filter(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
        .ok_or_else(|| UploadError::UnsupportedType {
            name: name.to_string(),
        })?;

    if size_bytes >= MAX_FILE_BYTES {
        return Err(UploadError::TooLarge {
            name: name.to_string(),
            size_bytes,
        });
    }

    Ok(UploadedFile {
        name: name.to_string(),
        size_bytes,
        extension,
    })
}

/// Stat a path on disk and validate it.
pub fn inspect(path: &Path) -> Result<UploadedFile, UploadError> {
    let unreadable = |source| UploadError::Unreadable {
        path: path.to_path_buf(),
        source,
    };
    let metadata = fs::metadata(path).map_err(unreadable)?;
    if !metadata.is_file() {
        return Err(unreadable(io::Error::new(
            io::ErrorKind::InvalidInput,
            "not a regular file",
        )));
    }
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    debug!("Inspecting upload candidate {} ({} bytes)", name, metadata.len());
    validate(&name, metadata.len())
}

fn to_path(raw: String) -> PathBuf {
    match raw.strip_prefix("file://") {
        Some(rest) => PathBuf::from(rest),
        None => PathBuf::from(raw),
    }
}

/// Split pasted text into candidate paths.
///
/// Terminals paste dropped files as one path per line, or space-separated
/// with backslash-escaped spaces, sometimes quoted or as `file://` URLs.
pub fn split_pasted_paths(pasted: &str) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    for line in pasted.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let mut current = String::new();
        let mut quote: Option<char> = None;
        let mut chars = line.chars();
        while let Some(c) = chars.next() {
            match (c, quote) {
                ('\\', None) => {
                    if let Some(next) = chars.next() {
                        current.push(next);
                    }
                }
                ('\'' | '"', None) => quote = Some(c),
                (c, Some(q)) if c == q => quote = None,
                (' ', None) => {
                    if !current.is_empty() {
                        paths.push(to_path(std::mem::take(&mut current)));
                    }
                }
                (c, _) => current.push(c),
            }
        }
        if !current.is_empty() {
            paths.push(to_path(current));
        }
    }
    paths
}

/// Ordered list of accepted files. A name appears at most once; adding a
/// file with a known name replaces the earlier entry in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UploadList {
    files: Vec<UploadedFile>,
}

impl UploadList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn files(&self) -> &[UploadedFile] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn add(&mut self, file: UploadedFile) {
        match self.files.iter_mut().find(|f| f.name == file.name) {
            Some(existing) => *existing = file,
            None => self.files.push(file),
        }
    }

    pub fn remove_last(&mut self) -> Option<UploadedFile> {
        self.files.pop()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIB: u64 = 1024 * 1024;

    #[test]
    fn rejects_disallowed_extension() {
        let err = validate("report.pdf", MIB).unwrap_err();
        assert!(matches!(err, UploadError::UnsupportedType { .. }));
        assert!(err.to_string().contains("report.pdf"));
    }

    #[test]
    fn rejects_oversized_file() {
        let err = validate("data.csv", 11 * MIB).unwrap_err();
        assert!(matches!(err, UploadError::TooLarge { .. }));
    }

    #[test]
    fn size_limit_is_strict() {
        assert!(validate("data.csv", MAX_FILE_BYTES).is_err());
        assert!(validate("data.csv", MAX_FILE_BYTES - 1).is_ok());
    }

    #[test]
    fn accepts_small_allowed_file_once() {
        let mut list = UploadList::new();
        list.add(validate("data.csv", MIB).unwrap());
        list.add(validate("data.csv", MIB).unwrap());
        assert_eq!(list.len(), 1);
        assert_eq!(list.files()[0].name, "data.csv");
        assert_eq!(list.files()[0].extension, "csv");
        assert_eq!(list.files()[0].size_label(), "1.00 MB");
    }

    #[test]
    fn extension_check_ignores_case() {
        let file = validate("Sales.XLSX", 2048).unwrap();
        assert_eq!(file.extension, "xlsx");
    }

    #[test]
    fn name_without_extension_is_rejected() {
        assert!(validate("Makefile", 10).is_err());
        assert!(validate("trailing.", 10).is_err());
    }

    #[test]
    fn splits_dropped_paths() {
        let paths = split_pasted_paths("/tmp/a.csv /tmp/my\\ file.json\n'/tmp/b c.txt'");
        assert_eq!(
            paths,
            vec![
                PathBuf::from("/tmp/a.csv"),
                PathBuf::from("/tmp/my file.json"),
                PathBuf::from("/tmp/b c.txt"),
            ]
        );
    }

    #[test]
    fn file_urls_become_paths() {
        assert_eq!(
            split_pasted_paths("file:///tmp/data.csv"),
            vec![PathBuf::from("/tmp/data.csv")]
        );
    }

    #[test]
    fn inspect_reports_missing_file() {
        let err = inspect(Path::new("/definitely/not/here.csv")).unwrap_err();
        assert!(matches!(err, UploadError::Unreadable { .. }));
    }

    #[test]
    fn inspect_reads_real_file_size() {
        let dir = std::env::temp_dir().join(format!("parlor-upload-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("sample.csv");
        fs::write(&path, "a,b\n1,2\n").unwrap();

        let file = inspect(&path).unwrap();
        assert_eq!(file.name, "sample.csv");
        assert_eq!(file.size_bytes, 8);

        fs::remove_dir_all(&dir).unwrap();
    }
}
