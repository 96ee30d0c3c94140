//! File operation filtering and location context

use crate::event::{FileOpKind, FileOpPayload};
use serde::{Deserialize, Serialize};
use std::path::Path;

const CLOUD_FOLDERS: [&str; 4] = ["Dropbox", "OneDrive", "Google Drive", "iCloud"];

/// Which file events are worth recording
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FileFilter {
    /// Any path containing one of these fragments is dropped
    pub ignored_fragments: Vec<String>,

    /// `modified` events are kept only for these extensions (lowercase, with dot)
    pub relevant_extensions: Vec<String>,
}

impl Default for FileFilter {
    fn default() -> Self {
        Self {
            ignored_fragments: [
                ".git",
                "__pycache__",
                "node_modules",
                ".DS_Store",
                "Thumbs.db",
                ".pytest_cache",
                ".vscode",
                ".idea",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            relevant_extensions: [".xlsx", ".docx", ".pdf", ".csv", ".txt", ".json", ".xml"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl FileFilter {
    /// Fragment that makes `path` ignorable
    pub fn ignored_fragment(&self, path: &str) -> Option<&str> {
        self.ignored_fragments
            .iter()
            .find(|fragment| path.contains(fragment.as_str()))
            .map(String::as_str)
    }

    /// Whether a modification of a file with this extension is recorded
    pub fn is_relevant_modification(&self, extension: &str) -> bool {
        let extension = extension.to_lowercase();
        self.relevant_extensions.iter().any(|e| e.eq_ignore_ascii_case(&extension))
    }
}

/// Where a file lives, as far as a workflow cares
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileLocation {
    #[serde(default)]
    pub is_download: bool,
    #[serde(default)]
    pub is_desktop: bool,
    #[serde(default)]
    pub is_documents: bool,
    #[serde(default)]
    pub is_cloud: bool,
    #[serde(default)]
    pub parent_folder: String,
}

impl FileLocation {
    pub fn from_path(path: &str) -> Self {
        let parent_folder = Path::new(path)
            .parent()
            .and_then(Path::file_name)
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self {
            is_download: path.contains("Downloads"),
            is_desktop: path.contains("Desktop"),
            is_documents: path.contains("Documents"),
            is_cloud: CLOUD_FOLDERS.iter().any(|cloud| path.contains(cloud)),
            parent_folder,
        }
    }
}

/// Fill file name, extension and location from the effective path
pub fn enrich(payload: &mut FileOpPayload) {
    let effective = payload.effective_path().to_string();
    let path = Path::new(&effective);

    if payload.file_name.is_empty() {
        payload.file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
    }
    if payload.extension.is_empty() {
        payload.extension = path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();
    }
    payload.location = FileLocation::from_path(&effective);
}

/// Verb used in step names
pub fn verb(op: FileOpKind) -> &'static str {
    match op {
        FileOpKind::Created => "Create",
        FileOpKind::Modified => "Modify",
        FileOpKind::Moved => "Move",
        FileOpKind::Deleted => "Delete",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(op: FileOpKind, path: &str, dest: Option<&str>) -> FileOpPayload {
        FileOpPayload {
            op,
            path: path.to_string(),
            dest_path: dest.map(String::from),
            file_name: String::new(),
            extension: String::new(),
            size: None,
            location: FileLocation::default(),
        }
    }

    #[test]
    fn test_default_filter() {
        let filter = FileFilter::default();
        assert_eq!(filter.ignored_fragment("/repo/.git/HEAD"), Some(".git"));
        assert_eq!(filter.ignored_fragment("/home/u/report.xlsx"), None);
        assert!(filter.is_relevant_modification(".XLSX"));
        assert!(!filter.is_relevant_modification(".tmp"));
    }

    #[test]
    fn test_location() {
        let location = FileLocation::from_path("/Users/jo/Downloads/invoice.pdf");
        assert!(location.is_download);
        assert!(!location.is_cloud);
        assert_eq!(location.parent_folder, "Downloads");

        let location = FileLocation::from_path("/Users/jo/Dropbox/Team/plan.docx");
        assert!(location.is_cloud);
        assert_eq!(location.parent_folder, "Team");
    }

    #[test]
    fn test_enrich_uses_destination_for_moves() {
        let mut p = payload(
            FileOpKind::Moved,
            "/Users/jo/Downloads/q3.csv",
            Some("/Users/jo/Documents/reports/q3-final.csv"),
        );
        enrich(&mut p);
        assert_eq!(p.file_name, "q3-final.csv");
        assert_eq!(p.extension, ".csv");
        assert!(p.location.is_documents);
        assert_eq!(p.location.parent_folder, "reports");
    }
}
