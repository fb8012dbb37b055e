use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub mod diff;
pub mod path_utils;

pub type Md5Digest = String;

/// Name → path replacements supplied by configuration. A hit replaces the
/// computed hierarchical path outright.
pub type PathOverrides = HashMap<String, Utf8PathBuf>;

/// MIME type the remote store uses to mark folders.
pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum NodeKind {
    Folder,
    File,
}

impl NodeKind {
    pub fn from_mime_type(mime_type: &str) -> Self {
        if mime_type == FOLDER_MIME_TYPE {
            NodeKind::Folder
        } else {
            NodeKind::File
        }
    }
}

/// One child entry returned by a remote folder listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RemoteNode {
    pub id: String,
    pub name: String,
    pub kind: NodeKind,
    /// Content hash; always `None` for folders and for native documents.
    pub checksum: Option<Md5Digest>,
}

impl RemoteNode {
    pub fn folder(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind: NodeKind::Folder,
            checksum: None,
        }
    }

    pub fn file(id: impl Into<String>, name: impl Into<String>, checksum: Option<&str>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind: NodeKind::File,
            checksum: checksum.map(str::to_string),
        }
    }

    pub fn is_folder(&self) -> bool {
        self.kind == NodeKind::Folder
    }
}

/// Pending breadth-first work item: list `remote_folder_id` into `target_local_path`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderTask {
    pub target_local_path: Utf8PathBuf,
    pub remote_folder_id: String,
}

/// Pending download. `target_local_path` is the containing directory, not
/// yet joined with the file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTask {
    pub target_local_path: Utf8PathBuf,
    pub node: RemoteNode,
}
