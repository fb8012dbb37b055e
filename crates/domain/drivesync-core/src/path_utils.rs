use camino::{Utf8Path, Utf8PathBuf};

use crate::PathOverrides;

pub struct DrivePath;

impl DrivePath {
    /// Make a remote name usable as a single path segment by replacing
    /// path separators with `_`.
    pub fn sanitize_name(name: &str) -> String {
        name.replace(|c: char| c == '/' || c == '\\', "_")
    }

    /// Hierarchical path for `name` under `parent`, unless an override exists.
    pub fn resolve(overrides: &PathOverrides, parent: &Utf8Path, name: &str) -> Utf8PathBuf {
        match overrides.get(name) {
            Some(path) => path.clone(),
            None => parent.join(name),
        }
    }
}
