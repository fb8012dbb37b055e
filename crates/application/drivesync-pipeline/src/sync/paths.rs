use camino::{Utf8Path, Utf8PathBuf};
use drivesync_core::path_utils::DrivePath;
use drivesync_core::PathOverrides;

/// Maps remote names onto local paths, honouring configured overrides.
#[derive(Debug, Clone, Default)]
pub struct PathMapper {
    overrides: PathOverrides,
}

impl PathMapper {
    pub fn new(overrides: PathOverrides) -> Self {
        Self { overrides }
    }

    /// `parent/name`, or the override for `name` verbatim.
    pub fn resolve(&self, parent: &Utf8Path, name: &str) -> Utf8PathBuf {
        DrivePath::resolve(&self.overrides, parent, name)
    }

    /// Resolve a folder and make sure it exists on disk.
    pub async fn resolve_dir(
        &self,
        parent: &Utf8Path,
        name: &str,
    ) -> std::io::Result<Utf8PathBuf> {
        let path = self.resolve(parent, name);
        Self::ensure_dir(&path).await?;
        Ok(path)
    }

    /// Final location of a downloaded file. An override names the file
    /// itself, not its directory.
    pub fn file_target(&self, dir: &Utf8Path, name: &str) -> Utf8PathBuf {
        self.resolve(dir, name)
    }

    /// Create `path` and any missing ancestors; an existing directory is fine.
    pub async fn ensure_dir(path: &Utf8Path) -> std::io::Result<()> {
        if path.as_str().is_empty() || path.is_dir() {
            return Ok(());
        }
        tokio::fs::create_dir_all(path.as_std_path()).await
    }
}
