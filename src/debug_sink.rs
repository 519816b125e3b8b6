//! Filesystem capture of raw result pages.

use std::path::{Path, PathBuf};

use serpent_search::FetchMode;
use serpent_search::debug::DebugSink;

/// Writes each snapshot to `<dir>/<provider>_<mode>_<unix-millis>.html`.
///
/// Inside a tokio runtime the write runs on the blocking pool so the
/// calling search never waits on disk. Write failures are logged and
/// otherwise ignored.
#[derive(Debug, Clone)]
pub struct FileDebugSink {
    dir: PathBuf,
}

impl FileDebugSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn artifact_path(&self, provider: &str, mode: FetchMode) -> PathBuf {
        let millis = chrono::Utc::now().timestamp_millis();
        self.dir.join(format!(
            "{}_{}_{millis}.html",
            provider.to_lowercase(),
            mode.as_str()
        ))
    }
}

fn write_artifact(dir: &Path, path: &Path, provider: &str, snapshot: &str) {
    let written = std::fs::create_dir_all(dir).and_then(|()| std::fs::write(path, snapshot));
    match written {
        Ok(()) => tracing::debug!(provider, path = %path.display(), "saved debug snapshot"),
        Err(e) => tracing::warn!(provider, path = %path.display(), error = %e, "failed to save debug snapshot"),
    }
}

impl DebugSink for FileDebugSink {
    fn persist(&self, provider: &str, mode: FetchMode, snapshot: &str) {
        let path = self.artifact_path(provider, mode);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let dir = self.dir.clone();
                let provider = provider.to_string();
                let snapshot = snapshot.to_string();
                handle.spawn_blocking(move || write_artifact(&dir, &path, &provider, &snapshot));
            }
            Err(_) => write_artifact(&self.dir, &path, provider, snapshot),
        }
    }
}
