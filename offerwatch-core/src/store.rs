use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::filters::FilterSet;

/// Single-record store holding the last applied filter set.
#[derive(Debug, Clone)]
pub struct FilterStore {
    path: PathBuf,
}

impl FilterStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Missing or blank record means nothing to resume.
    pub async fn load(&self) -> Result<Option<FilterSet>, std::io::Error> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(record) => Ok(FilterSet::from_record(&record)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no saved postal codes");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    pub async fn save(&self, filters: &FilterSet) -> Result<(), std::io::Error> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        // Ecriture atomique
        let tmp = self.path.with_extension("txt.tmp");
        tokio::fs::write(&tmp, filters.to_record()).await?;
        tokio::fs::rename(&tmp, &self.path).await
    }
}
