use std::collections::BTreeMap;
use std::fs;
use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};

use crate::error::SyncError;

/// Dataset identifier to the last modified marker recorded for it.
pub type WatermarkMap = BTreeMap<String, String>;

#[derive(Debug, Clone)]
pub struct WatermarkStore {
    path: Utf8PathBuf,
}

impl WatermarkStore {
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// A missing file is the first run and yields an empty map.
    pub fn load(&self) -> Result<WatermarkMap, SyncError> {
        if !self.path.as_std_path().exists() {
            return Ok(WatermarkMap::new());
        }
        let content = fs::read_to_string(self.path.as_std_path())
            .map_err(|err| self.read_error(err.to_string()))?;
        serde_json::from_str(&content).map_err(|err| self.read_error(err.to_string()))
    }

    /// Replaces the whole file through a sibling temp file and rename.
    pub fn save(&self, map: &WatermarkMap) -> Result<(), SyncError> {
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_str().is_empty() => parent.to_path_buf(),
            _ => Utf8PathBuf::from("."),
        };
        fs::create_dir_all(parent.as_std_path())
            .map_err(|err| self.persist_error(err.to_string()))?;
        let mut content =
            serde_json::to_vec_pretty(map).map_err(|err| self.persist_error(err.to_string()))?;
        content.push(b'\n');

        let mut temp = tempfile::Builder::new()
            .prefix(".watermark")
            .tempfile_in(parent.as_std_path())
            .map_err(|err| self.persist_error(err.to_string()))?;
        temp.write_all(&content)
            .map_err(|err| self.persist_error(err.to_string()))?;
        temp.persist(self.path.as_std_path())
            .map_err(|err| self.persist_error(err.to_string()))?;
        Ok(())
    }

    fn read_error(&self, message: String) -> SyncError {
        SyncError::WatermarkRead {
            path: self.path.clone().into_std_path_buf(),
            message,
        }
    }

    fn persist_error(&self, message: String) -> SyncError {
        SyncError::WatermarkPersist {
            path: self.path.clone().into_std_path_buf(),
            message,
        }
    }
}
