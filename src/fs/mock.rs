// src/fs/mock.rs

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::{Result, anyhow};

use super::FileSystem;

/// In-memory filesystem. Directories exist implicitly as prefixes of the
/// stored file paths; `.` components are ignored, so `./src/a.rs` and
/// `src/a.rs` name the same file.
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    files: Arc<Mutex<BTreeMap<PathBuf, Vec<u8>>>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        self.lock().insert(normalize(path.as_ref()), content.into());
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<PathBuf, Vec<u8>>> {
        self.files.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn normalize(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

impl FileSystem for MockFileSystem {
    fn read(&self, path: &Path) -> Result<Vec<u8>> {
        self.lock()
            .get(&normalize(path))
            .cloned()
            .ok_or_else(|| anyhow!("File not found: {:?}", path))
    }

    fn is_file(&self, path: &Path) -> bool {
        self.lock().contains_key(&normalize(path))
    }

    fn is_dir(&self, path: &Path) -> bool {
        let dir = normalize(path);
        self.lock()
            .keys()
            .any(|file| file != &dir && file.starts_with(&dir))
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let dir = normalize(path);
        let children: BTreeSet<PathBuf> = self
            .lock()
            .keys()
            .filter_map(|file| file.strip_prefix(&dir).ok())
            .filter_map(|rest| rest.components().next())
            .map(|first| PathBuf::from(first.as_os_str()))
            .collect();

        if children.is_empty() {
            return Err(anyhow!("Not a directory or not found: {:?}", path));
        }

        Ok(children.into_iter().map(|name| path.join(name)).collect())
    }
}
