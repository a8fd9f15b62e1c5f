//! Key/blob storage capability injected into the persistence layer.
//!
//! [`MemoryStore`] keeps blobs in process (tests, ephemeral sessions);
//! [`FileStore`] writes one file per name under a directory.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{MnemoError, Result};

/// Synchronous named-blob storage.
pub trait BlobStore {
    /// `Ok(None)` when nothing is stored under `name`.
    fn load(&self, name: &str) -> Result<Option<Vec<u8>>>;

    fn save(&mut self, name: &str, blob: &[u8]) -> Result<()>;
}

/// In-process blob store.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    blobs: HashMap<String, Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.blobs.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.blobs.keys().map(|s| s.as_str()).collect()
    }

    pub fn remove(&mut self, name: &str) -> bool {
        self.blobs.remove(name).is_some()
    }
}

impl BlobStore for MemoryStore {
    fn load(&self, name: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.blobs.get(name).cloned())
    }

    fn save(&mut self, name: &str, blob: &[u8]) -> Result<()> {
        self.blobs.insert(name.to_string(), blob.to_vec());
        Ok(())
    }
}

/// Directory-backed blob store: `<root>/<name>.json`.
#[derive(Clone, Debug)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Open (creating if needed) the directory at `root`.
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path(&self, name: &str) -> Result<PathBuf> {
        if name.is_empty() || name.contains(['/', '\\']) || name.starts_with('.') {
            return Err(MnemoError::InvalidArgument(format!(
                "invalid blob name {:?}",
                name
            )));
        }
        Ok(self.root.join(format!("{}.json", name)))
    }
}

impl BlobStore for FileStore {
    fn load(&self, name: &str) -> Result<Option<Vec<u8>>> {
        match fs::read(self.path(name)?) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Writes to a temporary sibling and renames it into place.
    fn save(&mut self, name: &str, blob: &[u8]) -> Result<()> {
        let path = self.path(name)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, blob)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}
