use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use imsto_config::Config;
use imsto_types::ContentHash;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::error::{StoreError, StoreResult};
use crate::key::{is_relative_path, storage_key, META_SUFFIX};
use crate::list::{ListItem, ListSpec};
use crate::meta::Meta;
use crate::traits::Wagon;

/// Registered name of the filesystem engine.
pub const ENGINE_NAME: &str = "file";

/// Config key naming the storage root.
pub const ROOT_KEY: &str = "local_root";

/// Local filesystem storage engine.
///
/// Each object is a file at `root/<shard path>` with its metadata in a JSON
/// sidecar next to it (`<file>.meta`). The blob is written before the
/// sidecar; if the sidecar write fails the error is returned and the blob
/// stays on disk.
#[derive(Clone, Debug)]
pub struct FileWagon {
    root: PathBuf,
}

impl FileWagon {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Registry constructor: reads `local_root` for `roof`.
    pub fn from_config(roof: &str, config: &dyn Config) -> StoreResult<Self> {
        let root = config
            .value(roof, ROOT_KEY)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| StoreError::Config(format!("{ROOT_KEY} is empty for roof {roof:?}")))?;
        debug!(roof, %root, "file engine configured");
        Ok(Self::new(root))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn locate(&self, id: &str) -> StoreResult<(String, PathBuf)> {
        let key = storage_key(id)?;
        let path = self.root.join(&key);
        Ok((key, path))
    }
}

impl FileWagon {
    /// Fill in etags for a listed page, dropping objects deleted since the
    /// walk saw them.
    fn with_etags(&self, page: Vec<ListItem>) -> StoreResult<Vec<ListItem>> {
        let mut out = Vec::with_capacity(page.len());
        for mut item in page {
            if !item.is_prefix {
                match fs::read(self.root.join(&item.key)) {
                    Ok(data) => item.etag = ContentHash::compute(&data).to_string(),
                    Err(e) if e.kind() == ErrorKind::NotFound => {
                        debug!(key = %item.key, "object vanished during list");
                        continue;
                    }
                    Err(e) => return Err(e.into()),
                }
            }
            out.push(item);
        }
        Ok(out)
    }
}

fn vanished(err: Option<&std::io::Error>) -> bool {
    err.is_some_and(|e| e.kind() == ErrorKind::NotFound)
}

fn sidecar(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(META_SUFFIX);
    PathBuf::from(name)
}

fn not_found_or_io(key: String) -> impl FnOnce(std::io::Error) -> StoreError {
    move |e| match e.kind() {
        ErrorKind::NotFound => StoreError::NotFound(key),
        _ => StoreError::Io(e),
    }
}

impl Wagon for FileWagon {
    fn name(&self) -> &str {
        ENGINE_NAME
    }

    fn get(&self, id: &str) -> StoreResult<Vec<u8>> {
        let (key, path) = self.locate(id)?;
        fs::read(&path).map_err(not_found_or_io(key))
    }

    fn put(&self, id: &str, data: &[u8], meta: &Meta) -> StoreResult<Meta> {
        let (key, path) = self.locate(id)?;
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        if let Err(e) = fs::write(&path, data) {
            warn!(path = %path.display(), id, error = %e, "write file failed");
            return Err(e.into());
        }

        let stored = meta.stamped(ENGINE_NAME, &key, data.len());
        let meta_path = sidecar(&path);
        let encoded =
            serde_json::to_vec(&stored).map_err(|e| StoreError::Serialization(e.to_string()))?;
        if let Err(e) = fs::write(&meta_path, encoded) {
            warn!(path = %meta_path.display(), id, error = %e, "write meta failed, blob left in place");
            return Err(e.into());
        }

        info!(%key, size = data.len(), "stored");
        Ok(stored)
    }

    fn exists(&self, id: &str) -> StoreResult<bool> {
        let (_, path) = self.locate(id)?;
        match fs::metadata(&path) {
            Ok(md) => Ok(md.is_file()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn delete(&self, id: &str) -> StoreResult<()> {
        let (key, path) = self.locate(id)?;
        fs::remove_file(&path).map_err(not_found_or_io(key.clone()))?;
        match fs::remove_file(sidecar(&path)) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(%key, "deleted blob had no sidecar");
            }
            Err(e) => return Err(e.into()),
        }
        info!(%key, "deleted");
        Ok(())
    }

    fn list(&self, spec: &ListSpec) -> StoreResult<Vec<ListItem>> {
        // Keys under a prefix share its directory; start the walk there.
        let start = match spec.prefix_dir().filter(|dir| is_relative_path(dir)) {
            Some(dir) => self.root.join(dir),
            None => self.root.clone(),
        };
        match fs::metadata(&start) {
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        }

        let mut items = Vec::new();
        for entry in WalkDir::new(&start).min_depth(1) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) if vanished(e.io_error()) => continue,
                Err(e) => return Err(std::io::Error::from(e).into()),
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(rel) = entry.path().strip_prefix(&self.root) else {
                continue;
            };
            let key = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            if key.ends_with(META_SUFFIX) || !spec.admits(&key) {
                continue;
            }
            let md = match entry.metadata() {
                Ok(md) => md,
                Err(e) if vanished(e.io_error()) => continue,
                Err(e) => return Err(std::io::Error::from(e).into()),
            };
            let modified: DateTime<Utc> = md.modified().map(DateTime::from).unwrap_or_default();
            items.push(ListItem::new(key, String::new(), md.len(), modified));
        }

        let page = spec.apply(items);
        if spec.keys_only {
            return Ok(page);
        }
        self.with_etags(page)
    }

    fn meta(&self, id: &str) -> StoreResult<Meta> {
        let (key, path) = self.locate(id)?;
        let raw = fs::read(sidecar(&path)).map_err(not_found_or_io(key))?;
        serde_json::from_slice(&raw).map_err(|e| StoreError::Serialization(e.to_string()))
    }
}
