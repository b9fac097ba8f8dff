// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JSON document collections on the local filesystem.
//!
//! Every document is one JSON file, written atomically (temp file + rename).
//! Transactions stage writes and deletes in memory; reads and listings made
//! through the same session see the staged state. Commit applies the staged
//! operations under the store's write lock.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use lru::LruCache;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::storage::paths::{self, StoragePaths};
use crate::storage::session::Session;

/// Writes and deletes staged by one session. `None` marks a delete.
#[derive(Debug, Default)]
pub struct DocumentTransaction {
    staged: BTreeMap<PathBuf, Option<Value>>,
}

impl DocumentTransaction {
    pub fn len(&self) -> usize {
        self.staged.len()
    }

    pub fn is_empty(&self) -> bool {
        self.staged.is_empty()
    }

    fn staged(&self, path: &Path) -> Option<&Option<Value>> {
        self.staged.get(path)
    }
}

/// Document store rooted at one directory.
pub struct DocumentStore {
    paths: StoragePaths,
    cache: Mutex<LruCache<PathBuf, Value>>,
    write_lock: Mutex<()>,
}

impl std::fmt::Debug for DocumentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentStore")
            .field("root", &self.paths.root())
            .finish_non_exhaustive()
    }
}

impl DocumentStore {
    /// Open (or create) a store under `root`.
    pub fn open(root: impl AsRef<Path>, cache_capacity: NonZeroUsize) -> Result<Self> {
        let paths = StoragePaths::new(root);
        for dir in [
            paths.root().join("users"),
            paths.public_items_dir(),
            paths.share_items_dir(),
        ] {
            fs::create_dir_all(&dir)?;
        }
        Ok(Self {
            paths,
            cache: Mutex::new(LruCache::new(cache_capacity)),
            write_lock: Mutex::new(()),
        })
    }

    pub fn paths(&self) -> &StoragePaths {
        &self.paths
    }

    // ========== Session-Aware Operations ==========

    /// Read one document.
    pub fn read(&self, session: &Session, path: &Path) -> Result<Option<Value>> {
        if let Some(staged) = session.document_ref().and_then(|tx| tx.staged(path)) {
            return Ok(staged.clone());
        }
        self.read_committed(path)
    }

    /// Write one document, staged when the session is transactional.
    pub fn write(&self, session: &mut Session, path: PathBuf, value: Value) -> Result<()> {
        match session.document() {
            Some(tx) => {
                tx.staged.insert(path, Some(value));
                Ok(())
            }
            None => {
                let _guard = self.lock()?;
                self.write_file(&path, &value)
            }
        }
    }

    /// Delete one document. Missing documents are not an error.
    pub fn delete(&self, session: &mut Session, path: PathBuf) -> Result<()> {
        match session.document() {
            Some(tx) => {
                tx.staged.insert(path, None);
                Ok(())
            }
            None => {
                let _guard = self.lock()?;
                self.remove_file(&path)
            }
        }
    }

    /// Every document directly inside `dir`.
    pub fn list(&self, session: &Session, dir: &Path) -> Result<Vec<Value>> {
        let mut documents = BTreeMap::new();

        match fs::read_dir(dir) {
            Ok(entries) => {
                for entry in entries {
                    let path = entry?.path();
                    if !path.is_file() || !paths::is_document(&path) {
                        continue;
                    }
                    if let Some(value) = self.read_committed(&path)? {
                        documents.insert(path, value);
                    }
                }
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        if let Some(tx) = session.document_ref() {
            for (path, staged) in &tx.staged {
                if path.parent() != Some(dir) {
                    continue;
                }
                match staged {
                    Some(value) => documents.insert(path.clone(), value.clone()),
                    None => documents.remove(path),
                };
            }
        }

        Ok(documents.into_values().collect())
    }

    /// Apply a transaction's staged operations.
    pub fn apply(&self, tx: DocumentTransaction) -> Result<()> {
        let _guard = self.lock()?;
        let count = tx.staged.len();
        for (path, staged) in tx.staged {
            match staged {
                Some(value) => self.write_file(&path, &value)?,
                None => self.remove_file(&path)?,
            }
        }
        tracing::debug!(operations = count, "document transaction committed");
        Ok(())
    }

    // ========== File Operations ==========

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, ()>> {
        self.write_lock
            .lock()
            .map_err(|_| Error::internal("document store write lock poisoned"))
    }

    fn read_committed(&self, path: &Path) -> Result<Option<Value>> {
        if let Some(value) = self.cache_get(path) {
            return Ok(Some(value));
        }

        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let value: Value = serde_json::from_reader(BufReader::new(file))?;
        self.cache_put(path, &value);
        Ok(Some(value))
    }

    fn write_file(&self, path: &Path, value: &Value) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let temp_path = path.with_extension("tmp");
        {
            let file = File::create(&temp_path)?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer(&mut writer, value)?;
            writer.flush()?;
        }
        fs::rename(&temp_path, path)?;

        self.invalidate(path);
        Ok(())
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        self.invalidate(path);
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    // ========== Read Cache ==========

    fn cache_get(&self, path: &Path) -> Option<Value> {
        let mut cache = self.cache.lock().ok()?;
        cache.get(path).cloned()
    }

    fn cache_put(&self, path: &Path, value: &Value) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.put(path.to_path_buf(), value.clone());
        }
    }

    fn invalidate(&self, path: &Path) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.pop(path);
        }
    }

    #[cfg(test)]
    pub(crate) fn cached(&self, path: &Path) -> bool {
        self.cache
            .lock()
            .map(|cache| cache.contains(path))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::session::ActiveTransaction;
    use serde_json::json;

    fn store(dir: &tempfile::TempDir) -> DocumentStore {
        DocumentStore::open(dir.path(), NonZeroUsize::new(8).unwrap()).unwrap()
    }

    fn transactional() -> Session {
        Session::with(ActiveTransaction::Document(DocumentTransaction::default()))
    }

    #[test]
    fn ambient_write_read_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        let mut session = Session::ambient();
        let path = store.paths().public_item("i1").unwrap();

        store.write(&mut session, path.clone(), json!({"a": 1})).unwrap();
        assert_eq!(store.read(&session, &path).unwrap(), Some(json!({"a": 1})));
        assert!(path.exists());

        store.delete(&mut session, path.clone()).unwrap();
        assert_eq!(store.read(&session, &path).unwrap(), None);
        store.delete(&mut session, path).unwrap();
    }

    #[test]
    fn reads_are_cached_and_writes_invalidate() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        let mut session = Session::ambient();
        let path = store.paths().public_item("i1").unwrap();

        store.write(&mut session, path.clone(), json!(1)).unwrap();
        assert!(!store.cached(&path));
        store.read(&session, &path).unwrap();
        assert!(store.cached(&path));

        store.write(&mut session, path.clone(), json!(2)).unwrap();
        assert!(!store.cached(&path));
        assert_eq!(store.read(&session, &path).unwrap(), Some(json!(2)));
    }

    #[test]
    fn staged_writes_are_private_until_applied() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        let ambient = Session::ambient();
        let mut session = transactional();
        let dir_path = store.paths().share_items_dir();
        let path = store.paths().share_item("s1").unwrap();

        store.write(&mut session, path.clone(), json!({"v": 1})).unwrap();
        assert_eq!(store.read(&session, &path).unwrap(), Some(json!({"v": 1})));
        assert_eq!(store.list(&session, &dir_path).unwrap().len(), 1);
        assert_eq!(store.read(&ambient, &path).unwrap(), None);
        assert!(store.list(&ambient, &dir_path).unwrap().is_empty());

        let Some(ActiveTransaction::Document(tx)) = session.into_active() else {
            panic!("expected document transaction");
        };
        store.apply(tx).unwrap();
        assert_eq!(store.read(&ambient, &path).unwrap(), Some(json!({"v": 1})));
    }

    #[test]
    fn staged_delete_hides_committed_document() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        let mut ambient = Session::ambient();
        let path = store.paths().public_item("i1").unwrap();
        store.write(&mut ambient, path.clone(), json!(1)).unwrap();

        let mut session = transactional();
        store.delete(&mut session, path.clone()).unwrap();
        assert_eq!(store.read(&session, &path).unwrap(), None);
        assert!(store
            .list(&session, &store.paths().public_items_dir())
            .unwrap()
            .is_empty());

        drop(session);
        assert!(path.exists());
    }
}
