// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Path layout for the document store and object names for the blob store.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Blob root for private item text.
pub const USERS_ROOT: &str = "users";
/// Blob root for public item text.
pub const PUBLIC_ROOT: &str = "public";
/// Blob root for share snapshots.
pub const SHARES_ROOT: &str = "shares";

/// Suffix of every blob object.
pub const BLOB_SUFFIX: &str = ".txt.gz";

const DOCUMENT_EXT: &str = "json";

/// Reject ids that would escape their directory or object prefix.
pub fn safe_segment(segment: &str) -> Result<&str> {
    if segment.is_empty()
        || segment == "."
        || segment == ".."
        || segment.contains(['/', '\\', '\0'])
    {
        return Err(Error::invalid(format!("invalid path segment: {segment:?}")));
    }
    Ok(segment)
}

/// Document store layout.
///
/// ```text
/// <root>/
///   users/{uid}/items/{item_id}.json
///   users/{uid}/settings/{diagram}.json
///   users/{uid}/gists/{gist_id}.json
///   public_items/{item_id}.json
///   share_items/{share_id}.json
/// ```
#[derive(Debug, Clone)]
pub struct StoragePaths {
    root: PathBuf,
}

impl StoragePaths {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    // ========== User Paths ==========

    pub fn user_dir(&self, user_id: &str) -> Result<PathBuf> {
        Ok(self.root.join("users").join(safe_segment(user_id)?))
    }

    pub fn items_dir(&self, user_id: &str) -> Result<PathBuf> {
        Ok(self.user_dir(user_id)?.join("items"))
    }

    pub fn item(&self, user_id: &str, item_id: &str) -> Result<PathBuf> {
        document(self.items_dir(user_id)?, item_id)
    }

    pub fn settings(&self, user_id: &str, diagram: &str) -> Result<PathBuf> {
        document(self.user_dir(user_id)?.join("settings"), diagram)
    }

    pub fn gists_dir(&self, user_id: &str) -> Result<PathBuf> {
        Ok(self.user_dir(user_id)?.join("gists"))
    }

    pub fn gist(&self, user_id: &str, gist_id: &str) -> Result<PathBuf> {
        document(self.gists_dir(user_id)?, gist_id)
    }

    // ========== Shared Collections ==========

    pub fn public_items_dir(&self) -> PathBuf {
        self.root.join("public_items")
    }

    pub fn public_item(&self, item_id: &str) -> Result<PathBuf> {
        document(self.public_items_dir(), item_id)
    }

    pub fn share_items_dir(&self) -> PathBuf {
        self.root.join("share_items")
    }

    pub fn share_item(&self, share_id: &str) -> Result<PathBuf> {
        document(self.share_items_dir(), share_id)
    }
}

fn document(dir: PathBuf, id: &str) -> Result<PathBuf> {
    Ok(dir.join(format!("{}.{DOCUMENT_EXT}", safe_segment(id)?)))
}

pub fn is_document(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == DOCUMENT_EXT)
}

// ========== Blob Object Names ==========

/// `users/<uid>/<item_id>.txt.gz`
pub fn user_item_blob(user_id: &str, item_id: &str) -> Result<String> {
    blob_name(USERS_ROOT, &[user_id, item_id])
}

/// `public/<item_id>.txt.gz`
pub fn public_item_blob(item_id: &str) -> Result<String> {
    blob_name(PUBLIC_ROOT, &[item_id])
}

/// `shares/<share_id>/<item_id>.txt.gz`
pub fn share_item_blob(share_id: &str, item_id: &str) -> Result<String> {
    blob_name(SHARES_ROOT, &[share_id, item_id])
}

/// `<root>/<seg>/.../<last>.txt.gz`
pub fn blob_name(root: &str, segments: &[&str]) -> Result<String> {
    if segments.is_empty() {
        return Err(Error::invalid("blob name needs at least one segment"));
    }
    let mut name = String::from(safe_segment(root)?);
    for segment in segments {
        name.push('/');
        name.push_str(safe_segment(segment)?);
    }
    name.push_str(BLOB_SUFFIX);
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_layout() {
        let paths = StoragePaths::new("/tmp/store");
        assert_eq!(
            paths.item("u1", "i1").unwrap(),
            PathBuf::from("/tmp/store/users/u1/items/i1.json")
        );
        assert_eq!(
            paths.settings("u1", "MIND_MAP").unwrap(),
            PathBuf::from("/tmp/store/users/u1/settings/MIND_MAP.json")
        );
        assert_eq!(
            paths.gist("u1", "g1").unwrap(),
            PathBuf::from("/tmp/store/users/u1/gists/g1.json")
        );
        assert_eq!(
            paths.public_item("i1").unwrap(),
            PathBuf::from("/tmp/store/public_items/i1.json")
        );
        assert_eq!(
            paths.share_item("abcd").unwrap(),
            PathBuf::from("/tmp/store/share_items/abcd.json")
        );
    }

    #[test]
    fn blob_names() {
        assert_eq!(user_item_blob("u1", "i1").unwrap(), "users/u1/i1.txt.gz");
        assert_eq!(public_item_blob("i1").unwrap(), "public/i1.txt.gz");
        assert_eq!(share_item_blob("s1", "i1").unwrap(), "shares/s1/i1.txt.gz");
    }

    #[test]
    fn traversal_is_rejected() {
        let paths = StoragePaths::new("/tmp/store");
        assert!(paths.item("..", "i1").is_err());
        assert!(paths.item("u1", "a/b").is_err());
        assert!(paths.public_item("").is_err());
        assert!(user_item_blob("u1", "..\\x").is_err());
        assert!(blob_name(PUBLIC_ROOT, &[]).is_err());
    }
}
