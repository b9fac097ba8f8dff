// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Item text placement shared by every backend.
//!
//! With a blob store configured, item text goes to the blob store and the
//! metadata record carries `saveToStorage = true` and no text. The metadata
//! write and the blob write are issued concurrently and both must succeed.

use std::future::Future;

use chrono::{DateTime, Utc};
use futures::future::try_join_all;

use super::ItemQuery;
use crate::error::{Error, Result};
use crate::models::DiagramItem;
use crate::storage::blob::BlobStore;
use crate::storage::paths;

/// Blob object holding the text of a private or public copy.
pub(crate) fn item_blob(user_id: &str, item_id: &str, is_public: bool) -> Result<String> {
    if is_public {
        paths::public_item_blob(item_id)
    } else {
        paths::user_item_blob(user_id, item_id)
    }
}

/// Copy of `item` as it will be persisted.
///
/// `created_at` is kept from the existing record when there is one.
pub(crate) fn stamp(
    item: &DiagramItem,
    existing_created_at: Option<DateTime<Utc>>,
    blob: Option<&BlobStore>,
) -> DiagramItem {
    let mut stored = item.clone();
    let created_at = existing_created_at.unwrap_or_else(|| item.created_at());
    let updated_at = Utc::now().max(created_at);
    stored.mark_stored(blob.is_some(), created_at, updated_at);
    stored
}

/// Copy of `item` as stored in a share snapshot; timestamps are kept.
pub(crate) fn snapshot(item: &DiagramItem, blob: Option<&BlobStore>) -> DiagramItem {
    let mut stored = item.clone();
    stored.mark_stored(blob.is_some(), item.created_at(), item.updated_at());
    stored
}

/// Run the metadata write alongside the blob write.
pub(crate) async fn write_with_text<F>(
    blob: Option<&BlobStore>,
    blob_name: &str,
    item: &DiagramItem,
    metadata: F,
) -> Result<()>
where
    F: Future<Output = Result<()>>,
{
    match blob {
        Some(blob) => {
            tokio::try_join!(metadata, blob.put(blob_name, item.encrypted_text()))?;
            Ok(())
        }
        None => metadata.await,
    }
}

/// Run the metadata delete alongside the blob delete.
pub(crate) async fn delete_with_text<F>(
    blob: Option<&BlobStore>,
    blob_name: &str,
    metadata: F,
) -> Result<()>
where
    F: Future<Output = Result<()>>,
{
    match blob {
        Some(blob) => {
            tokio::try_join!(metadata, blob.delete(blob_name))?;
            Ok(())
        }
        None => metadata.await,
    }
}

/// Fill in text held by the blob store.
pub(crate) async fn load_text(
    blob: Option<&BlobStore>,
    blob_name: &str,
    item: &mut DiagramItem,
) -> Result<()> {
    if !item.save_to_storage() {
        return Ok(());
    }
    let blob = blob.ok_or_else(|| {
        Error::internal(format!(
            "item {} keeps its text in blob storage but none is configured",
            item.id()
        ))
    })?;
    item.set_encrypted_text(blob.get(blob_name).await?);
    Ok(())
}

/// Load every item's text concurrently, or clear it when not requested.
pub(crate) async fn load_texts<F>(
    blob: Option<&BlobStore>,
    mut items: Vec<DiagramItem>,
    load: bool,
    blob_name: F,
) -> Result<Vec<DiagramItem>>
where
    F: Fn(&DiagramItem) -> Result<String>,
{
    if !load {
        items.iter_mut().for_each(DiagramItem::clear_text);
        return Ok(items);
    }
    try_join_all(items.into_iter().map(|mut item| {
        let name = blob_name(&item);
        async move {
            load_text(blob, &name?, &mut item).await?;
            Ok::<_, Error>(item)
        }
    }))
    .await
}

/// Bookmark filter, newest first, then offset/limit.
pub(crate) fn page_items(items: Vec<DiagramItem>, query: &ItemQuery) -> Vec<DiagramItem> {
    let items = items
        .into_iter()
        .filter(|item| !query.is_bookmark || item.is_bookmark())
        .collect();
    page(items, query.offset, query.limit, DiagramItem::updated_at)
}

pub(crate) fn page<T, K>(mut items: Vec<T>, offset: usize, limit: usize, updated_at: K) -> Vec<T>
where
    K: Fn(&T) -> DateTime<Utc>,
{
    items.sort_by_key(|item| std::cmp::Reverse(updated_at(item)));
    items.into_iter().skip(offset).take(limit).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Diagram;
    use chrono::Duration;

    fn item(id: &str, age_minutes: i64, bookmark: bool) -> DiagramItem {
        let at = Utc::now() - Duration::minutes(age_minutes);
        DiagramItem::builder()
            .with_id(id)
            .with_title(id)
            .with_encrypted_text("00")
            .with_diagram(Diagram::Kanban)
            .with_is_bookmark(bookmark)
            .with_created_at(at)
            .with_updated_at(at)
            .build()
            .unwrap()
    }

    #[test]
    fn paging_orders_newest_first() {
        let items = vec![item("old", 30, false), item("new", 1, true), item("mid", 10, true)];
        let page = page_items(items.clone(), &ItemQuery::new(0, 2));
        let ids: Vec<_> = page.iter().map(|i| i.id().to_string()).collect();
        assert_eq!(ids, ["new", "mid"]);

        let page = page_items(items.clone(), &ItemQuery::new(1, 10).bookmarked(true));
        let ids: Vec<_> = page.iter().map(|i| i.id().to_string()).collect();
        assert_eq!(ids, ["mid"]);
    }

    #[test]
    fn stamp_keeps_original_creation_time() {
        let original = item("x", 60, false);
        let created = original.created_at();
        let stored = stamp(&original, Some(created - Duration::days(1)), None);
        assert_eq!(stored.created_at(), created - Duration::days(1));
        assert!(stored.updated_at() > created);
        assert!(!stored.is_new());
        assert!(!stored.save_to_storage());

        let blob = BlobStore::memory();
        assert!(stamp(&original, None, Some(&blob)).save_to_storage());
    }

    #[tokio::test]
    async fn listing_without_text_clears_it() {
        let items = load_texts(None, vec![item("a", 1, false)], false, |i| {
            paths::user_item_blob("u", i.id())
        })
        .await
        .unwrap();
        assert!(!items[0].has_text());
    }

    #[tokio::test]
    async fn blob_text_is_loaded() {
        let blob = BlobStore::memory();
        blob.put("users/u/a.txt.gz", "feed").await.unwrap();
        let stored = stamp(&item("a", 1, false), None, Some(&blob));
        let items = load_texts(Some(&blob), vec![stored], true, |i| {
            item_blob("u", i.id(), false)
        })
        .await
        .unwrap();
        assert_eq!(items[0].encrypted_text(), "feed");
    }
}
