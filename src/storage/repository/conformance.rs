// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Behaviour every backend must show, run from each backend's tests.

use chrono::Utc;

use super::{ItemQuery, Repositories};
use crate::error::Error;
use crate::models::{Diagram, DiagramItem, GistItem, Settings, Share};
use crate::storage::blob::BlobStore;
use crate::storage::paths;
use crate::storage::session::{finish, Session};

pub(crate) fn sample_item(id: &str) -> DiagramItem {
    DiagramItem::builder()
        .with_id(id)
        .with_title(format!("title {id}"))
        .with_encrypted_text(format!("cipher-{id}"))
        .with_diagram(Diagram::MindMap)
        .with_thumbnail(Some("thumb".into()))
        .build()
        .unwrap()
}

fn sample_share() -> Share {
    Share {
        token: "signed.jwt.token".into(),
        password: String::new(),
        allow_ip_list: vec!["10.0.0.0/8".into()],
        allow_email_list: vec!["a@example.com".into()],
        expire_time: Utc::now().timestamp_millis() + 60_000,
    }
}

fn ids(items: &[DiagramItem]) -> Vec<String> {
    items.iter().map(|i| i.id().to_string()).collect()
}

pub(crate) async fn items(repos: &Repositories) {
    let items = &repos.items;
    let mut session = Session::ambient();

    let first = items
        .save(&mut session, "user-1", &sample_item("a"), false)
        .await
        .unwrap();
    assert!(!first.is_new());

    let found = items.find_by_id(&mut session, "user-1", "a", false).await.unwrap();
    assert_eq!(found.title(), "title a");
    assert_eq!(found.encrypted_text(), "cipher-a");
    assert_eq!(found.thumbnail(), Some("thumb"));

    // Saving again updates in place.
    let mut bookmarked = found.clone();
    bookmarked.bookmark(true);
    let second = items
        .save(&mut session, "user-1", &bookmarked, false)
        .await
        .unwrap();
    assert_eq!(
        second.created_at().timestamp_millis(),
        first.created_at().timestamp_millis()
    );
    let listed = items
        .find(&mut session, "user-1", ItemQuery::new(0, 10))
        .await
        .unwrap();
    assert_eq!(ids(&listed), ["a"]);
    assert!(listed[0].is_bookmark());

    // Other users do not see private items.
    assert!(items
        .find_by_id(&mut session, "user-2", "a", false)
        .await
        .unwrap_err()
        .is_not_found());

    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    items
        .save(&mut session, "user-1", &sample_item("b"), false)
        .await
        .unwrap();
    let newest_first = items
        .find(&mut session, "user-1", ItemQuery::new(0, 10))
        .await
        .unwrap();
    assert_eq!(ids(&newest_first), ["b", "a"]);
    assert!(newest_first.iter().all(|i| !i.has_text()));

    let with_text = items
        .find(&mut session, "user-1", ItemQuery::new(1, 10).with_text(true))
        .await
        .unwrap();
    assert_eq!(ids(&with_text), ["a"]);
    assert_eq!(with_text[0].encrypted_text(), "cipher-a");

    let bookmarks = items
        .find(&mut session, "user-1", ItemQuery::new(0, 10).bookmarked(true))
        .await
        .unwrap();
    assert_eq!(ids(&bookmarks), ["a"]);

    // Public copies are owned.
    let mut public = sample_item("a");
    public.publish();
    items.save(&mut session, "user-1", &public, true).await.unwrap();
    let err = items
        .save(&mut session, "user-2", &public, true)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Forbidden(_)));

    let seen = items.find_by_id(&mut session, "user-2", "a", true).await.unwrap();
    assert!(seen.is_public());
    assert_eq!(seen.encrypted_text(), "cipher-a");

    let mine = items
        .find(&mut session, "user-1", ItemQuery::new(0, 10).public(true))
        .await
        .unwrap();
    assert_eq!(ids(&mine), ["a"]);
    assert!(items
        .find(&mut session, "user-2", ItemQuery::new(0, 10).public(true))
        .await
        .unwrap()
        .is_empty());

    let err = items.delete(&mut session, "user-2", "a", true).await.unwrap_err();
    assert!(matches!(err, Error::Forbidden(_)));
    items.delete(&mut session, "user-1", "a", true).await.unwrap();
    items.delete(&mut session, "user-1", "a", true).await.unwrap();
    assert!(items
        .find_by_id(&mut session, "user-1", "a", true)
        .await
        .unwrap_err()
        .is_not_found());

    items.delete(&mut session, "user-1", "a", false).await.unwrap();
    items.delete(&mut session, "user-1", "missing", false).await.unwrap();
    let remaining = items
        .find(&mut session, "user-1", ItemQuery::new(0, 10))
        .await
        .unwrap();
    assert_eq!(ids(&remaining), ["b"]);
}

pub(crate) async fn items_with_blob(repos: &Repositories, blob: &BlobStore) {
    let items = &repos.items;
    let mut session = Session::ambient();

    let stored = items
        .save(&mut session, "user-1", &sample_item("big"), false)
        .await
        .unwrap();
    assert!(stored.save_to_storage());

    let name = paths::user_item_blob("user-1", "big").unwrap();
    assert_eq!(blob.get(&name).await.unwrap(), "cipher-big");

    let found = items.find_by_id(&mut session, "user-1", "big", false).await.unwrap();
    assert_eq!(found.encrypted_text(), "cipher-big");

    let listed = items
        .find(&mut session, "user-1", ItemQuery::new(0, 10))
        .await
        .unwrap();
    assert!(!listed[0].has_text());
    let listed = items
        .find(&mut session, "user-1", ItemQuery::new(0, 10).with_text(true))
        .await
        .unwrap();
    assert_eq!(listed[0].encrypted_text(), "cipher-big");

    items.delete(&mut session, "user-1", "big", false).await.unwrap();
    assert!(blob.get(&name).await.unwrap_err().is_not_found());
}

pub(crate) async fn shares(repos: &Repositories) {
    let shares = &repos.shares;
    let mut session = Session::ambient();
    let item = sample_item("shared");
    let share = sample_share();

    shares
        .save(&mut session, "user-1", "share-1", &item, &share)
        .await
        .unwrap();

    let found = shares.find(&mut session, "share-1").await.unwrap();
    assert_eq!(found.owner, "user-1");
    assert_eq!(found.item.id(), "shared");
    assert_eq!(found.item.encrypted_text(), "cipher-shared");
    assert_eq!(found.share, share);

    let err = shares
        .save(&mut session, "user-2", "share-1", &item, &share)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Forbidden(_)));
    let err = shares.delete(&mut session, "user-2", "share-1").await.unwrap_err();
    assert!(matches!(err, Error::Forbidden(_)));

    // Re-sharing replaces the record.
    let mut renewed = share.clone();
    renewed.token = "renewed".into();
    shares
        .save(&mut session, "user-1", "share-1", &item, &renewed)
        .await
        .unwrap();
    assert_eq!(
        shares.find(&mut session, "share-1").await.unwrap().share.token,
        "renewed"
    );

    shares.delete(&mut session, "user-1", "share-1").await.unwrap();
    assert!(shares
        .find(&mut session, "share-1")
        .await
        .unwrap_err()
        .is_not_found());
    shares.delete(&mut session, "user-1", "share-1").await.unwrap();
}

pub(crate) async fn settings(repos: &Repositories) {
    let settings = &repos.settings;
    let mut session = Session::ambient();

    assert!(settings
        .find(&mut session, "user-1", Diagram::Kanban)
        .await
        .unwrap_err()
        .is_not_found());

    let mut custom = Settings::default();
    custom.font = "Inter".into();
    settings
        .save(&mut session, "user-1", Diagram::Kanban, &custom)
        .await
        .unwrap();
    assert_eq!(
        settings.find(&mut session, "user-1", Diagram::Kanban).await.unwrap(),
        custom
    );

    custom.show_grid = Some(true);
    settings
        .save(&mut session, "user-1", Diagram::Kanban, &custom)
        .await
        .unwrap();
    assert_eq!(
        settings
            .find(&mut session, "user-1", Diagram::Kanban)
            .await
            .unwrap()
            .show_grid,
        Some(true)
    );
    assert!(settings
        .find(&mut session, "user-1", Diagram::MindMap)
        .await
        .unwrap_err()
        .is_not_found());
}

pub(crate) async fn gists(repos: &Repositories) {
    let gists = &repos.gists;
    let mut session = Session::ambient();

    let first = gists
        .save(
            &mut session,
            "user-1",
            &GistItem::new("https://gist.example/1", "one", Diagram::Table),
        )
        .await
        .unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let second = gists
        .save(
            &mut session,
            "user-1",
            &GistItem::new("https://gist.example/2", "two", Diagram::Table),
        )
        .await
        .unwrap();

    let listed = gists.find(&mut session, "user-1", 0, 10).await.unwrap();
    let listed_ids: Vec<_> = listed.iter().map(|g| g.id.clone()).collect();
    assert_eq!(listed_ids, [second.id.clone(), first.id.clone()]);
    assert!(gists.find(&mut session, "user-2", 0, 10).await.unwrap().is_empty());

    let mut renamed = first.clone();
    renamed.title = "renamed".into();
    renamed.created_at = Utc::now();
    let updated = gists.save(&mut session, "user-1", &renamed).await.unwrap();
    assert_eq!(
        updated.created_at.timestamp_millis(),
        first.created_at.timestamp_millis()
    );
    assert_eq!(
        gists
            .find_by_id(&mut session, "user-1", &first.id)
            .await
            .unwrap()
            .title,
        "renamed"
    );

    gists.delete(&mut session, "user-1", &first.id).await.unwrap();
    gists.delete(&mut session, "user-1", &first.id).await.unwrap();
    assert!(gists
        .find_by_id(&mut session, "user-1", &first.id)
        .await
        .unwrap_err()
        .is_not_found());
}

pub(crate) async fn transactions(repos: &Repositories) {
    let manager = repos.transactions.as_ref();

    let mut session = manager.begin().await.unwrap();
    assert!(session.is_active());
    repos
        .items
        .save(&mut session, "user-1", &sample_item("tx"), false)
        .await
        .unwrap();
    repos
        .shares
        .save(&mut session, "user-1", "share-tx", &sample_item("tx"), &sample_share())
        .await
        .unwrap();
    let inside = repos
        .items
        .find_by_id(&mut session, "user-1", "tx", false)
        .await
        .unwrap();
    assert_eq!(inside.id(), "tx");
    let err = finish::<()>(manager, session, Err(Error::forbidden("abort")))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Forbidden(_)));

    let mut ambient = Session::ambient();
    assert!(repos
        .items
        .find_by_id(&mut ambient, "user-1", "tx", false)
        .await
        .unwrap_err()
        .is_not_found());
    assert!(repos
        .shares
        .find(&mut ambient, "share-tx")
        .await
        .unwrap_err()
        .is_not_found());

    let mut session = manager.begin().await.unwrap();
    repos
        .items
        .save(&mut session, "user-1", &sample_item("tx"), false)
        .await
        .unwrap();
    repos
        .items
        .delete(&mut session, "user-1", "tx", true)
        .await
        .unwrap();
    finish(manager, session, Ok(())).await.unwrap();

    let committed = repos
        .items
        .find(&mut ambient, "user-1", ItemQuery::new(0, 10))
        .await
        .unwrap();
    assert_eq!(ids(&committed), ["tx"]);
}
