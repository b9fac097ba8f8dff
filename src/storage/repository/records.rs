// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JSON record shapes used by the document and embedded backends.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::SharedItem;
use crate::error::{Error, Result};
use crate::models::{DiagramItem, Share};
use crate::storage::ownership::OwnedResource;

/// Owner field added next to the item fields.
pub(crate) const OWNER_FIELD: &str = "uid";

/// An item record together with the user who wrote it.
#[derive(Debug, Clone)]
pub(crate) struct StoredItem {
    pub owner: String,
    pub item: DiagramItem,
}

impl OwnedResource for StoredItem {
    fn owner_user_id(&self) -> &str {
        &self.owner
    }

    fn resource_name(&self) -> &'static str {
        "public item"
    }
}

pub(crate) fn item_document(user_id: &str, item: &DiagramItem) -> Value {
    let mut map = item.to_map();
    map.insert(OWNER_FIELD.into(), Value::String(user_id.to_string()));
    Value::Object(map)
}

pub(crate) fn parse_item_document(value: &Value) -> Result<StoredItem> {
    let map = value
        .as_object()
        .ok_or_else(|| Error::invalid("item record is not an object"))?;
    let owner = map
        .get(OWNER_FIELD)
        .and_then(Value::as_str)
        .ok_or_else(|| Error::invalid(format!("{OWNER_FIELD} is required")))?
        .to_string();
    Ok(StoredItem {
        owner,
        item: DiagramItem::from_map(map)?,
    })
}

/// Share policy plus the item snapshot taken when it was shared.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct ShareDocument {
    pub uid: String,
    pub item: Map<String, Value>,
    pub share: Share,
}

impl ShareDocument {
    pub fn new(user_id: &str, item: &DiagramItem, share: &Share) -> Self {
        Self {
            uid: user_id.to_string(),
            item: item.to_map(),
            share: share.clone(),
        }
    }

    pub fn item_id(&self) -> Option<&str> {
        self.item.get(crate::models::item::fields::ID).and_then(Value::as_str)
    }

    pub fn into_shared(self) -> Result<SharedItem> {
        Ok(SharedItem {
            item: DiagramItem::from_map(&self.item)?,
            owner: self.uid,
            share: self.share,
        })
    }
}

impl OwnedResource for ShareDocument {
    fn owner_user_id(&self) -> &str {
        &self.uid
    }

    fn resource_name(&self) -> &'static str {
        "share"
    }
}
