// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Diagram;

/// A bookmarked external gist rendered as a diagram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GistItem {
    pub id: String,
    pub url: String,
    pub title: String,
    #[serde(default)]
    pub thumbnail: Option<String>,
    pub diagram: Diagram,
    #[serde(default)]
    pub is_bookmark: bool,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
}

impl GistItem {
    /// New gist with a fresh id and both timestamps set to now.
    pub fn new(url: impl Into<String>, title: impl Into<String>, diagram: Diagram) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            url: url.into(),
            title: title.into(),
            thumbnail: None,
            diagram,
            is_bookmark: false,
            created_at: now,
            updated_at: now,
        }
    }
}
