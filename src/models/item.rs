// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Diagram item entity and its builder.
//!
//! Items only ever hold ciphertext. Plaintext handed to
//! [`DiagramItemBuilder::with_plain_text`] is encrypted immediately and the
//! builder keeps nothing but the result (or the error).

use chrono::{DateTime, TimeZone, Utc};
use serde_json::{Map, Value};
use uuid::Uuid;

use super::Diagram;
use crate::crypto::Codec;
use crate::error::{Error, Result};

/// Field names used when an item is persisted as a key/value document.
pub mod fields {
    pub const ID: &str = "id";
    pub const TITLE: &str = "title";
    pub const TEXT: &str = "text";
    pub const DIAGRAM: &str = "diagram";
    pub const THUMBNAIL: &str = "thumbnail";
    pub const IS_PUBLIC: &str = "isPublic";
    pub const IS_BOOKMARK: &str = "isBookmark";
    pub const SAVE_TO_STORAGE: &str = "saveToStorage";
    pub const CREATED_AT: &str = "createdAt";
    pub const UPDATED_AT: &str = "updatedAt";
}

/// A user-authored diagram.
#[derive(Debug, Clone, PartialEq)]
pub struct DiagramItem {
    id: String,
    title: String,
    encrypted_text: String,
    diagram: Diagram,
    thumbnail: Option<String>,
    is_public: bool,
    is_bookmark: bool,
    save_to_storage: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    is_new: bool,
}

impl DiagramItem {
    pub fn builder() -> DiagramItemBuilder {
        DiagramItemBuilder::default()
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn encrypted_text(&self) -> &str {
        &self.encrypted_text
    }

    /// Decrypted text, or [`crate::crypto::INVALID_TEXT`] if it cannot be decrypted.
    pub fn text(&self, codec: &Codec) -> String {
        codec.decrypt_or_invalid(&self.encrypted_text)
    }

    pub fn try_text(&self, codec: &Codec) -> Result<String> {
        codec
            .decrypt(&self.encrypted_text)
            .map_err(Error::DecryptionFailed)
    }

    pub fn diagram(&self) -> Diagram {
        self.diagram
    }

    pub fn thumbnail(&self) -> Option<&str> {
        self.thumbnail.as_deref()
    }

    pub fn is_public(&self) -> bool {
        self.is_public
    }

    pub fn is_bookmark(&self) -> bool {
        self.is_bookmark
    }

    /// Whether the full text lives in the blob store rather than inline.
    pub fn save_to_storage(&self) -> bool {
        self.save_to_storage
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// True until the item has been persisted once.
    pub fn is_new(&self) -> bool {
        self.is_new
    }

    pub fn has_text(&self) -> bool {
        !self.encrypted_text.is_empty()
    }

    pub fn publish(&mut self) {
        self.is_public = true;
    }

    pub fn bookmark(&mut self, is_bookmark: bool) {
        self.is_bookmark = is_bookmark;
    }

    /// Drop the text so list views do not carry full payloads.
    pub fn clear_text(&mut self) {
        self.encrypted_text.clear();
    }

    pub(crate) fn set_encrypted_text(&mut self, encrypted_text: String) {
        self.encrypted_text = encrypted_text;
    }

    /// Apply the bookkeeping a repository performs when persisting.
    pub(crate) fn mark_stored(
        &mut self,
        save_to_storage: bool,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) {
        self.save_to_storage = save_to_storage;
        self.created_at = created_at;
        self.updated_at = updated_at;
        self.is_new = false;
    }

    /// Reconstruct an item from a persisted key/value document.
    ///
    /// Every required field is validated independently; all failures are
    /// reported together.
    pub fn from_map(map: &Map<String, Value>) -> Result<Self> {
        let mut errors = Vec::new();

        let id = required_str(map, fields::ID, &mut errors);
        let title = required_str(map, fields::TITLE, &mut errors);
        let diagram = match required_str(map, fields::DIAGRAM, &mut errors) {
            Some(raw) => match raw.parse::<Diagram>() {
                Ok(d) => Some(d),
                Err(e) => {
                    errors.push(e);
                    None
                }
            },
            None => None,
        };
        let is_public = required_bool(map, fields::IS_PUBLIC, &mut errors);
        let is_bookmark = required_bool(map, fields::IS_BOOKMARK, &mut errors);
        let created_at = required_millis(map, fields::CREATED_AT, &mut errors);
        let updated_at = required_millis(map, fields::UPDATED_AT, &mut errors);

        let text = match map.get(fields::TEXT) {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(_) => {
                errors.push(Error::invalid(format!("{} must be a string", fields::TEXT)));
                String::new()
            }
        };
        let thumbnail = match map.get(fields::THUMBNAIL) {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(_) => {
                errors.push(Error::invalid(format!("{} must be a string", fields::THUMBNAIL)));
                None
            }
        };
        let save_to_storage = match map.get(fields::SAVE_TO_STORAGE) {
            None | Some(Value::Null) => false,
            Some(Value::Bool(b)) => *b,
            Some(_) => {
                errors.push(Error::invalid(format!(
                    "{} must be a boolean",
                    fields::SAVE_TO_STORAGE
                )));
                false
            }
        };

        match (id, title, diagram, is_public, is_bookmark, created_at, updated_at) {
            (
                Some(id),
                Some(title),
                Some(diagram),
                Some(is_public),
                Some(is_bookmark),
                Some(created_at),
                Some(updated_at),
            ) if errors.is_empty() => Ok(Self {
                id: id.to_string(),
                title: title.to_string(),
                encrypted_text: text,
                diagram,
                thumbnail,
                is_public,
                is_bookmark,
                save_to_storage,
                created_at,
                updated_at,
                is_new: false,
            }),
            _ => Err(Error::join(errors)),
        }
    }

    /// Convert to a key/value document. The text field is omitted when the
    /// text belongs in the blob store.
    pub fn to_map(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert(fields::ID.into(), Value::String(self.id.clone()));
        map.insert(fields::TITLE.into(), Value::String(self.title.clone()));
        if !self.save_to_storage {
            map.insert(fields::TEXT.into(), Value::String(self.encrypted_text.clone()));
        }
        map.insert(
            fields::DIAGRAM.into(),
            Value::String(self.diagram.as_str().to_string()),
        );
        map.insert(
            fields::THUMBNAIL.into(),
            self.thumbnail.clone().map(Value::String).unwrap_or(Value::Null),
        );
        map.insert(fields::IS_PUBLIC.into(), Value::Bool(self.is_public));
        map.insert(fields::IS_BOOKMARK.into(), Value::Bool(self.is_bookmark));
        map.insert(fields::SAVE_TO_STORAGE.into(), Value::Bool(self.save_to_storage));
        map.insert(
            fields::CREATED_AT.into(),
            Value::from(self.created_at.timestamp_millis()),
        );
        map.insert(
            fields::UPDATED_AT.into(),
            Value::from(self.updated_at.timestamp_millis()),
        );
        map
    }
}

fn required_str<'a>(
    map: &'a Map<String, Value>,
    field: &str,
    errors: &mut Vec<Error>,
) -> Option<&'a str> {
    match map.get(field) {
        Some(Value::String(s)) => Some(s.as_str()),
        Some(_) => {
            errors.push(Error::invalid(format!("{field} must be a string")));
            None
        }
        None => {
            errors.push(Error::invalid(format!("{field} is required")));
            None
        }
    }
}

fn required_bool(map: &Map<String, Value>, field: &str, errors: &mut Vec<Error>) -> Option<bool> {
    match map.get(field) {
        Some(Value::Bool(b)) => Some(*b),
        Some(_) => {
            errors.push(Error::invalid(format!("{field} must be a boolean")));
            None
        }
        None => {
            errors.push(Error::invalid(format!("{field} is required")));
            None
        }
    }
}

fn required_millis(
    map: &Map<String, Value>,
    field: &str,
    errors: &mut Vec<Error>,
) -> Option<DateTime<Utc>> {
    let parsed = match map.get(field) {
        Some(v) => v.as_i64().and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
        None => {
            errors.push(Error::invalid(format!("{field} is required")));
            return None;
        }
    };
    if parsed.is_none() {
        errors.push(Error::invalid(format!("{field} must be a timestamp")));
    }
    parsed
}

/// Accumulating builder for [`DiagramItem`].
///
/// Setters never fail; problems are collected and reported by [`build`](Self::build).
#[derive(Debug, Default)]
pub struct DiagramItemBuilder {
    id: Option<String>,
    title: Option<String>,
    encrypted_text: String,
    diagram: Option<Diagram>,
    thumbnail: Option<String>,
    is_public: bool,
    is_bookmark: bool,
    save_to_storage: bool,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
    errors: Vec<Error>,
}

impl DiagramItemBuilder {
    /// An empty id marks the item as new; a fresh id is assigned on build.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_plain_text(mut self, codec: &Codec, text: &str) -> Self {
        match codec.encrypt(text) {
            Ok(ciphertext) => self.encrypted_text = ciphertext,
            Err(e) => self.errors.push(Error::EncryptionFailed(e)),
        }
        self
    }

    pub fn with_encrypted_text(mut self, encrypted_text: impl Into<String>) -> Self {
        self.encrypted_text = encrypted_text.into();
        self
    }

    pub fn with_diagram(mut self, diagram: Diagram) -> Self {
        self.diagram = Some(diagram);
        self
    }

    /// Parse a diagram kind by name, recording an error if unknown.
    pub fn with_diagram_name(mut self, name: &str) -> Self {
        match name.parse::<Diagram>() {
            Ok(d) => self.diagram = Some(d),
            Err(e) => self.errors.push(e),
        }
        self
    }

    pub fn with_thumbnail(mut self, thumbnail: Option<String>) -> Self {
        self.thumbnail = thumbnail;
        self
    }

    pub fn with_is_public(mut self, is_public: bool) -> Self {
        self.is_public = is_public;
        self
    }

    pub fn with_is_bookmark(mut self, is_bookmark: bool) -> Self {
        self.is_bookmark = is_bookmark;
        self
    }

    pub fn with_save_to_storage(mut self, save_to_storage: bool) -> Self {
        self.save_to_storage = save_to_storage;
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    pub fn with_updated_at(mut self, updated_at: DateTime<Utc>) -> Self {
        self.updated_at = Some(updated_at);
        self
    }

    pub fn build(self) -> Result<DiagramItem> {
        let mut errors = self.errors;
        if self.title.is_none() {
            errors.push(Error::invalid("title is required"));
        }
        if self.diagram.is_none() {
            errors.push(Error::invalid("diagram is required"));
        }

        let (Some(title), Some(diagram)) = (self.title, self.diagram) else {
            return Err(Error::join(errors));
        };
        if !errors.is_empty() {
            return Err(Error::join(errors));
        }

        let (id, is_new) = match self.id {
            Some(id) if !id.is_empty() => (id, false),
            _ => (Uuid::new_v4().to_string(), true),
        };
        let now = Utc::now();
        let created_at = self.created_at.unwrap_or(now);

        Ok(DiagramItem {
            id,
            title,
            encrypted_text: self.encrypted_text,
            diagram,
            thumbnail: self.thumbnail,
            is_public: self.is_public,
            is_bookmark: self.is_bookmark,
            save_to_storage: self.save_to_storage,
            created_at,
            updated_at: self.updated_at.unwrap_or(created_at),
            is_new,
        })
    }
}
