// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    #[serde(rename = "foregroundColor")]
    pub foreground_color: String,
    #[serde(rename = "backgroundColor")]
    pub background_color: String,
}

/// Per-user, per-diagram display preferences. Stored as-is, never encrypted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub font: String,
    pub width: i32,
    pub height: i32,
    pub background_color: String,
    pub activity_color: Color,
    pub task_color: Color,
    pub story_color: Color,
    pub line_color: String,
    pub label_color: String,
    pub text_color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zoom_control: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub toolbar: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lock_editing: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_grid: Option<bool>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            font: "Nunito Sans".to_string(),
            width: 140,
            height: 65,
            background_color: "#F4F4F5".to_string(),
            activity_color: Color {
                foreground_color: "#FFFFFF".to_string(),
                background_color: "#266B9A".to_string(),
            },
            task_color: Color {
                foreground_color: "#FFFFFF".to_string(),
                background_color: "#3E9BCD".to_string(),
            },
            story_color: Color {
                foreground_color: "#333333".to_string(),
                background_color: "#FFFFFF".to_string(),
            },
            line_color: "#434343".to_string(),
            label_color: "#8C9FAE".to_string(),
            text_color: "#111111".to_string(),
            zoom_control: Some(true),
            scale: Some(1.0),
            toolbar: Some(true),
            lock_editing: Some(false),
            show_grid: Some(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_fields_are_omitted_when_unset() {
        let settings = Settings {
            zoom_control: None,
            scale: None,
            toolbar: None,
            lock_editing: None,
            show_grid: None,
            ..Settings::default()
        };
        let value = serde_json::to_value(&settings).unwrap();
        assert!(value.get("zoomControl").is_none());
        assert_eq!(value["activityColor"]["backgroundColor"], "#266B9A");

        let restored: Settings = serde_json::from_value(value).unwrap();
        assert_eq!(restored, settings);
    }
}
