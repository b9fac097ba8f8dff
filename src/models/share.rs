// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use serde::{Deserialize, Serialize};

/// Access policy and signed token stored behind a share id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Share {
    pub token: String,
    /// bcrypt hash, empty when no password is required.
    pub password: String,
    #[serde(rename = "allowIPList", default)]
    pub allow_ip_list: Vec<String>,
    #[serde(default)]
    pub allow_email_list: Vec<String>,
    /// Epoch milliseconds.
    pub expire_time: i64,
}

impl Share {
    pub fn uses_password(&self) -> bool {
        !self.password.is_empty()
    }

    /// Owner-facing view. `token` is the transport-encoded token.
    pub fn condition(&self, token: String) -> ShareCondition {
        ShareCondition {
            token,
            use_password: self.uses_password(),
            expire_time: self.expire_time,
            allow_ip_list: self.allow_ip_list.clone(),
            allow_email_list: self.allow_email_list.clone(),
        }
    }
}

/// Current sharing settings of an item as shown to its owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareCondition {
    pub token: String,
    #[serde(rename = "usePassword")]
    pub use_password: bool,
    #[serde(rename = "expireTime")]
    pub expire_time: i64,
    #[serde(rename = "allowIPList")]
    pub allow_ip_list: Vec<String>,
    #[serde(rename = "allowEmailList")]
    pub allow_email_list: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn condition_serializes_with_wire_names() {
        let share = Share {
            token: "raw".into(),
            password: "$2b$04$hash".into(),
            allow_ip_list: vec!["10.0.0.0/8".into()],
            allow_email_list: vec![],
            expire_time: 42,
        };
        let value = serde_json::to_value(share.condition("encoded".into())).unwrap();
        assert_eq!(
            value,
            json!({
                "token": "encoded",
                "usePassword": true,
                "expireTime": 42,
                "allowIPList": ["10.0.0.0/8"],
                "allowEmailList": []
            })
        );
    }

    #[test]
    fn empty_password_means_unprotected() {
        assert!(!Share::default().uses_password());
    }
}
