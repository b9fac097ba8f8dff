// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Share Access Policy
//!
//! Stateless checks applied when a share token is resolved. The service runs
//! them in a fixed order and stops at the first failure:
//!
//! 1. token signature and expiry (see [`crate::share`])
//! 2. caller IP against [`Share::check_ip_within_range`]
//! 3. caller email against [`Share::valid_email`]
//! 4. supplied password against [`Share::compare_password`]

use std::net::IpAddr;

use ipnet::IpNet;

use crate::error::{Error, Result};
use crate::models::Share;

impl Share {
    /// True if the allow-list is empty or contains `email` exactly.
    pub fn valid_email(&self, email: &str) -> bool {
        self.allow_email_list.is_empty() || self.allow_email_list.iter().any(|e| e == email)
    }

    /// True if the allow-list is empty, or `remote_ip` equals a listed
    /// address or falls inside a listed CIDR block.
    ///
    /// Entries that are neither an address nor a CIDR block are skipped.
    pub fn check_ip_within_range(&self, remote_ip: &str) -> bool {
        if self.allow_ip_list.is_empty() {
            return true;
        }
        let Ok(remote) = remote_ip.trim().parse::<IpAddr>() else {
            return false;
        };

        self.allow_ip_list.iter().any(|entry| {
            let entry = entry.trim();
            if let Ok(ip) = entry.parse::<IpAddr>() {
                ip == remote
            } else if let Ok(net) = entry.parse::<IpNet>() {
                net.contains(&remote)
            } else {
                false
            }
        })
    }

    /// bcrypt comparison against the stored hash.
    ///
    /// Callers decide whether a password is required at all; an empty stored
    /// hash never matches.
    pub fn compare_password(&self, candidate: &str) -> bool {
        bcrypt::verify(candidate, &self.password).unwrap_or(false)
    }
}

/// Keep only entries that are a literal IP address or a CIDR block.
pub fn filter_allow_ip_list(entries: &[String]) -> Vec<String> {
    entries
        .iter()
        .map(|e| e.trim())
        .filter(|e| e.parse::<IpAddr>().is_ok() || e.parse::<IpNet>().is_ok())
        .map(str::to_string)
        .collect()
}

/// Hash a share password, or return an empty string when there is none.
pub fn hash_password(password: &str, cost: u32) -> Result<String> {
    if password.is_empty() {
        return Ok(String::new());
    }
    bcrypt::hash(password, cost).map_err(|e| Error::internal(format!("bcrypt: {e}")))
}
