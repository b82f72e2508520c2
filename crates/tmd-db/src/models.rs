//! Row types. Each maps one-to-one onto a table in `migrations`.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;

/// Local mirror of a remote account's metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Account {
    pub id: i64,
    pub screen_name: String,
    pub name: String,
    pub protected: bool,
    pub friends_count: i64,
}

/// A screen name / display name pair an account used before it was renamed.
/// Append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountNameHistory {
    pub id: i64,
    pub account_id: i64,
    pub screen_name: String,
    pub name: String,
    pub record_date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountList {
    pub id: i64,
    pub name: String,
    pub owner_account_id: i64,
}

/// One local download root for an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountEntity {
    pub id: i64,
    pub account_id: i64,
    pub name: String,
    pub latest_release_time: Option<DateTime<Utc>>,
    /// Absolute, compared case-insensitively by the store.
    pub parent_dir: PathBuf,
    pub media_count: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccountEntity {
    pub account_id: i64,
    pub name: String,
    pub parent_dir: PathBuf,
}

/// One local download root for a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListEntity {
    pub id: i64,
    pub list_id: i64,
    pub name: String,
    pub parent_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewListEntity {
    pub list_id: i64,
    pub name: String,
    pub parent_dir: PathBuf,
}

/// An account whose content appears inside a list entity's directory tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountLink {
    pub id: i64,
    pub account_id: i64,
    pub name: String,
    pub parent_list_entity_id: i64,
}
