//! The three flat JSON documents used for import and export.
//!
//! `users.json`: `{username: credential}`
//! `notices.json`: `{notice_id: {owner, book_name, description, timestamp}}`
//! `conversations.json`: `{notice_id: {anon_id: [message, ...]}}`

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Notice, Threads};

pub const USERS_FILE: &str = "users.json";
pub const NOTICES_FILE: &str = "notices.json";
pub const CONVERSATIONS_FILE: &str = "conversations.json";

pub type UsersDocument = BTreeMap<String, String>;
pub type NoticesDocument = BTreeMap<String, NoticeRecord>;
pub type ConversationsDocument = BTreeMap<String, Threads>;

/// A notice as stored in `notices.json`, keyed externally by its id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoticeRecord {
    pub owner: String,
    pub book_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(with = "crate::timestamp")]
    pub timestamp: DateTime<Utc>,
}

impl NoticeRecord {
    pub fn into_notice(self, id: String) -> Notice {
        Notice {
            id,
            owner: self.owner,
            book_name: self.book_name,
            description: self.description,
            timestamp: self.timestamp,
        }
    }
}

impl From<Notice> for NoticeRecord {
    fn from(notice: Notice) -> Self {
        Self {
            owner: notice.owner,
            book_name: notice.book_name,
            description: notice.description,
            timestamp: notice.timestamp,
        }
    }
}

/// All three documents together.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub users: UsersDocument,
    pub notices: NoticesDocument,
    pub conversations: ConversationsDocument,
}
