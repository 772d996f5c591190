//! Database row types. Timestamps and senders stay as raw text here and are
//! validated when converted into the `bookboard-types` records.
use anyhow::{Context, Result};

use bookboard_types::models::{Message, Notice, User};
use bookboard_types::timestamp;

pub struct UserRow {
    pub username: String,
    pub password: String,
    pub created_at: String,
}

pub struct NoticeRow {
    pub id: String,
    pub owner: String,
    pub book_name: String,
    pub description: String,
    pub created_at: String,
}

pub struct MessageRow {
    pub id: i64,
    pub notice_id: String,
    pub anon_id: String,
    pub sender: String,
    pub body: String,
    pub created_at: String,
}

impl TryFrom<UserRow> for User {
    type Error = anyhow::Error;

    fn try_from(row: UserRow) -> Result<Self> {
        let created_at = timestamp::parse(&row.created_at)
            .with_context(|| format!("corrupt created_at on user '{}'", row.username))?;

        Ok(Self {
            username: row.username,
            password_hash: row.password,
            created_at,
        })
    }
}

impl TryFrom<NoticeRow> for Notice {
    type Error = anyhow::Error;

    fn try_from(row: NoticeRow) -> Result<Self> {
        let timestamp = timestamp::parse(&row.created_at)
            .with_context(|| format!("corrupt created_at on notice '{}'", row.id))?;

        Ok(Self {
            id: row.id,
            owner: row.owner,
            book_name: row.book_name,
            description: row.description,
            timestamp,
        })
    }
}

impl TryFrom<MessageRow> for Message {
    type Error = anyhow::Error;

    fn try_from(row: MessageRow) -> Result<Self> {
        let sender = row
            .sender
            .parse()
            .with_context(|| format!("corrupt sender on message {}", row.id))?;
        let timestamp = timestamp::parse(&row.created_at)
            .with_context(|| format!("corrupt created_at on message {}", row.id))?;

        Ok(Self {
            sender,
            text: row.body,
            timestamp,
        })
    }
}
