use std::collections::BTreeMap;

use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row};

use bookboard_types::models::{Message, Notice, Threads, User};
use bookboard_types::timestamp;

use crate::Database;
use crate::models::{MessageRow, NoticeRow, UserRow};

/// Result of an owner-scoped delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// Notice and its threads are gone; carries the number of messages removed.
    Deleted { messages: usize },
    NotFound,
    NotOwner,
}

impl Database {
    // -- Users --

    /// Returns false when the username is already taken.
    pub fn create_user(&self, username: &str, password_hash: &str) -> Result<bool> {
        let created_at = timestamp::format(&timestamp::now());
        self.with_conn(|conn| insert_user(conn, username, password_hash, &created_at))
    }

    pub fn get_user(&self, username: &str) -> Result<Option<User>> {
        self.with_conn(|conn| query_user(conn, username))
    }

    // -- Notices --

    /// Returns false when a notice with the same id already exists.
    pub fn insert_notice(&self, notice: &Notice) -> Result<bool> {
        self.with_conn(|conn| insert_notice(conn, notice))
    }

    pub fn get_notice(&self, id: &str) -> Result<Option<Notice>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT id, owner, book_name, description, created_at FROM notices WHERE id = ?1",
                    [id],
                    notice_row,
                )
                .optional()?;

            row.map(Notice::try_from).transpose()
        })
    }

    /// Every notice, newest first.
    pub fn list_notices(&self) -> Result<Vec<Notice>> {
        self.with_conn(query_notices)
    }

    /// The owner's notices, newest first.
    pub fn list_notices_by_owner(&self, owner: &str) -> Result<Vec<Notice>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, owner, book_name, description, created_at
                 FROM notices
                 WHERE owner = ?1
                 ORDER BY created_at DESC, rowid DESC",
            )?;

            let rows = stmt
                .query_map([owner], notice_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            rows.into_iter().map(Notice::try_from).collect()
        })
    }

    /// Delete a notice together with all of its threads, but only on behalf of its owner.
    pub fn delete_notice(&self, id: &str, owner: &str) -> Result<DeleteOutcome> {
        self.with_tx(|tx| {
            let current_owner: Option<String> = tx
                .query_row("SELECT owner FROM notices WHERE id = ?1", [id], |row| row.get(0))
                .optional()?;

            match current_owner {
                None => Ok(DeleteOutcome::NotFound),
                Some(current) if current != owner => Ok(DeleteOutcome::NotOwner),
                Some(_) => {
                    let messages = tx.execute("DELETE FROM messages WHERE notice_id = ?1", [id])?;
                    tx.execute("DELETE FROM notices WHERE id = ?1", [id])?;
                    Ok(DeleteOutcome::Deleted { messages })
                }
            }
        })
    }

    // -- Messages --

    /// Append to the (notice_id, anon_id) thread. Returns false if the notice no longer exists.
    pub fn append_message(&self, notice_id: &str, anon_id: &str, message: &Message) -> Result<bool> {
        self.with_conn(|conn| insert_message(conn, notice_id, anon_id, message))
    }

    pub fn get_thread(&self, notice_id: &str, anon_id: &str) -> Result<Vec<Message>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, notice_id, anon_id, sender, body, created_at
                 FROM messages
                 WHERE notice_id = ?1 AND anon_id = ?2
                 ORDER BY id",
            )?;

            let rows = stmt
                .query_map([notice_id, anon_id], message_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            rows.into_iter().map(Message::try_from).collect()
        })
    }

    /// All threads of one notice, keyed by anon_id.
    pub fn get_threads(&self, notice_id: &str) -> Result<Threads> {
        self.with_conn(|conn| query_threads(conn, notice_id))
    }

    /// Threads for several notices at once. Notices without messages are omitted.
    pub fn get_threads_for_notices(&self, notice_ids: &[String]) -> Result<BTreeMap<String, Threads>> {
        self.with_conn(|conn| {
            let mut out = BTreeMap::new();
            for id in notice_ids {
                let threads = query_threads(conn, id)?;
                if !threads.is_empty() {
                    out.insert(id.clone(), threads);
                }
            }
            Ok(out)
        })
    }
}

pub(crate) fn insert_user(
    conn: &Connection,
    username: &str,
    password_hash: &str,
    created_at: &str,
) -> Result<bool> {
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO users (username, password, created_at) VALUES (?1, ?2, ?3)",
        (username, password_hash, created_at),
    )?;
    Ok(inserted > 0)
}

pub(crate) fn insert_notice(conn: &Connection, notice: &Notice) -> Result<bool> {
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO notices (id, owner, book_name, description, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        (
            &notice.id,
            &notice.owner,
            &notice.book_name,
            &notice.description,
            timestamp::format(&notice.timestamp),
        ),
    )?;
    Ok(inserted > 0)
}

pub(crate) fn insert_message(
    conn: &Connection,
    notice_id: &str,
    anon_id: &str,
    message: &Message,
) -> Result<bool> {
    let inserted = conn.execute(
        "INSERT INTO messages (notice_id, anon_id, sender, body, created_at)
         SELECT ?1, ?2, ?3, ?4, ?5
         WHERE EXISTS (SELECT 1 FROM notices WHERE id = ?1)",
        (
            notice_id,
            anon_id,
            message.sender.as_str(),
            &message.text,
            timestamp::format(&message.timestamp),
        ),
    )?;
    Ok(inserted > 0)
}

pub(crate) fn thread_exists(conn: &Connection, notice_id: &str, anon_id: &str) -> Result<bool> {
    let exists = conn.query_row(
        "SELECT EXISTS (SELECT 1 FROM messages WHERE notice_id = ?1 AND anon_id = ?2)",
        (notice_id, anon_id),
        |r| r.get(0),
    )?;
    Ok(exists)
}

pub(crate) fn query_users(conn: &Connection) -> Result<Vec<User>> {
    let mut stmt = conn.prepare("SELECT username, password, created_at FROM users ORDER BY username")?;

    let rows = stmt
        .query_map([], user_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    rows.into_iter().map(User::try_from).collect()
}

pub(crate) fn query_notices(conn: &Connection) -> Result<Vec<Notice>> {
    let mut stmt = conn.prepare(
        "SELECT id, owner, book_name, description, created_at
         FROM notices
         ORDER BY created_at DESC, rowid DESC",
    )?;

    let rows = stmt
        .query_map([], notice_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    rows.into_iter().map(Notice::try_from).collect()
}

/// Every message, grouped by notice then anon_id, in append order.
pub(crate) fn query_all_threads(conn: &Connection) -> Result<BTreeMap<String, Threads>> {
    let mut stmt = conn.prepare(
        "SELECT id, notice_id, anon_id, sender, body, created_at
         FROM messages
         ORDER BY notice_id, anon_id, id",
    )?;

    let rows = stmt
        .query_map([], message_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut out: BTreeMap<String, Threads> = BTreeMap::new();
    for row in rows {
        let notice_id = row.notice_id.clone();
        let anon_id = row.anon_id.clone();
        let message = Message::try_from(row)?;
        out.entry(notice_id).or_default().entry(anon_id).or_default().push(message);
    }
    Ok(out)
}

fn query_user(conn: &Connection, username: &str) -> Result<Option<User>> {
    let row = conn
        .query_row(
            "SELECT username, password, created_at FROM users WHERE username = ?1",
            [username],
            user_row,
        )
        .optional()?;

    row.map(User::try_from).transpose()
}

fn query_threads(conn: &Connection, notice_id: &str) -> Result<Threads> {
    let mut stmt = conn.prepare(
        "SELECT id, notice_id, anon_id, sender, body, created_at
         FROM messages
         WHERE notice_id = ?1
         ORDER BY anon_id, id",
    )?;

    let rows = stmt
        .query_map([notice_id], message_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut threads = Threads::new();
    for row in rows {
        let anon_id = row.anon_id.clone();
        threads.entry(anon_id).or_default().push(Message::try_from(row)?);
    }
    Ok(threads)
}

fn user_row(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        username: row.get(0)?,
        password: row.get(1)?,
        created_at: row.get(2)?,
    })
}

fn notice_row(row: &Row<'_>) -> rusqlite::Result<NoticeRow> {
    Ok(NoticeRow {
        id: row.get(0)?,
        owner: row.get(1)?,
        book_name: row.get(2)?,
        description: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn message_row(row: &Row<'_>) -> rusqlite::Result<MessageRow> {
    Ok(MessageRow {
        id: row.get(0)?,
        notice_id: row.get(1)?,
        anon_id: row.get(2)?,
        sender: row.get(3)?,
        body: row.get(4)?,
        created_at: row.get(5)?,
    })
}
