use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered account. `password_hash` is an Argon2id PHC string.
#[derive(Debug, Clone)]
pub struct User {
    pub username: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// A posted "book wanted/available" listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub id: String,
    pub owner: String,
    pub book_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(with = "crate::timestamp")]
    pub timestamp: DateTime<Utc>,
}

impl Notice {
    pub fn is_owned_by(&self, username: Option<&str>) -> bool {
        username == Some(self.owner.as_str())
    }

    pub fn posted_at(&self) -> String {
        self.timestamp.format("%Y-%m-%d %H:%M").to_string()
    }
}

/// Who wrote a message within a thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    Owner,
    Anonymous,
}

impl Sender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Anonymous => "anonymous",
        }
    }
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown message sender: {0}")]
pub struct UnknownSender(pub String);

impl FromStr for Sender {
    type Err = UnknownSender;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "owner" => Ok(Self::Owner),
            "anonymous" => Ok(Self::Anonymous),
            other => Err(UnknownSender(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub sender: Sender,
    pub text: String,
    #[serde(with = "crate::timestamp")]
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn from_owner(&self) -> bool {
        self.sender == Sender::Owner
    }

    pub fn posted_at(&self) -> String {
        self.timestamp.format("%Y-%m-%d %H:%M").to_string()
    }
}

/// anon_id -> ordered messages, for one notice.
pub type Threads = BTreeMap<String, Vec<Message>>;
