//! Form payloads accepted by the HTTP handlers.

use serde::Deserialize;

// -- Auth --

#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

// -- Notices --

#[derive(Debug, Deserialize)]
pub struct PostNoticeForm {
    #[serde(default)]
    pub book_name: String,
    #[serde(default)]
    pub description: String,
}

// -- Messages --

#[derive(Debug, Deserialize)]
pub struct SendMessageForm {
    #[serde(default)]
    pub message: String,
}
