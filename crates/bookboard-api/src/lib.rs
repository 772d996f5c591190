pub mod auth;
pub mod chat;
pub mod error;
pub mod middleware;
pub mod notices;
pub mod passwords;
pub mod router;
pub mod session;
pub mod state;
pub mod views;
