pub mod api;
pub mod ids;
pub mod models;
pub mod snapshot;
pub mod timestamp;
