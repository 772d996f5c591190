//! Random identifiers handed out for notices and anonymous visitors.

/// Length of a notice id in hex characters.
pub const NOTICE_ID_LEN: usize = 16;

/// Length of an anonymous visitor id in hex characters.
pub const ANON_ID_LEN: usize = 8;

/// 8 random bytes, lowercase hex.
pub fn new_notice_id() -> String {
    hex::encode(rand::random::<[u8; NOTICE_ID_LEN / 2]>())
}

/// 4 random bytes, uppercase hex. Scoped to one (session, notice) pair.
pub fn new_anon_id() -> String {
    hex::encode_upper(rand::random::<[u8; ANON_ID_LEN / 2]>())
}
