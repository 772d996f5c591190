use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn
        .query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(
            "
            CREATE TABLE users (
                username    TEXT PRIMARY KEY,
                password    TEXT NOT NULL,
                created_at  TEXT NOT NULL
            );

            -- owner is deliberately not a foreign key
            CREATE TABLE notices (
                id          TEXT PRIMARY KEY,
                owner       TEXT NOT NULL,
                book_name   TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                created_at  TEXT NOT NULL
            );

            CREATE INDEX idx_notices_created
                ON notices(created_at);

            CREATE INDEX idx_notices_owner
                ON notices(owner, created_at);

            CREATE TABLE messages (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                notice_id   TEXT NOT NULL REFERENCES notices(id) ON DELETE CASCADE,
                anon_id     TEXT NOT NULL,
                sender      TEXT NOT NULL CHECK (sender IN ('owner', 'anonymous')),
                body        TEXT NOT NULL,
                created_at  TEXT NOT NULL
            );

            CREATE INDEX idx_messages_thread
                ON messages(notice_id, anon_id, id);

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
