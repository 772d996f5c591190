//! `import` / `export` commands for the flat JSON documents.

use std::path::Path;

use anyhow::{Result, anyhow};
use tracing::info;

use bookboard_api::passwords::Passwords;
use bookboard_db::{Database, documents};

/// Load the three documents from `dir` and merge them into the database.
/// Plaintext credentials are hashed on the way in.
pub fn import(db: &Database, passwords: &Passwords, dir: &Path) -> Result<()> {
    let mut snapshot = documents::load_snapshot(dir)?;

    let mut hashed = 0;
    for (username, credential) in snapshot.users.iter_mut() {
        if !Passwords::is_hash(credential) {
            *credential = passwords
                .hash(credential)
                .map_err(|e| anyhow!("failed to hash password for {}: {}", username, e))?;
            hashed += 1;
        }
    }

    let stats = db.import_snapshot(&snapshot)?;
    info!(
        "Import from {} done: {} users ({} plaintext passwords hashed), {} notices, {} messages",
        dir.display(),
        stats.users,
        hashed,
        stats.notices,
        stats.messages
    );
    Ok(())
}

pub fn export(db: &Database, dir: &Path) -> Result<()> {
    let snapshot = db.export_snapshot()?;
    documents::save_snapshot(dir, &snapshot)?;

    info!(
        "Exported {} users, {} notices, {} conversations to {}",
        snapshot.users.len(),
        snapshot.notices.len(),
        snapshot.conversations.len(),
        dir.display()
    );
    Ok(())
}
