//! Whole-file JSON documents, used for import and export.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;

use bookboard_types::snapshot::{CONVERSATIONS_FILE, NOTICES_FILE, Snapshot, USERS_FILE};

/// Read one document. A missing file is the empty document.
pub fn load_json<T>(path: &Path) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    match fs::read(path) {
        Ok(bytes) => serde_json::from_slice(&bytes)
            .with_context(|| format!("failed to parse {}", path.display())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(T::default()),
        Err(e) => Err(e).with_context(|| format!("failed to read {}", path.display())),
    }
}

/// Write one document, replacing the old file atomically (temp file + rename).
pub fn save_json<T>(path: &Path, value: &T) -> Result<()>
where
    T: Serialize,
{
    let tmp = temp_path(path);
    {
        let mut file = File::create(&tmp)
            .with_context(|| format!("failed to create {}", tmp.display()))?;
        serde_json::to_writer_pretty(&mut file, value)?;
        file.write_all(b"\n")?;
        file.sync_all()?;
    }

    fs::rename(&tmp, path)
        .with_context(|| format!("failed to replace {}", path.display()))?;
    Ok(())
}

pub fn load_snapshot(dir: &Path) -> Result<Snapshot> {
    Ok(Snapshot {
        users: load_json(&dir.join(USERS_FILE))?,
        notices: load_json(&dir.join(NOTICES_FILE))?,
        conversations: load_json(&dir.join(CONVERSATIONS_FILE))?,
    })
}

pub fn save_snapshot(dir: &Path, snapshot: &Snapshot) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;
    save_json(&dir.join(USERS_FILE), &snapshot.users)?;
    save_json(&dir.join(NOTICES_FILE), &snapshot.notices)?;
    save_json(&dir.join(CONVERSATIONS_FILE), &snapshot.conversations)?;
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
