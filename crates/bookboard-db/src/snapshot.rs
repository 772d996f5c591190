use anyhow::Result;
use tracing::{info, warn};

use bookboard_types::snapshot::{NoticeRecord, Snapshot};
use bookboard_types::timestamp;

use crate::Database;
use crate::queries::{
    insert_message, insert_notice, insert_user, query_all_threads, query_notices, query_users, thread_exists,
};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImportStats {
    pub users: usize,
    pub notices: usize,
    pub messages: usize,
    /// Threads whose notice is neither in the snapshot nor in the database.
    pub orphaned_threads: usize,
    /// Threads already present in the database, left untouched.
    pub existing_threads: usize,
}

impl Database {
    /// Dump users, notices and threads into the three-document form.
    pub fn export_snapshot(&self) -> Result<Snapshot> {
        self.with_conn(|conn| {
            let users = query_users(conn)?
                .into_iter()
                .map(|user| (user.username, user.password_hash))
                .collect();

            let notices = query_notices(conn)?
                .into_iter()
                .map(|notice| (notice.id.clone(), NoticeRecord::from(notice)))
                .collect();

            let conversations = query_all_threads(conn)?;

            Ok(Snapshot {
                users,
                notices,
                conversations,
            })
        })
    }

    /// Insert everything from `snapshot` in one transaction.
    ///
    /// User credentials must already be password hashes. Users and notices that
    /// already exist are left as they are, and so are threads that already have
    /// messages, so importing the same documents twice changes nothing.
    pub fn import_snapshot(&self, snapshot: &Snapshot) -> Result<ImportStats> {
        let created_at = timestamp::format(&timestamp::now());

        let stats = self.with_tx(|tx| {
            let mut stats = ImportStats::default();

            for (username, password_hash) in &snapshot.users {
                if insert_user(tx, username, password_hash, &created_at)? {
                    stats.users += 1;
                }
            }

            for (id, record) in &snapshot.notices {
                let notice = record.clone().into_notice(id.clone());
                if insert_notice(tx, &notice)? {
                    stats.notices += 1;
                }
            }

            for (notice_id, threads) in &snapshot.conversations {
                for (anon_id, messages) in threads {
                    if thread_exists(tx, notice_id, anon_id)? {
                        stats.existing_threads += 1;
                        continue;
                    }
                    for message in messages {
                        if insert_message(tx, notice_id, anon_id, message)? {
                            stats.messages += 1;
                        } else {
                            warn!("Skipping thread {}/{}: notice does not exist", notice_id, anon_id);
                            stats.orphaned_threads += 1;
                            break;
                        }
                    }
                }
            }

            Ok(stats)
        })?;

        info!(
            "Imported {} users, {} notices, {} messages ({} orphaned, {} existing threads skipped)",
            stats.users, stats.notices, stats.messages, stats.orphaned_threads, stats.existing_threads
        );
        Ok(stats)
    }
}
