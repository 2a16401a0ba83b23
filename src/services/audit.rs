use std::sync::Mutex;
use std::time::{Duration, Instant};

use rusqlite::Connection;

use crate::db::queries;

const DEDUP_WINDOW: Duration = Duration::from_secs(1);

/// Best-effort audit trail. A repeat of the identical (user, action) pair
/// within one second is dropped. The guard is process memory only: not
/// persisted, not shared across instances, reset on restart.
pub struct AuditLog {
    last: Mutex<Option<LastEntry>>,
}

struct LastEntry {
    user: String,
    action: String,
    at: Instant,
}

impl AuditLog {
    pub fn new() -> Self {
        Self {
            last: Mutex::new(None),
        }
    }

    /// Appends an audit entry. Write failures are logged and swallowed;
    /// auditing never fails the request that triggered it.
    pub fn record(&self, conn: &Connection, user: &str, action: &str) {
        let user = if user.is_empty() { "system" } else { user };

        {
            let mut last = self.last.lock().unwrap();
            if let Some(entry) = last.as_ref() {
                if entry.user == user && entry.action == action && entry.at.elapsed() < DEDUP_WINDOW
                {
                    tracing::debug!(user, action, "suppressing duplicate audit entry");
                    return;
                }
            }
            *last = Some(LastEntry {
                user: user.to_string(),
                action: action.to_string(),
                at: Instant::now(),
            });
        }

        if let Err(e) = queries::insert_log(conn, user, action) {
            tracing::warn!(error = %e, "failed to write audit log entry");
        }
    }
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    #[test]
    fn identical_pair_in_window_is_suppressed() {
        let conn = db::init_db(":memory:").unwrap();
        let audit = AuditLog::new();

        audit.record(&conn, "Ana", "created court Center");
        audit.record(&conn, "Ana", "created court Center");

        let logs = queries::list_logs(&conn).unwrap();
        assert_eq!(logs.len(), 1);
    }

    #[test]
    fn different_action_is_not_suppressed() {
        let conn = db::init_db(":memory:").unwrap();
        let audit = AuditLog::new();

        audit.record(&conn, "Ana", "created court Center");
        audit.record(&conn, "Ana", "deleted court Center");
        audit.record(&conn, "Bea", "deleted court Center");

        let logs = queries::list_logs(&conn).unwrap();
        assert_eq!(logs.len(), 3);
    }

    #[test]
    fn empty_user_is_recorded_as_system() {
        let conn = db::init_db(":memory:").unwrap();
        let audit = AuditLog::new();

        audit.record(&conn, "", "startup");

        let logs = queries::list_logs(&conn).unwrap();
        assert_eq!(logs[0].user, "system");
    }
}
