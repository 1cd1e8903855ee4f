use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Mutex;

/// One suppressed-notification verdict, as persisted for the dashboard and
/// the evidence export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreatRecord {
    pub id: i64,
    pub timestamp: i64,
    pub app_source: String,
    pub sender_id: Option<String>,
    pub message_snippet: String,
    pub reason: String,
    pub score: u32,
    pub hash: String,
    pub is_false_positive: bool,
    pub screenshot_path: Option<String>,
}

/// Insert payload; the store assigns the id.
#[derive(Debug, Clone)]
pub struct NewThreatRecord {
    pub timestamp: i64,
    pub app_source: String,
    pub sender_id: Option<String>,
    pub message_snippet: String,
    pub reason: String,
    pub score: u32,
    pub hash: String,
    pub screenshot_path: Option<String>,
}

/// Dashboard counters. False positives are excluded from the category
/// counts and from the total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreatCounts {
    pub total: u64,
    pub virtex: u64,
    pub phishing: u64,
    pub spam: u64,
    pub false_positives: u64,
}

pub struct ThreatStore {
    conn: Mutex<Connection>,
}

impl ThreatStore {
    pub fn open(db_path: &str) -> Result<Self> {
        if let Some(parent) = Path::new(db_path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create database directory: {}", parent.display())
                })?;
            }
        }
        let conn = Connection::open(db_path)
            .with_context(|| format!("Failed to open threat database: {db_path}"))?;
        Self::init_schema(&conn)?;
        Ok(ThreatStore {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;
        Ok(ThreatStore {
            conn: Mutex::new(conn),
        })
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS threat_logs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp INTEGER NOT NULL,
                app_source TEXT NOT NULL,
                sender_id TEXT,
                message_snippet TEXT NOT NULL,
                reason TEXT NOT NULL,
                score INTEGER NOT NULL,
                hash TEXT NOT NULL,
                is_false_positive INTEGER NOT NULL DEFAULT 0,
                screenshot_path TEXT
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "INSERT OR IGNORE INTO settings (key, value) VALUES ('shield_enabled', 'true')",
            [],
        )?;

        Ok(())
    }

    pub fn insert(&self, record: &NewThreatRecord) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO threat_logs
             (timestamp, app_source, sender_id, message_snippet, reason, score, hash, screenshot_path)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                record.timestamp,
                record.app_source,
                record.sender_id,
                record.message_snippet,
                record.reason,
                record.score,
                record.hash,
                record.screenshot_path,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Flips the reviewer verdict. Returns false when the id is unknown.
    pub fn set_false_positive(&self, id: i64, flag: bool) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let changed = conn.execute(
            "UPDATE threat_logs SET is_false_positive = ? WHERE id = ?",
            params![flag, id],
        )?;
        Ok(changed > 0)
    }

    pub fn delete(&self, id: i64) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let changed = conn.execute("DELETE FROM threat_logs WHERE id = ?", params![id])?;
        Ok(changed > 0)
    }

    pub fn delete_all(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute("DELETE FROM threat_logs", [])?;
        Ok(())
    }

    pub fn list_all(&self) -> Result<Vec<ThreatRecord>> {
        self.query_records("SELECT * FROM threat_logs ORDER BY timestamp DESC", [])
    }

    pub fn list_by_reason(&self, reason: &str) -> Result<Vec<ThreatRecord>> {
        self.query_records(
            "SELECT * FROM threat_logs WHERE reason = ? ORDER BY timestamp DESC",
            params![reason],
        )
    }

    fn query_records<P: rusqlite::Params>(&self, sql: &str, params: P) -> Result<Vec<ThreatRecord>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(sql)?;
        let records = stmt
            .query_map(params, Self::row_to_record)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(records)
    }

    fn row_to_record(row: &Row) -> rusqlite::Result<ThreatRecord> {
        Ok(ThreatRecord {
            id: row.get("id")?,
            timestamp: row.get("timestamp")?,
            app_source: row.get("app_source")?,
            sender_id: row.get("sender_id")?,
            message_snippet: row.get("message_snippet")?,
            reason: row.get("reason")?,
            score: row.get("score")?,
            hash: row.get("hash")?,
            is_false_positive: row.get("is_false_positive")?,
            screenshot_path: row.get("screenshot_path")?,
        })
    }

    pub fn counts(&self) -> Result<ThreatCounts> {
        let conn = self.conn.lock().unwrap();
        let count_valid = |reason: Option<&str>| -> Result<u64> {
            let count: u64 = match reason {
                Some(reason) => conn.query_row(
                    "SELECT COUNT(*) FROM threat_logs WHERE reason = ? AND is_false_positive = 0",
                    params![reason],
                    |row| row.get(0),
                )?,
                None => conn.query_row(
                    "SELECT COUNT(*) FROM threat_logs WHERE is_false_positive = 0",
                    [],
                    |row| row.get(0),
                )?,
            };
            Ok(count)
        };

        let false_positives: u64 = conn.query_row(
            "SELECT COUNT(*) FROM threat_logs WHERE is_false_positive = 1",
            [],
            |row| row.get(0),
        )?;

        Ok(ThreatCounts {
            total: count_valid(None)?,
            virtex: count_valid(Some("virtex"))?,
            phishing: count_valid(Some("phishing"))?,
            spam: count_valid(Some("spam"))?,
            false_positives,
        })
    }

    pub fn get_setting(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn.lock().unwrap();
        let value = conn
            .query_row(
                "SELECT value FROM settings WHERE key = ?",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    pub fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT OR REPLACE INTO settings (key, value) VALUES (?, ?)",
            params![key, value],
        )?;
        Ok(())
    }

    /// The global kill switch checked by the shield pipeline before it
    /// invokes the analyzer. Defaults to enabled.
    pub fn shield_enabled(&self) -> Result<bool> {
        Ok(self.get_setting("shield_enabled")?.as_deref() != Some("false"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(reason: &str, timestamp: i64) -> NewThreatRecord {
        NewThreatRecord {
            timestamp,
            app_source: "com.whatsapp".to_string(),
            sender_id: Some("+628123".to_string()),
            message_snippet: "menang hadiah https://bit.ly/x".to_string(),
            reason: reason.to_string(),
            score: 65,
            hash: "ab".repeat(32),
            screenshot_path: None,
        }
    }

    #[test]
    fn test_insert_and_list_newest_first() {
        let store = ThreatStore::open_in_memory().unwrap();
        store.insert(&sample("phishing", 1000)).unwrap();
        store.insert(&sample("virtex", 2000)).unwrap();

        let records = store.list_all().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].reason, "virtex");
        assert_eq!(records[1].reason, "phishing");
        assert_eq!(records[1].sender_id.as_deref(), Some("+628123"));
    }

    #[test]
    fn test_list_by_reason() {
        let store = ThreatStore::open_in_memory().unwrap();
        store.insert(&sample("phishing", 1)).unwrap();
        store.insert(&sample("virtex", 2)).unwrap();
        store.insert(&sample("phishing", 3)).unwrap();

        let phishing = store.list_by_reason("phishing").unwrap();
        assert_eq!(phishing.len(), 2);
        assert!(phishing.iter().all(|r| r.reason == "phishing"));
    }

    #[test]
    fn test_counts_exclude_false_positives() {
        let store = ThreatStore::open_in_memory().unwrap();
        let id = store.insert(&sample("phishing", 1)).unwrap();
        store.insert(&sample("virtex", 2)).unwrap();
        store.insert(&sample("spam", 3)).unwrap();

        assert!(store.set_false_positive(id, true).unwrap());

        let counts = store.counts().unwrap();
        assert_eq!(counts.total, 2);
        assert_eq!(counts.phishing, 0);
        assert_eq!(counts.virtex, 1);
        assert_eq!(counts.spam, 1);
        assert_eq!(counts.false_positives, 1);
    }

    #[test]
    fn test_false_positive_flag_roundtrip() {
        let store = ThreatStore::open_in_memory().unwrap();
        let id = store.insert(&sample("phishing", 1)).unwrap();

        assert!(store.set_false_positive(id, true).unwrap());
        assert!(store.list_all().unwrap()[0].is_false_positive);

        assert!(store.set_false_positive(id, false).unwrap());
        assert!(!store.list_all().unwrap()[0].is_false_positive);

        // Unknown id reports no change
        assert!(!store.set_false_positive(9999, true).unwrap());
    }

    #[test]
    fn test_delete_and_delete_all() {
        let store = ThreatStore::open_in_memory().unwrap();
        let id = store.insert(&sample("phishing", 1)).unwrap();
        store.insert(&sample("virtex", 2)).unwrap();

        assert!(store.delete(id).unwrap());
        assert!(!store.delete(id).unwrap());
        assert_eq!(store.list_all().unwrap().len(), 1);

        store.delete_all().unwrap();
        assert!(store.list_all().unwrap().is_empty());
    }

    #[test]
    fn test_shield_enabled_defaults_true() {
        let store = ThreatStore::open_in_memory().unwrap();
        assert!(store.shield_enabled().unwrap());

        store.set_setting("shield_enabled", "false").unwrap();
        assert!(!store.shield_enabled().unwrap());

        store.set_setting("shield_enabled", "true").unwrap();
        assert!(store.shield_enabled().unwrap());
    }

    #[test]
    fn test_settings_roundtrip() {
        let store = ThreatStore::open_in_memory().unwrap();
        assert_eq!(store.get_setting("missing").unwrap(), None);

        store.set_setting("theme", "dark").unwrap();
        assert_eq!(store.get_setting("theme").unwrap().as_deref(), Some("dark"));

        store.set_setting("theme", "light").unwrap();
        assert_eq!(store.get_setting("theme").unwrap().as_deref(), Some("light"));
    }
}
