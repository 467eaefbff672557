use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use log::debug;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::ai::{AnalysisResult, TaskKind};

/// One past submission and its structured result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecord {
    pub id: i64,
    pub input_text: String,
    #[serde(rename = "functionType")]
    pub task_kind: TaskKind,
    pub result: AnalysisResult,
    pub created_at: DateTime<Utc>,
}

// Raw column values, decoded outside the rusqlite row closure so JSON and
// timestamp errors keep their context.
type RawRow = (i64, String, String, String, String);

pub struct HistoryStore {
    connection: Connection,
    path: Option<PathBuf>,
}

impl HistoryStore {
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let db_path = db_path.as_ref();
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let connection = Connection::open(db_path)
            .with_context(|| format!("Failed to open history database {}", db_path.display()))?;
        Self::init(connection, Some(db_path.to_path_buf()))
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?, None)
    }

    fn init(connection: Connection, path: Option<PathBuf>) -> Result<Self> {
        connection
            .execute_batch(include_str!("../../sql/schema.sql"))
            .context("Failed to initialize history schema")?;

        Ok(Self { connection, path })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn create(
        &self,
        input_text: &str,
        task_kind: TaskKind,
        result: &AnalysisResult,
    ) -> Result<HistoryRecord> {
        self.create_at(input_text, task_kind, result, Utc::now())
    }

    pub fn create_at(
        &self,
        input_text: &str,
        task_kind: TaskKind,
        result: &AnalysisResult,
        created_at: DateTime<Utc>,
    ) -> Result<HistoryRecord> {
        let result_json = serde_json::to_string(result)?;

        self.connection.execute(
            "INSERT INTO history (input_text, function_type, result, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                input_text,
                task_kind.as_str(),
                result_json,
                created_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            ],
        )?;

        let id = self.connection.last_insert_rowid();
        debug!("Stored history record {id}");

        Ok(HistoryRecord {
            id,
            input_text: input_text.to_string(),
            task_kind,
            result: result.clone(),
            created_at,
        })
    }

    /// All records, newest first.
    pub fn list_all(&self) -> Result<Vec<HistoryRecord>> {
        let mut stmt = self.connection.prepare(
            "SELECT id, input_text, function_type, result, created_at FROM history
             ORDER BY created_at DESC, id DESC",
        )?;

        let rows = stmt.query_map([], Self::read_row)?;

        let mut records = Vec::new();
        for row in rows {
            records.push(Self::decode(row?)?);
        }

        Ok(records)
    }

    pub fn get(&self, id: i64) -> Result<Option<HistoryRecord>> {
        let row = self
            .connection
            .query_row(
                "SELECT id, input_text, function_type, result, created_at FROM history
                 WHERE id = ?1",
                [id],
                Self::read_row,
            )
            .optional()?;

        row.map(Self::decode).transpose()
    }

    /// Returns false when no record had this id.
    pub fn delete(&self, id: i64) -> Result<bool> {
        let deleted = self
            .connection
            .execute("DELETE FROM history WHERE id = ?1", [id])?;
        Ok(deleted > 0)
    }

    pub fn clear(&self) -> Result<usize> {
        let deleted = self.connection.execute("DELETE FROM history", [])?;
        Ok(deleted)
    }

    pub fn count(&self) -> Result<i64> {
        let total: i64 = self
            .connection
            .query_row("SELECT COUNT(*) FROM history", [], |row| row.get(0))?;
        Ok(total)
    }

    pub fn stats(&self) -> Result<String> {
        let mut stats = String::new();

        let total = self.count()?;

        let mut stmt = self.connection.prepare(
            "SELECT function_type, COUNT(*) FROM history GROUP BY function_type ORDER BY function_type",
        )?;
        let per_kind = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;

        let latest: Option<String> = self
            .connection
            .query_row("SELECT MAX(created_at) FROM history", [], |row| row.get(0))?;

        stats.push_str("History Statistics:\n");
        stats.push_str(&format!("- Total records: {total}\n"));
        for row in per_kind {
            let (kind, count) = row?;
            stats.push_str(&format!("- {kind}: {count}\n"));
        }
        if let Some(latest) = latest {
            stats.push_str(&format!("- Latest: {latest}\n"));
        }

        Ok(stats)
    }

    fn read_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawRow> {
        Ok((
            row.get(0)?,
            row.get(1)?,
            row.get(2)?,
            row.get(3)?,
            row.get(4)?,
        ))
    }

    fn decode((id, input_text, kind, result, created_at): RawRow) -> Result<HistoryRecord> {
        let task_kind = kind
            .parse::<TaskKind>()
            .with_context(|| format!("History record {id} has a bad function type"))?;
        let result = serde_json::from_str(&result)
            .with_context(|| format!("History record {id} has a corrupt result"))?;
        let created_at = DateTime::parse_from_rfc3339(&created_at)
            .with_context(|| format!("History record {id} has a bad timestamp"))?
            .with_timezone(&Utc);

        Ok(HistoryRecord {
            id,
            input_text,
            task_kind,
            result,
            created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::parse_response;
    use chrono::Duration;

    #[test]
    fn create_then_get() {
        let store = HistoryStore::open_in_memory().unwrap();
        let result = parse_response("1. Core\n- Add search");

        let created = store
            .create("a homepage", TaskKind::FunctionExpand, &result)
            .unwrap();
        let fetched = store.get(created.id).unwrap().unwrap();

        assert_eq!(fetched.input_text, "a homepage");
        assert_eq!(fetched.task_kind, TaskKind::FunctionExpand);
        assert_eq!(fetched.result, result);
        assert_eq!(
            fetched.created_at.timestamp_millis(),
            created.created_at.timestamp_millis()
        );
    }

    #[test]
    fn ids_auto_increment_and_are_not_reused() {
        let store = HistoryStore::open_in_memory().unwrap();
        let result = parse_response("prose");

        let first = store.create("one", TaskKind::Analysis, &result).unwrap();
        let second = store.create("two", TaskKind::Analysis, &result).unwrap();
        assert!(second.id > first.id);

        assert!(store.delete(second.id).unwrap());
        let third = store.create("three", TaskKind::Analysis, &result).unwrap();
        assert!(third.id > second.id);
    }

    #[test]
    fn list_is_newest_first() {
        let store = HistoryStore::open_in_memory().unwrap();
        let result = parse_response("prose");
        let now = Utc::now();

        store
            .create_at("old", TaskKind::Analysis, &result, now - Duration::days(3))
            .unwrap();
        store
            .create_at("new", TaskKind::Analysis, &result, now)
            .unwrap();
        store
            .create_at("middle", TaskKind::Analysis, &result, now - Duration::days(1))
            .unwrap();

        let inputs: Vec<_> = store
            .list_all()
            .unwrap()
            .into_iter()
            .map(|r| r.input_text)
            .collect();
        assert_eq!(inputs, vec!["new", "middle", "old"]);
    }

    #[test]
    fn delete_missing_record_returns_false() {
        let store = HistoryStore::open_in_memory().unwrap();
        assert!(!store.delete(42).unwrap());
        assert!(store.get(42).unwrap().is_none());
    }

    #[test]
    fn clear_and_stats() {
        let store = HistoryStore::open_in_memory().unwrap();
        let result = parse_response("prose");
        store.create("a", TaskKind::Analysis, &result).unwrap();
        store.create("b", TaskKind::FunctionExpand, &result).unwrap();

        let stats = store.stats().unwrap();
        assert!(stats.contains("Total records: 2"));
        assert!(stats.contains("analysis: 1"));
        assert!(stats.contains("function-expand: 1"));

        assert_eq!(store.clear().unwrap(), 2);
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn record_json_uses_http_field_names() {
        let store = HistoryStore::open_in_memory().unwrap();
        let record = store
            .create("x", TaskKind::FunctionExpand, &parse_response("prose"))
            .unwrap();

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["inputText"], "x");
        assert_eq!(json["functionType"], "function-expand");
        assert!(json["createdAt"].is_string());
        assert!(json["result"]["sections"].is_array());
    }
}
