//! Processing-step history: append-only `processing_steps` rows.

use rusqlite::{params, Connection, Row};
use serde::Serialize;

use super::{now_rfc3339, DatabaseError};
use crate::models::ProcessingStatus;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingStepRow {
    pub id: i64,
    pub document_id: i64,
    pub step_name: String,
    pub step_order: i64,
    pub status: ProcessingStatus,
    pub started_at: String,
    pub completed_at: Option<String>,
    pub error_message: Option<String>,
}

impl ProcessingStepRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            document_id: row.get("document_id")?,
            step_name: row.get("step_name")?,
            step_order: row.get("step_order")?,
            status: row.get("status")?,
            started_at: row.get("started_at")?,
            completed_at: row.get("completed_at")?,
            error_message: row.get("error_message")?,
        })
    }
}

/// Appends a step. `completed_at` is stamped only for terminal statuses.
pub fn insert(
    conn: &Connection,
    document_id: i64,
    step_name: &str,
    step_order: i64,
    status: ProcessingStatus,
    error_message: Option<&str>,
) -> Result<i64, DatabaseError> {
    let started_at = now_rfc3339();
    let completed_at = status.is_terminal().then(|| started_at.clone());
    conn.execute(
        "INSERT INTO processing_steps (document_id, step_name, step_order, status, started_at,
         completed_at, error_message)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            document_id,
            step_name,
            step_order,
            status,
            started_at,
            completed_at,
            error_message
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn list(conn: &Connection, document_id: i64) -> Result<Vec<ProcessingStepRow>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, document_id, step_name, step_order, status, started_at, completed_at,
         error_message FROM processing_steps WHERE document_id = ?1 ORDER BY id",
    )?;
    let rows = stmt
        .query_map(params![document_id], ProcessingStepRow::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{document_repo, Database};

    #[test]
    fn test_terminal_steps_are_completed() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            let doc = document_repo::insert(conn, "/docs/a.pdf", "a.pdf", None)?;
            insert(conn, doc, "rename", 1, ProcessingStatus::Success, None)?;
            insert(conn, doc, "convert", 2, ProcessingStatus::InProgress, None)?;
            insert(conn, doc, "convert", 2, ProcessingStatus::Failed, Some("no text"))?;

            let steps = list(conn, doc)?;
            assert_eq!(steps.len(), 3);
            assert!(steps[0].completed_at.is_some());
            assert!(steps[1].completed_at.is_none());
            assert_eq!(steps[2].error_message.as_deref(), Some("no text"));
            assert_eq!(steps[2].step_order, 2);
            Ok(())
        })
        .unwrap();
    }
}
