//! Code repository: the `codes` table.

use std::collections::BTreeMap;

use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;

use super::{now_rfc3339, DatabaseError};
use crate::codes::Code;
use crate::models::CodeStatus;

/// A row of the `codes` table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeAllocation {
    pub code: Code,
    pub document_id: Option<i64>,
    pub allocated_at: String,
    pub status: CodeStatus,
}

/// Records a code as `allocated` and unlinked.
pub fn insert_allocated(conn: &Connection, code: &Code) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO codes (code, document_id, allocated_at, status) VALUES (?1, NULL, ?2, ?3)",
        params![code, now_rfc3339(), CodeStatus::Allocated],
    )
    .map_err(|e| {
        if DatabaseError::is_unique_violation(&e) {
            DatabaseError::DuplicateCode(code.to_string())
        } else {
            DatabaseError::Sqlite(e)
        }
    })?;
    Ok(())
}

pub fn exists(conn: &Connection, code: &Code) -> Result<bool, DatabaseError> {
    let found: Option<i64> = conn
        .query_row("SELECT 1 FROM codes WHERE code = ?1", params![code], |r| {
            r.get(0)
        })
        .optional()?;
    Ok(found.is_some())
}

pub fn find(conn: &Connection, code: &Code) -> Result<Option<CodeAllocation>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT code, document_id, allocated_at, status FROM codes WHERE code = ?1",
            params![code],
            |r| {
                Ok(CodeAllocation {
                    code: r.get(0)?,
                    document_id: r.get(1)?,
                    allocated_at: r.get(2)?,
                    status: r.get(3)?,
                })
            },
        )
        .optional()?;
    Ok(row)
}

/// Links a code to a document and marks it `in_use`.
pub fn mark_in_use(conn: &Connection, code: &Code, document_id: i64) -> Result<usize, DatabaseError> {
    Ok(conn.execute(
        "UPDATE codes SET status = ?2, document_id = ?3 WHERE code = ?1",
        params![code, CodeStatus::InUse, document_id],
    )?)
}

/// Deletes the code only while it is still `allocated` and unlinked.
/// Returns the number of rows removed (0 or 1).
pub fn delete_if_unlinked(conn: &Connection, code: &Code) -> Result<usize, DatabaseError> {
    Ok(conn.execute(
        "DELETE FROM codes WHERE code = ?1 AND document_id IS NULL AND status = ?2",
        params![code, CodeStatus::Allocated],
    )?)
}

pub fn count(conn: &Connection) -> Result<i64, DatabaseError> {
    Ok(conn.query_row("SELECT COUNT(*) FROM codes", [], |r| r.get(0))?)
}

/// Row counts keyed by status text.
pub fn count_by_status(conn: &Connection) -> Result<BTreeMap<String, i64>, DatabaseError> {
    let mut stmt = conn.prepare("SELECT status, COUNT(*) FROM codes GROUP BY status")?;
    let counts = stmt
        .query_map([], |r| Ok((r.get::<_, String>(0)?, r.get::<_, i64>(1)?)))?
        .collect::<Result<BTreeMap<_, _>, _>>()?;
    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{document_repo, Database};

    fn code(s: &str) -> Code {
        Code::new(s).unwrap()
    }

    #[test]
    fn test_insert_and_find() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            insert_allocated(conn, &code("AAAAB"))?;
            assert!(exists(conn, &code("AAAAB"))?);
            assert!(!exists(conn, &code("AAAAC"))?);

            let row = find(conn, &code("AAAAB"))?.unwrap();
            assert_eq!(row.status, CodeStatus::Allocated);
            assert_eq!(row.document_id, None);
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_duplicate_code() {
        let db = Database::open_in_memory().unwrap();
        let result = db.with_conn(|conn| {
            insert_allocated(conn, &code("ABCDE"))?;
            insert_allocated(conn, &code("ABCDE"))
        });
        assert!(matches!(result, Err(DatabaseError::DuplicateCode(c)) if c == "ABCDE"));
    }

    #[test]
    fn test_delete_only_unlinked() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            let doc = document_repo::insert(conn, "/docs/a.pdf", "a.pdf", None)?;
            insert_allocated(conn, &code("AAAAA"))?;
            insert_allocated(conn, &code("AAAAB"))?;
            mark_in_use(conn, &code("AAAAA"), doc)?;

            assert_eq!(delete_if_unlinked(conn, &code("AAAAA"))?, 0);
            assert_eq!(delete_if_unlinked(conn, &code("AAAAB"))?, 1);
            assert_eq!(delete_if_unlinked(conn, &code("AAAAB"))?, 0);

            let counts = count_by_status(conn)?;
            assert_eq!(counts.get("in_use"), Some(&1));
            assert_eq!(counts.get("allocated"), None);
            assert_eq!(count(conn)?, 1);
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_link_requires_existing_document() {
        let db = Database::open_in_memory().unwrap();
        let result = db.with_conn(|conn| {
            insert_allocated(conn, &code("AAAAA"))?;
            mark_in_use(conn, &code("AAAAA"), 999)
        });
        assert!(matches!(result, Err(DatabaseError::Sqlite(_))));
    }
}
