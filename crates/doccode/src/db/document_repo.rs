//! Document repository: the `documents` table.

use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;

use super::{now_rfc3339, DatabaseError};
use crate::codes::Code;
use crate::models::DocumentType;

/// A document row. Rows are never deleted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRow {
    pub id: i64,
    pub file_path: String,
    pub original_name: String,
    pub current_name: String,
    pub document_type: Option<DocumentType>,
    pub unique_code: Option<Code>,
    pub created_at: String,
    pub updated_at: String,
}

impl DocumentRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            file_path: row.get("file_path")?,
            original_name: row.get("original_name")?,
            current_name: row.get("current_name")?,
            document_type: row.get("document_type")?,
            unique_code: row.get("unique_code")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

/// Query filter parameters for document listing.
#[derive(Debug, Default, Clone)]
pub struct DocumentFilter {
    pub document_type: Option<DocumentType>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

const SELECT_COLUMNS: &str = "SELECT id, file_path, original_name, current_name, document_type,
     unique_code, created_at, updated_at FROM documents";

/// Inserts a document and returns its id. The current name starts out as
/// the original name.
pub fn insert(
    conn: &Connection,
    file_path: &str,
    original_name: &str,
    document_type: Option<DocumentType>,
) -> Result<i64, DatabaseError> {
    let now = now_rfc3339();
    conn.execute(
        "INSERT INTO documents (file_path, original_name, current_name, document_type,
         created_at, updated_at)
         VALUES (?1, ?2, ?2, ?3, ?4, ?4)",
        params![file_path, original_name, document_type, now],
    )
    .map_err(|e| {
        if DatabaseError::is_unique_violation(&e) {
            DatabaseError::DuplicatePath(file_path.to_string())
        } else {
            DatabaseError::Sqlite(e)
        }
    })?;
    Ok(conn.last_insert_rowid())
}

fn find_one(
    conn: &Connection,
    clause: &str,
    param: &dyn rusqlite::ToSql,
) -> Result<Option<DocumentRow>, DatabaseError> {
    let sql = format!("{} WHERE {}", SELECT_COLUMNS, clause);
    let row = conn
        .query_row(&sql, [param], DocumentRow::from_row)
        .optional()?;
    Ok(row)
}

pub fn find_by_id(conn: &Connection, id: i64) -> Result<Option<DocumentRow>, DatabaseError> {
    find_one(conn, "id = ?1", &id)
}

pub fn find_by_path(conn: &Connection, path: &str) -> Result<Option<DocumentRow>, DatabaseError> {
    find_one(conn, "file_path = ?1", &path)
}

pub fn find_by_code(conn: &Connection, code: &Code) -> Result<Option<DocumentRow>, DatabaseError> {
    find_one(conn, "unique_code = ?1", code)
}

/// Lists documents, newest first.
pub fn list(conn: &Connection, filter: &DocumentFilter) -> Result<Vec<DocumentRow>, DatabaseError> {
    let mut param_values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

    let where_clause = match filter.document_type {
        Some(ty) => {
            param_values.push(Box::new(ty));
            "WHERE document_type = ?1".to_string()
        }
        None => String::new(),
    };

    // SQLite treats a negative LIMIT as "no limit".
    let limit = filter.limit.map(|l| l as i64).unwrap_or(-1);
    let offset = filter.offset.unwrap_or(0) as i64;
    param_values.push(Box::new(limit));
    param_values.push(Box::new(offset));
    let sql = format!(
        "{} {} ORDER BY created_at DESC, id DESC LIMIT ?{} OFFSET ?{}",
        SELECT_COLUMNS,
        where_clause,
        param_values.len() - 1,
        param_values.len()
    );

    let params_ref: Vec<&dyn rusqlite::types::ToSql> =
        param_values.iter().map(|p| p.as_ref()).collect();
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params_ref.as_slice(), DocumentRow::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Links a code to a document. Returns the number of rows changed.
pub fn set_code(conn: &Connection, id: i64, code: &Code) -> Result<usize, DatabaseError> {
    let changed = conn
        .execute(
            "UPDATE documents SET unique_code = ?2, updated_at = ?3 WHERE id = ?1",
            params![id, code, now_rfc3339()],
        )
        .map_err(|e| {
            if DatabaseError::is_unique_violation(&e) {
                DatabaseError::DuplicateCode(code.to_string())
            } else {
                DatabaseError::Sqlite(e)
            }
        })?;
    Ok(changed)
}

pub fn update_name(conn: &Connection, id: i64, name: &str) -> Result<usize, DatabaseError> {
    Ok(conn.execute(
        "UPDATE documents SET current_name = ?2, updated_at = ?3 WHERE id = ?1",
        params![id, name, now_rfc3339()],
    )?)
}

/// Moves a document to a new path; the path stays unique.
pub fn update_path(
    conn: &Connection,
    id: i64,
    path: &str,
    name: &str,
) -> Result<usize, DatabaseError> {
    conn.execute(
        "UPDATE documents SET file_path = ?2, current_name = ?3, updated_at = ?4 WHERE id = ?1",
        params![id, path, name, now_rfc3339()],
    )
    .map_err(|e| {
        if DatabaseError::is_unique_violation(&e) {
            DatabaseError::DuplicatePath(path.to_string())
        } else {
            DatabaseError::Sqlite(e)
        }
    })
}

pub fn update_type(
    conn: &Connection,
    id: i64,
    document_type: DocumentType,
) -> Result<usize, DatabaseError> {
    Ok(conn.execute(
        "UPDATE documents SET document_type = ?2, updated_at = ?3 WHERE id = ?1",
        params![id, document_type, now_rfc3339()],
    )?)
}

pub fn count(conn: &Connection) -> Result<i64, DatabaseError> {
    Ok(conn.query_row("SELECT COUNT(*) FROM documents", [], |r| r.get(0))?)
}
