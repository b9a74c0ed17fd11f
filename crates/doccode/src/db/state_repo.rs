//! The singleton allocation counter in `registry_state`.

use rusqlite::{params, Connection, OptionalExtension};

use super::DatabaseError;

const NEXT_CODE_INDEX: &str = "next_code_index";

/// Advances the counter and returns the value it held before.
///
/// A single `UPDATE … RETURNING` statement, so the read and the write can
/// never interleave with another writer.
pub fn increment_code_index(conn: &Connection) -> Result<i64, DatabaseError> {
    conn.query_row(
        "UPDATE registry_state SET value = value + 1 WHERE key = ?1 RETURNING value - 1",
        params![NEXT_CODE_INDEX],
        |r| r.get(0),
    )
    .optional()?
    .ok_or_else(|| DatabaseError::NotFound(format!("registry_state '{}'", NEXT_CODE_INDEX)))
}

/// Reads the counter without changing it.
pub fn peek_code_index(conn: &Connection) -> Result<i64, DatabaseError> {
    conn.query_row(
        "SELECT value FROM registry_state WHERE key = ?1",
        params![NEXT_CODE_INDEX],
        |r| r.get(0),
    )
    .optional()?
    .ok_or_else(|| DatabaseError::NotFound(format!("registry_state '{}'", NEXT_CODE_INDEX)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    #[test]
    fn test_increment_returns_previous_value() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            assert_eq!(peek_code_index(conn)?, 0);
            assert_eq!(increment_code_index(conn)?, 0);
            assert_eq!(increment_code_index(conn)?, 1);
            assert_eq!(increment_code_index(conn)?, 2);
            assert_eq!(peek_code_index(conn)?, 3);
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_missing_counter_row() {
        let db = Database::open_in_memory().unwrap();
        let result = db.with_conn(|conn| {
            conn.execute("DELETE FROM registry_state", [])?;
            increment_code_index(conn)
        });
        assert!(matches!(result, Err(DatabaseError::NotFound(_))));
    }
}
