//! Registry statistics: aggregate counts across documents and codes.

use std::collections::BTreeMap;

use rusqlite::Connection;
use serde::Serialize;

use super::{code_repo, document_repo, state_repo, DatabaseError};

/// Snapshot of the registry's contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryStatistics {
    pub total_documents: i64,
    /// Documents per type; untyped documents are counted under `"untyped"`.
    pub by_type: BTreeMap<String, i64>,
    pub allocated_codes: i64,
    pub code_status: BTreeMap<String, i64>,
    pub next_code_index: i64,
}

pub fn collect(conn: &Connection) -> Result<RegistryStatistics, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT COALESCE(document_type, 'untyped'), COUNT(*) FROM documents
         GROUP BY document_type",
    )?;
    let by_type = stmt
        .query_map([], |r| Ok((r.get::<_, String>(0)?, r.get::<_, i64>(1)?)))?
        .collect::<Result<BTreeMap<_, _>, _>>()?;

    Ok(RegistryStatistics {
        total_documents: document_repo::count(conn)?,
        by_type,
        allocated_codes: code_repo::count(conn)?,
        code_status: code_repo::count_by_status(conn)?,
        next_code_index: state_repo::peek_code_index(conn)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codes::Code;
    use crate::db::Database;
    use crate::models::DocumentType;

    #[test]
    fn test_empty_registry() {
        let db = Database::open_in_memory().unwrap();
        let stats = db.with_conn(collect).unwrap();
        assert_eq!(stats.total_documents, 0);
        assert!(stats.by_type.is_empty());
        assert_eq!(stats.allocated_codes, 0);
        assert_eq!(stats.next_code_index, 0);
    }

    #[test]
    fn test_counts() {
        let db = Database::open_in_memory().unwrap();
        let stats = db
            .with_conn(|conn| {
                document_repo::insert(conn, "/a.pdf", "a.pdf", Some(DocumentType::Caselaw))?;
                document_repo::insert(conn, "/b.pdf", "b.pdf", Some(DocumentType::Caselaw))?;
                document_repo::insert(conn, "/c.pdf", "c.pdf", None)?;
                state_repo::increment_code_index(conn)?;
                code_repo::insert_allocated(conn, &Code::new("AAAAA").unwrap())?;
                collect(conn)
            })
            .unwrap();

        assert_eq!(stats.total_documents, 3);
        assert_eq!(stats.by_type.get("caselaw"), Some(&2));
        assert_eq!(stats.by_type.get("untyped"), Some(&1));
        assert_eq!(stats.allocated_codes, 1);
        assert_eq!(stats.code_status.get("allocated"), Some(&1));
        assert_eq!(stats.next_code_index, 1);

        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["totalDocuments"], 3);
    }
}
