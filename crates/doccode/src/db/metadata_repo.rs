//! Metadata repository: append-only `metadata` rows.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use super::DatabaseError;
use crate::models::MetadataField;

pub fn insert(conn: &Connection, document_id: i64, field: &MetadataField) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO metadata (document_id, key, value, source, confidence, extractor_name,
         extracted_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            document_id,
            field.key,
            field.value,
            field.source,
            field.confidence,
            field.extractor_name,
            field
                .extracted_at
                .to_rfc3339_opts(chrono::SecondsFormat::Micros, true),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// All fields recorded for a document, in insertion order. A key recorded
/// twice appears twice.
pub fn list(conn: &Connection, document_id: i64) -> Result<Vec<MetadataField>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT key, value, source, confidence, extractor_name, extracted_at
         FROM metadata WHERE document_id = ?1 ORDER BY id",
    )?;
    let rows = stmt
        .query_map(params![document_id], |r| {
            let extracted_at: String = r.get(5)?;
            let extracted_at = DateTime::parse_from_rfc3339(&extracted_at)
                .map(|t| t.with_timezone(&Utc))
                .map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        5,
                        rusqlite::types::Type::Text,
                        Box::new(e),
                    )
                })?;
            Ok(MetadataField {
                key: r.get(0)?,
                value: r.get(1)?,
                source: r.get(2)?,
                confidence: r.get(3)?,
                extractor_name: r.get(4)?,
                extracted_at,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{document_repo, Database};
    use crate::models::{ConfidenceLevel, ExtractionSource};

    #[test]
    fn test_append_and_list() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            let doc = document_repo::insert(conn, "/docs/a.pdf", "a.pdf", None)?;
            let year = MetadataField::new("year", "2014", ExtractionSource::Document, ConfidenceLevel::High)
                .with_extractor("pattern");
            insert(conn, doc, &year)?;
            insert(
                conn,
                doc,
                &MetadataField::new("year", "2015", ExtractionSource::Filename, ConfidenceLevel::Low),
            )?;

            let fields = list(conn, doc)?;
            assert_eq!(fields.len(), 2);
            assert_eq!(fields[0].value, "2014");
            assert_eq!(fields[0].extractor_name.as_deref(), Some("pattern"));
            assert_eq!(fields[1].source, ExtractionSource::Filename);
            assert_eq!(fields[1].confidence, ConfidenceLevel::Low);
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_unknown_document_rejected() {
        let db = Database::open_in_memory().unwrap();
        let field = MetadataField::new("k", "v", ExtractionSource::Fallback, ConfidenceLevel::Low);
        assert!(db.with_conn(|conn| insert(conn, 42, &field)).is_err());
    }
}
