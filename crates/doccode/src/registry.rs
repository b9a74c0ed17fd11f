//! The document registry: the one owner of persisted identity state.
//!
//! `Registry` is a cheap-to-clone handle over a [`Database`]. Each method
//! takes the connection lock once; multi-row writes run in a single
//! transaction.

use std::path::Path;

use serde::Serialize;

use crate::codes::Code;
use crate::db::code_repo::{self, CodeAllocation};
use crate::db::document_repo::{self, DocumentFilter, DocumentRow};
use crate::db::stats_repo::{self, RegistryStatistics};
use crate::db::step_repo::{self, ProcessingStepRow};
use crate::db::{metadata_repo, now_rfc3339, state_repo, Database, DatabaseError};
use crate::models::{DocumentMetadata, DocumentType, MetadataField, ProcessingStatus};

/// Registry key for a path: the path as given, lossily converted to text.
pub fn path_key(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path_key(path))
}

#[derive(Clone)]
pub struct Registry {
    db: Database,
}

impl Registry {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Opens (or creates) the registry file and applies migrations.
    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        Database::open(path).map(Self::new)
    }

    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        Database::open_in_memory().map(Self::new)
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    // ---- documents -------------------------------------------------------

    /// Registers a document under its path. Fails with `DuplicatePath` when
    /// the path is already registered.
    pub fn register_document(
        &self,
        path: &Path,
        document_type: Option<DocumentType>,
    ) -> Result<i64, DatabaseError> {
        let key = path_key(path);
        let name = file_name(path);
        let id = self
            .db
            .with_conn(|conn| document_repo::insert(conn, &key, &name, document_type))?;
        log::debug!("Registered document {} as id {}", name, id);
        Ok(id)
    }

    pub fn get_document_by_id(&self, id: i64) -> Result<Option<DocumentRow>, DatabaseError> {
        self.db.with_conn(|conn| document_repo::find_by_id(conn, id))
    }

    pub fn get_document_by_path(&self, path: &Path) -> Result<Option<DocumentRow>, DatabaseError> {
        let key = path_key(path);
        self.db.with_conn(|conn| document_repo::find_by_path(conn, &key))
    }

    pub fn get_document_by_code(&self, code: &Code) -> Result<Option<DocumentRow>, DatabaseError> {
        self.db.with_conn(|conn| document_repo::find_by_code(conn, code))
    }

    pub fn list_documents(&self, filter: &DocumentFilter) -> Result<Vec<DocumentRow>, DatabaseError> {
        self.db.with_conn(|conn| document_repo::list(conn, filter))
    }

    pub fn update_document_name(&self, id: i64, name: &str) -> Result<(), DatabaseError> {
        self.db.with_conn(|conn| {
            expect_one(document_repo::update_name(conn, id, name)?, || document_label(id))
        })
    }

    /// Points a document at its new location after a physical move.
    pub fn update_document_path(&self, id: i64, path: &Path) -> Result<(), DatabaseError> {
        let key = path_key(path);
        let name = file_name(path);
        self.db.with_conn(|conn| {
            expect_one(document_repo::update_path(conn, id, &key, &name)?, || {
                document_label(id)
            })
        })
    }

    pub fn update_document_type(
        &self,
        id: i64,
        document_type: DocumentType,
    ) -> Result<(), DatabaseError> {
        self.db.with_conn(|conn| {
            expect_one(document_repo::update_type(conn, id, document_type)?, || {
                document_label(id)
            })
        })
    }

    // ---- codes -----------------------------------------------------------

    /// Records `code` as allocated. Fails with `DuplicateCode` if present.
    pub fn allocate_code(&self, code: &Code) -> Result<(), DatabaseError> {
        self.db.with_conn(|conn| code_repo::insert_allocated(conn, code))
    }

    pub fn code_exists(&self, code: &Code) -> Result<bool, DatabaseError> {
        self.db.with_conn(|conn| code_repo::exists(conn, code))
    }

    pub fn get_code_allocation(&self, code: &Code) -> Result<Option<CodeAllocation>, DatabaseError> {
        self.db.with_conn(|conn| code_repo::find(conn, code))
    }

    pub fn allocated_codes_count(&self) -> Result<i64, DatabaseError> {
        self.db.with_conn(code_repo::count)
    }

    /// Advances the allocation counter; returns the pre-increment value.
    pub fn increment_code_index(&self) -> Result<i64, DatabaseError> {
        self.db.with_conn(state_repo::increment_code_index)
    }

    /// Current counter value, without advancing it.
    pub fn next_code_index(&self) -> Result<i64, DatabaseError> {
        self.db.with_conn(state_repo::peek_code_index)
    }

    /// Links `code` to a document and marks it `in_use`, atomically.
    ///
    /// Either the code row and the document's `unique_code` are both
    /// updated or neither is. Fails with `NotFound` when the code or the
    /// document does not exist, or when the code already belongs to a
    /// different document.
    pub fn commit_code_to_document(&self, code: &Code, document_id: i64) -> Result<(), DatabaseError> {
        self.db.with_transaction(|tx| {
            let allocation = code_repo::find(tx, code)?
                .ok_or_else(|| DatabaseError::NotFound(format!("code {}", code)))?;
            if let Some(owner) = allocation.document_id.filter(|&owner| owner != document_id) {
                return Err(DatabaseError::NotFound(format!(
                    "code {} is linked to document {}",
                    code, owner
                )));
            }
            if document_repo::find_by_id(tx, document_id)?.is_none() {
                return Err(DatabaseError::NotFound(document_label(document_id)));
            }

            code_repo::mark_in_use(tx, code, document_id)?;
            document_repo::set_code(tx, document_id, code)?;
            Ok(())
        })?;
        log::debug!("Committed code {} to document {}", code, document_id);
        Ok(())
    }

    /// Removes `code` if it is still allocated and unlinked. Returns whether
    /// a row was removed; in-use or unknown codes are left alone. Never
    /// touches the counter.
    pub fn rollback_code(&self, code: &Code) -> Result<bool, DatabaseError> {
        let removed = self
            .db
            .with_conn(|conn| code_repo::delete_if_unlinked(conn, code))?;
        if removed > 0 {
            log::debug!("Rolled back code {}", code);
        }
        Ok(removed > 0)
    }

    // ---- metadata and history -------------------------------------------

    pub fn add_metadata(&self, document_id: i64, field: &MetadataField) -> Result<i64, DatabaseError> {
        self.db
            .with_conn(|conn| metadata_repo::insert(conn, document_id, field))
    }

    /// Appends every field of `metadata` in one transaction.
    pub fn add_document_metadata(
        &self,
        document_id: i64,
        metadata: &DocumentMetadata,
    ) -> Result<(), DatabaseError> {
        self.db.with_transaction(|tx| {
            for field in metadata.fields.values() {
                metadata_repo::insert(tx, document_id, field)?;
            }
            Ok(())
        })
    }

    pub fn get_metadata(&self, document_id: i64) -> Result<Vec<MetadataField>, DatabaseError> {
        self.db.with_conn(|conn| metadata_repo::list(conn, document_id))
    }

    pub fn record_processing_step(
        &self,
        document_id: i64,
        step_name: &str,
        step_order: i64,
        status: ProcessingStatus,
        error_message: Option<&str>,
    ) -> Result<i64, DatabaseError> {
        self.db.with_conn(|conn| {
            step_repo::insert(conn, document_id, step_name, step_order, status, error_message)
        })
    }

    pub fn get_processing_steps(&self, document_id: i64) -> Result<Vec<ProcessingStepRow>, DatabaseError> {
        self.db.with_conn(|conn| step_repo::list(conn, document_id))
    }

    // ---- reporting -------------------------------------------------------

    pub fn get_statistics(&self) -> Result<RegistryStatistics, DatabaseError> {
        self.db.with_conn(stats_repo::collect)
    }

    /// Writes every document plus current statistics as pretty JSON.
    pub fn export_json(&self, path: &Path) -> Result<(), DatabaseError> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Export {
            exported_at: String,
            statistics: RegistryStatistics,
            documents: Vec<DocumentRow>,
        }

        let export = self.db.with_conn(|conn| {
            Ok(Export {
                exported_at: now_rfc3339(),
                statistics: stats_repo::collect(conn)?,
                documents: document_repo::list(conn, &DocumentFilter::default())?,
            })
        })?;

        let io_err = |source| DatabaseError::Io {
            path: path.to_path_buf(),
            source,
        };
        let file = std::fs::File::create(path).map_err(io_err)?;
        serde_json::to_writer_pretty(std::io::BufWriter::new(file), &export)
            .map_err(|e| io_err(e.into()))?;
        log::info!(
            "Exported {} documents to {}",
            export.documents.len(),
            path.display()
        );
        Ok(())
    }

    /// Closes the underlying connection. Idempotent; later calls on any
    /// clone fail with `Closed`.
    pub fn close(&self) -> Result<(), DatabaseError> {
        self.db.close()
    }

    pub fn is_closed(&self) -> bool {
        self.db.is_closed()
    }
}

fn document_label(id: i64) -> String {
    format!("document {}", id)
}

fn expect_one(changed: usize, what: impl FnOnce() -> String) -> Result<(), DatabaseError> {
    if changed == 0 {
        Err(DatabaseError::NotFound(what()))
    } else {
        Ok(())
    }
}
