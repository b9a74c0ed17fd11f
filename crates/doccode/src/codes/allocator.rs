//! Hands out codes: legacy codes found in file names are kept, everything
//! else gets the next fresh code from the registry counter.

use std::path::Path;
use std::sync::atomic::{AtomicI64, Ordering};

use thiserror::Error;

use super::{extract_code_from_filename, index_to_code, Code, CodeError};
use crate::db::DatabaseError;
use crate::registry::Registry;
use crate::sanitize::redact_path;

#[derive(Error, Debug)]
pub enum AllocationError {
    #[error(transparent)]
    Code(#[from] CodeError),

    #[error("Registry error during allocation: {0}")]
    Database(#[from] DatabaseError),
}

impl AllocationError {
    /// True when the code space has no codes left.
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Code(CodeError::RegistryExhausted { .. }))
    }
}

/// Where an allocated code came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeOrigin {
    /// Drawn from the counter by this allocation.
    Fresh,
    /// Already embedded in the file name.
    Legacy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocatedCode {
    pub code: Code,
    pub origin: CodeOrigin,
}

impl AllocatedCode {
    pub fn is_fresh(&self) -> bool {
        self.origin == CodeOrigin::Fresh
    }
}

pub struct CodeAllocator {
    registry: Registry,
    /// Fresh codes handed out by [`CodeAllocator::preview_code_for_file`].
    previewed: AtomicI64,
}

impl CodeAllocator {
    pub fn new(registry: Registry) -> Self {
        Self {
            registry,
            previewed: AtomicI64::new(0),
        }
    }

    /// Returns the code for `path`.
    ///
    /// A valid `----XXXXX` suffix is kept and registered if the registry has
    /// not seen it; the counter is not touched. Anything else, including a
    /// malformed suffix, gets a fresh code.
    pub fn allocate_code_for_file(&self, path: &Path) -> Result<AllocatedCode, AllocationError> {
        if let Some(code) = extract_code_from_filename(path) {
            if !self.registry.code_exists(&code)? {
                self.registry.allocate_code(&code)?;
            }
            log::info!("Preserving legacy code {} for {}", code, redact_path(path));
            return Ok(AllocatedCode {
                code,
                origin: CodeOrigin::Legacy,
            });
        }

        let code = self.generate_next_code()?;
        log::debug!("Allocated fresh code {} for {}", code, redact_path(path));
        Ok(AllocatedCode {
            code,
            origin: CodeOrigin::Fresh,
        })
    }

    /// Draws the next unused code from the counter and records it as
    /// allocated.
    ///
    /// Indices already taken by a registered legacy code are skipped, so
    /// successive calls return strictly increasing indices and never a
    /// duplicate.
    pub fn generate_next_code(&self) -> Result<Code, AllocationError> {
        loop {
            let index = self.registry.increment_code_index()?;
            let code = index_to_code(index)?;
            match self.registry.allocate_code(&code) {
                Ok(()) => return Ok(code),
                Err(DatabaseError::DuplicateCode(_)) => {
                    log::debug!("Index {} already taken by {}, advancing", index, code);
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Same decision as [`allocate_code_for_file`](Self::allocate_code_for_file)
    /// without writing anything. Fresh previews advance a private cursor so
    /// a dry run shows distinct codes.
    pub fn preview_code_for_file(&self, path: &Path) -> Result<AllocatedCode, AllocationError> {
        if let Some(code) = extract_code_from_filename(path) {
            return Ok(AllocatedCode {
                code,
                origin: CodeOrigin::Legacy,
            });
        }

        let base = self.registry.next_code_index()?;
        loop {
            let offset = self.previewed.fetch_add(1, Ordering::Relaxed);
            let code = index_to_code(base + offset)?;
            if !self.registry.code_exists(&code)? {
                return Ok(AllocatedCode {
                    code,
                    origin: CodeOrigin::Fresh,
                });
            }
        }
    }

    /// Releases a fresh code that never got linked. The counter is never
    /// decremented, so the index is not reused. Returns whether a row was
    /// removed.
    pub fn rollback_code(&self, code: &Code) -> Result<bool, AllocationError> {
        Ok(self.registry.rollback_code(code)?)
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codes::CAPACITY;

    fn allocator() -> CodeAllocator {
        CodeAllocator::new(Registry::open_in_memory().unwrap())
    }

    #[test]
    fn test_fresh_codes_start_at_zero() {
        let alloc = allocator();
        let first = alloc.allocate_code_for_file(Path::new("/in/a.pdf")).unwrap();
        assert_eq!(first.code.as_str(), "AAAAA");
        assert!(first.is_fresh());
        let second = alloc.allocate_code_for_file(Path::new("/in/b.pdf")).unwrap();
        assert_eq!(second.code.as_str(), "AAAAB");
    }

    #[test]
    fn test_fresh_codes_are_unique_and_increasing() {
        let alloc = allocator();
        let codes: Vec<Code> = (0..60).map(|_| alloc.generate_next_code().unwrap()).collect();
        for pair in codes.windows(2) {
            assert!(pair[0].index() < pair[1].index());
        }
        assert_eq!(codes[25].as_str(), "AAABA");
    }

    #[test]
    fn test_legacy_code_preserved_without_touching_counter() {
        let alloc = allocator();
        let allocated = alloc
            .allocate_code_for_file(Path::new("/in/old_statute----ABXCD.pdf"))
            .unwrap();
        assert_eq!(allocated.code.as_str(), "ABXCD");
        assert_eq!(allocated.origin, CodeOrigin::Legacy);
        assert_eq!(alloc.registry().next_code_index().unwrap(), 0);
        assert!(alloc.registry().code_exists(&allocated.code).unwrap());

        // Seeing the same legacy file again is not an error.
        let again = alloc
            .allocate_code_for_file(Path::new("/in/old_statute----ABXCD.pdf"))
            .unwrap();
        assert_eq!(again.code, allocated.code);
    }

    #[test]
    fn test_malformed_suffix_gets_fresh_code() {
        let alloc = allocator();
        let allocated = alloc
            .allocate_code_for_file(Path::new("/in/bad----WWWWW.pdf"))
            .unwrap();
        assert_eq!(allocated.code.as_str(), "AAAAA");
        assert!(allocated.is_fresh());
        assert_eq!(alloc.registry().next_code_index().unwrap(), 1);
    }

    #[test]
    fn test_rollback_never_reuses_index() {
        let alloc = allocator();
        let first = alloc.generate_next_code().unwrap();
        assert!(alloc.rollback_code(&first).unwrap());
        let second = alloc.generate_next_code().unwrap();
        assert_ne!(first, second);
        assert_eq!(second.as_str(), "AAAAB");
    }

    #[test]
    fn test_counter_skips_registered_legacy_code() {
        let alloc = allocator();
        alloc
            .allocate_code_for_file(Path::new("/in/legacy----AAAAB.pdf"))
            .unwrap();

        assert_eq!(alloc.generate_next_code().unwrap().as_str(), "AAAAA");
        assert_eq!(alloc.generate_next_code().unwrap().as_str(), "AAAAC");
    }

    #[test]
    fn test_exhaustion_is_reported() {
        let alloc = allocator();
        alloc
            .registry()
            .database()
            .with_conn(|conn| {
                conn.execute(
                    "UPDATE registry_state SET value = ?1 WHERE key = 'next_code_index'",
                    [i64::from(CAPACITY)],
                )?;
                Ok(())
            })
            .unwrap();

        let err = alloc.generate_next_code().unwrap_err();
        assert!(err.is_exhausted());
    }

    #[test]
    fn test_preview_writes_nothing() {
        let alloc = allocator();
        let a = alloc.preview_code_for_file(Path::new("/in/a.pdf")).unwrap();
        let b = alloc.preview_code_for_file(Path::new("/in/b.pdf")).unwrap();
        let legacy = alloc
            .preview_code_for_file(Path::new("/in/c----QRSTU.pdf"))
            .unwrap();

        assert_eq!(a.code.as_str(), "AAAAA");
        assert_eq!(b.code.as_str(), "AAAAB");
        assert_eq!(legacy.origin, CodeOrigin::Legacy);
        assert_eq!(alloc.registry().next_code_index().unwrap(), 0);
        assert_eq!(alloc.registry().allocated_codes_count().unwrap(), 0);
    }
}
