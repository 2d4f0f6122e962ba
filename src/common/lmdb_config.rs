/// Shared LMDB configuration so every open of the record environment uses identical options
use heed::{Env, EnvOpenOptions};
use std::path::Path;
use crate::common::constants::{LMDB_MAP_SIZE, LMDB_MAX_DBS, LMDB_MAX_READERS};
use crate::store::errors::StoreError;

/// Open an LMDB environment with the shared configuration.
/// Opening the same path twice with different options fails inside LMDB, so all callers go through here.
pub fn open_lmdb_environment(path: &Path, map_size: Option<usize>) -> Result<Env, StoreError> {
    std::fs::create_dir_all(path)
        .map_err(|e| StoreError::DirectoryCreation(format!("Failed to create directory '{}': {}", path.display(), e)))?;

    // SAFETY: the environment is opened once per path by the store actor and never
    // concurrently reopened with different flags inside this process.
    unsafe {
        EnvOpenOptions::new()
            .map_size(map_size.unwrap_or(LMDB_MAP_SIZE))
            .max_dbs(LMDB_MAX_DBS)
            .max_readers(LMDB_MAX_READERS)
            .open(path)
            .map_err(|e| StoreError::DatabaseInitialization(format!("Failed to open LMDB environment at {}: {}", path.display(), e)))
    }
}

/// Get the shared LMDB configuration values for validation or logging
pub fn get_lmdb_config() -> (usize, u32, u32) {
    (LMDB_MAP_SIZE, LMDB_MAX_DBS, LMDB_MAX_READERS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_consistent_lmdb_config() {
        let (map_size, max_dbs, max_readers) = get_lmdb_config();
        assert_eq!(map_size, 256 * 1024 * 1024);
        assert_eq!(max_dbs, 10);
        assert_eq!(max_readers, 256);
    }

    #[test]
    fn test_open_lmdb_environment_creates_directory() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("records");

        let result = open_lmdb_environment(&db_path, None);
        assert!(result.is_ok(), "Failed to open LMDB environment: {:?}", result.err());
        assert!(db_path.exists());
    }
}
