//! File-based storage for native platforms.

use super::{BoxFuture, Storage, StorageError, StorageResult};
use std::fs;
use std::path::{Path, PathBuf};

/// Stores each board as a JSON file in a directory.
///
/// Keys are escaped into file names: ASCII letters, digits and `-` are kept,
/// every other byte becomes `_xx` (lowercase hex). The mapping is one-to-one,
/// so `users/42/board` is stored as `users_2f42_2fboard.json` and
/// [`list`](Storage::list) returns the original keys.
pub struct FileStorage {
    base_path: PathBuf,
}

impl FileStorage {
    /// Create a file storage rooted at `base_path`, creating the directory if needed.
    pub fn new(base_path: PathBuf) -> StorageResult<Self> {
        if !base_path.exists() {
            fs::create_dir_all(&base_path).map_err(|e| {
                StorageError::Io(format!("Failed to create storage directory: {}", e))
            })?;
        }
        Ok(Self { base_path })
    }

    /// Create file storage in the platform data directory.
    ///
    /// On Linux: `~/.local/share/visionboard/boards/`
    /// On Windows: `%LOCALAPPDATA%\visionboard\boards\`
    pub fn default_location() -> StorageResult<Self> {
        let base = dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| StorageError::Io("Could not determine home directory".to_string()))?;
        Self::new(base.join("visionboard").join("boards"))
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.base_path.join(format!("{}.json", encode_key(key)))
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }
}

/// Escape a key into a file stem.
fn encode_key(key: &str) -> String {
    let mut stem = String::with_capacity(key.len());
    for byte in key.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' {
            stem.push(byte as char);
        } else {
            stem.push_str(&format!("_{:02x}", byte));
        }
    }
    stem
}

/// Reverse [`encode_key`]. Returns `None` for stems it could not have produced.
fn decode_key(stem: &str) -> Option<String> {
    let mut bytes = Vec::with_capacity(stem.len());
    let mut rest = stem.as_bytes();
    while let Some((&byte, tail)) = rest.split_first() {
        if byte == b'_' {
            let hex = std::str::from_utf8(tail.get(..2)?).ok()?;
            bytes.push(u8::from_str_radix(hex, 16).ok()?);
            rest = &tail[2..];
        } else {
            bytes.push(byte);
            rest = tail;
        }
    }
    String::from_utf8(bytes)
        .ok()
        .filter(|key| encode_key(key) == stem)
}

impl Storage for FileStorage {
    fn save(&self, key: &str, json: &str) -> BoxFuture<'_, StorageResult<()>> {
        let path = self.entry_path(key);
        let json = json.to_string();
        Box::pin(async move {
            // temp file + rename keeps the replace atomic
            let tmp = path.with_extension("json.tmp");
            fs::write(&tmp, json).map_err(|e| {
                StorageError::Io(format!("Failed to write {}: {}", tmp.display(), e))
            })?;
            fs::rename(&tmp, &path).map_err(|e| {
                StorageError::Io(format!("Failed to replace {}: {}", path.display(), e))
            })
        })
    }

    fn load(&self, key: &str) -> BoxFuture<'_, StorageResult<String>> {
        let path = self.entry_path(key);
        let key = key.to_string();
        Box::pin(async move {
            if !path.exists() {
                return Err(StorageError::NotFound(key));
            }
            fs::read_to_string(&path)
                .map_err(|e| StorageError::Io(format!("Failed to read {}: {}", path.display(), e)))
        })
    }

    fn delete(&self, key: &str) -> BoxFuture<'_, StorageResult<()>> {
        let path = self.entry_path(key);
        Box::pin(async move {
            if path.exists() {
                fs::remove_file(&path).map_err(|e| {
                    StorageError::Io(format!("Failed to delete {}: {}", path.display(), e))
                })?;
            }
            Ok(())
        })
    }

    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>> {
        let base = self.base_path.clone();
        Box::pin(async move {
            if !base.exists() {
                return Ok(vec![]);
            }
            let entries = fs::read_dir(&base)
                .map_err(|e| StorageError::Io(format!("Failed to read directory: {}", e)))?;

            let keys = entries
                .flatten()
                .map(|entry| entry.path())
                .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
                .filter_map(|path| {
                    let stem = path.file_stem()?.to_str()?;
                    let key = decode_key(stem);
                    if key.is_none() {
                        log::debug!("Skipping foreign file {}", path.display());
                    }
                    key
                })
                .collect();
            Ok(keys)
        })
    }

    fn exists(&self, key: &str) -> BoxFuture<'_, StorageResult<bool>> {
        let path = self.entry_path(key);
        Box::pin(async move { Ok(path.exists()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::block_on;
    use tempfile::tempdir;

    #[test]
    fn test_file_storage_save_load() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();

        block_on(storage.save("board", "{\"canvases\":[]}")).unwrap();
        assert_eq!(block_on(storage.load("board")).unwrap(), "{\"canvases\":[]}");

        block_on(storage.save("board", "[]")).unwrap();
        assert_eq!(block_on(storage.load("board")).unwrap(), "[]");
    }

    #[test]
    fn test_file_storage_not_found() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();
        let result = block_on(storage.load("nonexistent"));
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[test]
    fn test_file_storage_list_ignores_temp_files() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();
        block_on(storage.save("doc1", "[]")).unwrap();
        block_on(storage.save("doc2", "[]")).unwrap();
        fs::write(dir.path().join("stray.json.tmp"), "x").unwrap();

        let mut list = block_on(storage.list()).unwrap();
        list.sort();
        assert_eq!(list, vec!["doc1".to_string(), "doc2".to_string()]);
    }

    #[test]
    fn test_file_storage_delete() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();
        block_on(storage.save("test", "[]")).unwrap();
        assert!(block_on(storage.exists("test")).unwrap());
        block_on(storage.delete("test")).unwrap();
        assert!(!block_on(storage.exists("test")).unwrap());
    }

    #[test]
    fn test_file_storage_escapes_key() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();
        block_on(storage.save("users/42/board:main", "[]")).unwrap();

        assert!(dir.path().join("users_2f42_2fboard_3amain.json").exists());
        assert_eq!(block_on(storage.load("users/42/board:main")).unwrap(), "[]");
    }

    #[test]
    fn test_file_storage_keys_do_not_collide() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();
        block_on(storage.save("users/42/board", "\"slash\"")).unwrap();
        block_on(storage.save("users_42_board", "\"underscore\"")).unwrap();
        block_on(storage.save("tablero-ñ", "[]")).unwrap();

        assert_eq!(block_on(storage.load("users/42/board")).unwrap(), "\"slash\"");
        assert_eq!(block_on(storage.load("users_42_board")).unwrap(), "\"underscore\"");

        let mut keys = block_on(storage.list()).unwrap();
        keys.sort();
        assert_eq!(keys, vec!["tablero-ñ", "users/42/board", "users_42_board"]);
    }

    #[test]
    fn test_list_skips_unescaped_files() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();
        block_on(storage.save("board", "[]")).unwrap();
        fs::write(dir.path().join("stray_zz.json"), "[]").unwrap();
        fs::write(dir.path().join("dash_2d.json"), "[]").unwrap();

        assert_eq!(block_on(storage.list()).unwrap(), vec!["board".to_string()]);
    }
}
