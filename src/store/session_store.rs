use parking_lot::Mutex;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use super::document::ConversationDocument;
use crate::app::StorageConfig;
use crate::constants::{
    BACKUP_EXT, CORRUPT_EXT, DOCUMENT_EXT, STORE_RETRY_BACKOFF_MS, STORE_WRITE_RETRIES, TEMP_EXT,
};
use crate::utils::AssistantError;

/// Durable session store: one JSON document per session id under a
/// storage root, with atomic replace, rolling backups and corruption
/// recovery. When no writable root can be found the store degrades to a
/// process-lifetime in-memory map; `is_degraded()` exposes that state.
pub struct SessionStore {
    backend: Backend,
}

enum Backend {
    Disk(PathBuf),
    Memory(Mutex<HashMap<String, ConversationDocument>>),
}

impl SessionStore {
    /// Open the store, resolving the storage root from configuration.
    ///
    /// Resolution order: configured root, platform data dir, OS temp dir,
    /// in-memory. The choice is fixed for the process lifetime.
    pub fn open(config: &StorageConfig) -> Self {
        let mut candidates: Vec<PathBuf> = Vec::new();
        if let Some(root) = &config.root {
            candidates.push(root.clone());
        }
        if let Some(dirs) = directories::ProjectDirs::from("", "", "selkie") {
            candidates.push(dirs.data_dir().join("sessions"));
        }
        candidates.push(std::env::temp_dir().join("selkie-sessions"));

        for candidate in candidates {
            if ensure_writable_dir(&candidate) {
                info!("📂 Session storage at {}", candidate.display());
                return Self {
                    backend: Backend::Disk(candidate),
                };
            }
            warn!(
                "Storage directory {} is not writable, trying next candidate",
                candidate.display()
            );
        }

        error!("No writable storage location; sessions will not survive restart");
        Self::in_memory()
    }

    /// Open the store at an explicit root, degrading to in-memory if the
    /// root is unusable
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        if ensure_writable_dir(&root) {
            Self {
                backend: Backend::Disk(root),
            }
        } else {
            warn!(
                "Storage directory {} is not writable; sessions will not survive restart",
                root.display()
            );
            Self::in_memory()
        }
    }

    /// Create a purely in-memory store (nothing survives restart)
    pub fn in_memory() -> Self {
        Self {
            backend: Backend::Memory(Mutex::new(HashMap::new())),
        }
    }

    /// True when operating without durable persistence
    pub fn is_degraded(&self) -> bool {
        matches!(self.backend, Backend::Memory(_))
    }

    /// Read the document for a session.
    ///
    /// A missing document is an empty one, not an error. An unparseable
    /// document triggers backup recovery before falling back to empty;
    /// both paths are logged, never raised.
    pub fn read(&self, session_id: &str) -> ConversationDocument {
        let root = match &self.backend {
            Backend::Disk(root) => root,
            Backend::Memory(map) => {
                return map
                    .lock()
                    .get(session_id)
                    .cloned()
                    .unwrap_or_else(|| ConversationDocument::empty(session_id));
            }
        };

        let path = document_path(root, session_id);
        if !path.exists() {
            return ConversationDocument::empty(session_id);
        }

        match read_with_retry(&path) {
            Ok(raw) => match serde_json::from_str::<ConversationDocument>(&raw) {
                Ok(document) => document,
                Err(e) => {
                    warn!(
                        "Corrupt document for session '{}' ({}), attempting backup recovery",
                        session_id, e
                    );
                    self.recover(root, session_id)
                }
            },
            Err(e) => {
                warn!(
                    "Could not read document for session '{}' after retries: {}",
                    session_id, e
                );
                ConversationDocument::empty(session_id)
            }
        }
    }

    /// Recover a session from its backup copy. The corrupt file is moved
    /// aside so later reads do not trip over it again.
    fn recover(&self, root: &Path, session_id: &str) -> ConversationDocument {
        let path = document_path(root, session_id);
        let backup = sibling_path(root, session_id, BACKUP_EXT);
        let quarantine = sibling_path(root, session_id, CORRUPT_EXT);

        if let Err(e) = fs::rename(&path, &quarantine) {
            warn!("Could not quarantine corrupt document: {}", e);
        }

        let recovered = fs::read_to_string(&backup)
            .ok()
            .and_then(|raw| serde_json::from_str::<ConversationDocument>(&raw).ok());

        match recovered {
            Some(document) => {
                info!(
                    "♻️ Recovered session '{}' from backup ({} messages)",
                    session_id,
                    document.messages.len()
                );
                // Reinstate the backup as the main document
                if let Err(e) = fs::copy(&backup, &path) {
                    warn!("Could not reinstate backup for '{}': {}", session_id, e);
                }
                document
            }
            None => {
                warn!(
                    "No usable backup for session '{}'; starting with an empty document",
                    session_id
                );
                ConversationDocument::empty(session_id)
            }
        }
    }

    /// Write the document for a session durably.
    ///
    /// The document is serialized to a temp file in the same directory,
    /// the previous good file is copied to the rolling backup, then the
    /// temp file atomically replaces the target. The replace is retried a
    /// bounded number of times for transient lock contention.
    pub fn write(
        &self,
        session_id: &str,
        document: &ConversationDocument,
    ) -> Result<(), AssistantError> {
        let root = match &self.backend {
            Backend::Disk(root) => root,
            Backend::Memory(map) => {
                map.lock().insert(session_id.to_string(), document.clone());
                return Ok(());
            }
        };

        let path = document_path(root, session_id);
        let temp = sibling_path(root, session_id, TEMP_EXT);
        let backup = sibling_path(root, session_id, BACKUP_EXT);

        let json = serde_json::to_string_pretty(document)?;

        fs::create_dir_all(root)
            .map_err(|e| AssistantError::Storage(format!("Cannot create storage root: {}", e)))?;
        fs::write(&temp, &json).map_err(|e| {
            AssistantError::Storage(format!("Cannot write temp file {}: {}", temp.display(), e))
        })?;

        // Keep a rolling backup of the previous good document
        if path.exists() {
            if let Err(e) = fs::copy(&path, &backup) {
                warn!("Could not update backup for '{}': {}", session_id, e);
            }
        }

        let mut attempt = 0;
        loop {
            match fs::rename(&temp, &path) {
                Ok(()) => {
                    debug!("Saved session '{}' ({} bytes)", session_id, json.len());
                    return Ok(());
                }
                Err(e) => {
                    attempt += 1;
                    if attempt >= STORE_WRITE_RETRIES {
                        let _ = fs::remove_file(&temp);
                        return Err(AssistantError::Storage(format!(
                            "Failed to replace {} after {} attempts: {}",
                            path.display(),
                            attempt,
                            e
                        )));
                    }
                    warn!(
                        "Replace of {} failed (attempt {}/{}): {}",
                        path.display(),
                        attempt,
                        STORE_WRITE_RETRIES,
                        e
                    );
                    thread::sleep(Duration::from_millis(STORE_RETRY_BACKOFF_MS));
                }
            }
        }
    }

    /// List known sessions, most recently modified first
    pub fn list(&self) -> Vec<String> {
        let root = match &self.backend {
            Backend::Disk(root) => root,
            Backend::Memory(map) => {
                let map = map.lock();
                let mut sessions: Vec<_> = map.values().collect();
                sessions.sort_by(|a, b| b.last_modified.cmp(&a.last_modified));
                return sessions.iter().map(|d| d.session_id.clone()).collect();
            }
        };

        let mut entries: Vec<(String, std::time::SystemTime)> = Vec::new();
        if let Ok(dir) = fs::read_dir(root) {
            for entry in dir.flatten() {
                let path = entry.path();
                // Skip .tmp / .bak / .corrupt siblings
                if path.extension().map(|e| e == DOCUMENT_EXT) != Some(true) {
                    continue;
                }
                let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                    continue;
                };
                let modified = entry
                    .metadata()
                    .and_then(|m| m.modified())
                    .unwrap_or(std::time::SystemTime::UNIX_EPOCH);
                entries.push((stem.to_string(), modified));
            }
        }

        entries.sort_by(|a, b| b.1.cmp(&a.1));
        entries.into_iter().map(|(id, _)| id).collect()
    }

    /// Remove a session's document and backup. Idempotent.
    pub fn delete(&self, session_id: &str) -> Result<(), AssistantError> {
        let root = match &self.backend {
            Backend::Disk(root) => root,
            Backend::Memory(map) => {
                map.lock().remove(session_id);
                return Ok(());
            }
        };

        for path in [
            document_path(root, session_id),
            sibling_path(root, session_id, BACKUP_EXT),
        ] {
            match fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(AssistantError::Storage(format!(
                        "Cannot delete {}: {}",
                        path.display(),
                        e
                    )))
                }
            }
        }
        Ok(())
    }
}

/// Path of the main document file for a session
fn document_path(root: &Path, session_id: &str) -> PathBuf {
    sibling_path(root, session_id, DOCUMENT_EXT)
}

/// Path of a session file with the given extension
fn sibling_path(root: &Path, session_id: &str, ext: &str) -> PathBuf {
    root.join(format!("{}.{}", sanitize_id(session_id), ext))
}

/// Strip characters that are invalid in file names
fn sanitize_id(session_id: &str) -> String {
    session_id
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect()
}

/// Read a file, retrying briefly on transient errors (another process
/// may hold a lock on the file)
fn read_with_retry(path: &Path) -> std::io::Result<String> {
    let mut attempt = 0;
    loop {
        match fs::read_to_string(path) {
            Ok(raw) => return Ok(raw),
            Err(e) => {
                attempt += 1;
                if attempt >= STORE_WRITE_RETRIES {
                    return Err(e);
                }
                thread::sleep(Duration::from_millis(STORE_RETRY_BACKOFF_MS));
            }
        }
    }
}

/// Create the directory if needed and probe that it is actually writable
fn ensure_writable_dir(dir: &Path) -> bool {
    if fs::create_dir_all(dir).is_err() {
        return false;
    }
    if !dir.is_dir() {
        return false;
    }
    let probe = dir.join(".write-probe");
    match fs::write(&probe, b"probe") {
        Ok(()) => {
            let _ = fs::remove_file(&probe);
            true
        }
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Message;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn doc_with(session_id: &str, contents: &[&str]) -> ConversationDocument {
        let mut doc = ConversationDocument::empty(session_id);
        for (i, content) in contents.iter().enumerate() {
            if i % 2 == 0 {
                doc.push(Message::user(*content));
            } else {
                doc.push(Message::assistant(*content));
            }
        }
        doc
    }

    #[test]
    fn test_read_missing_session_is_empty() {
        let temp = TempDir::new().unwrap();
        let store = SessionStore::with_root(temp.path());

        let doc = store.read("nope");
        assert_eq!(doc.session_id, "nope");
        assert!(doc.messages.is_empty());
    }

    #[test]
    fn test_write_read_round_trip() {
        let temp = TempDir::new().unwrap();
        let store = SessionStore::with_root(temp.path());

        let doc = doc_with("s1", &["hello", "hi there", "how are you?"]);
        store.write("s1", &doc).unwrap();

        let loaded = store.read("s1");
        assert_eq!(loaded.messages, doc.messages);
    }

    #[test]
    fn test_corrupt_document_recovers_from_backup() {
        let temp = TempDir::new().unwrap();
        let store = SessionStore::with_root(temp.path());

        let doc = doc_with("s1", &["first", "reply"]);
        store.write("s1", &doc).unwrap();
        // Second write creates the rolling backup of the first document
        let mut doc2 = doc.clone();
        doc2.push(Message::user("second"));
        store.write("s1", &doc2).unwrap();

        // Clobber the main document
        fs::write(temp.path().join("s1.json"), "{not json at all").unwrap();

        let recovered = store.read("s1");
        // Backup holds the first document, not an empty one
        assert_eq!(recovered.messages.len(), 2);
        assert_eq!(recovered.messages[0].content, "first");
        // Corrupt file was quarantined
        assert!(temp.path().join("s1.json.corrupt").exists());
    }

    #[test]
    fn test_corrupt_document_without_backup_is_empty() {
        let temp = TempDir::new().unwrap();
        let store = SessionStore::with_root(temp.path());

        fs::write(temp.path().join("s1.json"), "garbage").unwrap();

        let doc = store.read("s1");
        assert!(doc.messages.is_empty());
        assert!(temp.path().join("s1.json.corrupt").exists());
    }

    #[test]
    fn test_stale_temp_file_never_pollutes_read() {
        let temp = TempDir::new().unwrap();
        let store = SessionStore::with_root(temp.path());

        let doc = doc_with("s1", &["old content"]);
        store.write("s1", &doc).unwrap();

        // Simulate a crash between temp-write and replace
        fs::write(temp.path().join("s1.json.tmp"), "{\"half\": \"writ").unwrap();

        let loaded = store.read("s1");
        assert_eq!(loaded.messages.len(), 1);
        assert_eq!(loaded.messages[0].content, "old content");
        // The stale temp file is also not a listable session
        assert_eq!(store.list(), vec!["s1".to_string()]);
    }

    #[test]
    fn test_list_orders_most_recent_first() {
        let temp = TempDir::new().unwrap();
        let store = SessionStore::with_root(temp.path());

        store.write("older", &doc_with("older", &["a"])).unwrap();
        thread::sleep(Duration::from_millis(20));
        store.write("newer", &doc_with("newer", &["b"])).unwrap();

        assert_eq!(store.list(), vec!["newer".to_string(), "older".to_string()]);
    }

    #[test]
    fn test_delete_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let store = SessionStore::with_root(temp.path());

        let doc = doc_with("s1", &["a", "b"]);
        store.write("s1", &doc).unwrap();
        store.write("s1", &doc).unwrap(); // creates a backup too

        store.delete("s1").unwrap();
        assert!(store.read("s1").messages.is_empty());
        assert!(!temp.path().join("s1.json").exists());
        assert!(!temp.path().join("s1.json.bak").exists());

        // Second delete is a no-op, not an error
        store.delete("s1").unwrap();
    }

    #[test]
    fn test_unwritable_root_degrades_to_memory() {
        let temp = TempDir::new().unwrap();
        // A file where a directory is expected
        let blocker = temp.path().join("not-a-dir");
        fs::write(&blocker, "x").unwrap();

        let store = SessionStore::with_root(&blocker);
        assert!(store.is_degraded());

        // Reads and writes still work for the process lifetime
        let doc = doc_with("s1", &["hello"]);
        store.write("s1", &doc).unwrap();
        assert_eq!(store.read("s1").messages.len(), 1);
        assert_eq!(store.list(), vec!["s1".to_string()]);
        store.delete("s1").unwrap();
        assert!(store.read("s1").messages.is_empty());
    }

    #[test]
    fn test_session_id_sanitized_for_paths() {
        let temp = TempDir::new().unwrap();
        let store = SessionStore::with_root(temp.path());

        let doc = doc_with("../evil/../../id", &["payload"]);
        store.write("../evil/../../id", &doc).unwrap();

        // Nothing escaped the storage root
        assert!(temp.path().join("evilid.json").exists());
    }
}
