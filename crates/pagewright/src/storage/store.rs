//! Durable storage for per-role session state.

use std::io;
use std::sync::Mutex;

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use hashbrown::HashMap;
use thiserror::Error;

use super::SessionState;

/// Failure reading or writing persisted session state.
#[derive(Debug, Error)]
pub enum StateStoreError {
    /// The role name cannot be used as a file name.
    #[error("role name '{0}' may only contain ASCII letters, digits, '-' and '_'")]
    InvalidRole(String),
    /// Filesystem access failed.
    #[error("session state I/O failed for {path}: {source}")]
    Io {
        /// Path being accessed.
        path: Utf8PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
    /// The persisted record is not valid session state.
    #[error("session state for role '{role}' is malformed: {source}")]
    Malformed {
        /// Role whose record is malformed.
        role: String,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },
}

/// Where session state lives between runs. One record per role.
pub trait StateStore: Send + Sync {
    /// Load the record for `role`, or `None` when nothing is persisted.
    ///
    /// # Errors
    /// Returns [`StateStoreError`] when the record exists but cannot be read.
    fn load(&self, role: &str) -> Result<Option<SessionState>, StateStoreError>;

    /// Persist `state`, replacing any record for the same role.
    ///
    /// # Errors
    /// Returns [`StateStoreError`] when the record cannot be written.
    fn save(&self, state: &SessionState) -> Result<(), StateStoreError>;
}

fn validate_role(role: &str) -> Result<(), StateStoreError> {
    let valid = !role.is_empty()
        && role
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_'));
    if valid {
        Ok(())
    } else {
        Err(StateStoreError::InvalidRole(role.to_owned()))
    }
}

/// Stores each role's state as `<role>.json` inside one directory.
pub struct FileStateStore {
    path: Utf8PathBuf,
    dir: Dir,
}

impl FileStateStore {
    /// Open the store at `path`, creating the directory when missing.
    ///
    /// # Errors
    /// Returns [`StateStoreError::Io`] when the directory cannot be created or
    /// opened.
    pub fn open(path: impl AsRef<Utf8Path>) -> Result<Self, StateStoreError> {
        let path = path.as_ref().to_owned();
        let io_err = |source| StateStoreError::Io {
            path: path.clone(),
            source,
        };
        Dir::create_ambient_dir_all(&path, ambient_authority()).map_err(io_err)?;
        let dir = Dir::open_ambient_dir(&path, ambient_authority()).map_err(io_err)?;
        Ok(Self { path, dir })
    }

    /// Directory holding the records.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    fn io_error(&self, file: &str, source: io::Error) -> StateStoreError {
        StateStoreError::Io {
            path: self.path.join(file),
            source,
        }
    }
}

impl StateStore for FileStateStore {
    fn load(&self, role: &str) -> Result<Option<SessionState>, StateStoreError> {
        validate_role(role)?;
        let file = format!("{role}.json");
        let text = match self.dir.read_to_string(&file) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(self.io_error(&file, err)),
        };
        serde_json::from_str(&text)
            .map(Some)
            .map_err(|source| StateStoreError::Malformed {
                role: role.to_owned(),
                source,
            })
    }

    fn save(&self, state: &SessionState) -> Result<(), StateStoreError> {
        validate_role(&state.role)?;
        let file = format!("{}.json", state.role);
        let staging = format!("{}.json.tmp", state.role);
        let body = serde_json::to_vec_pretty(state).map_err(|source| StateStoreError::Malformed {
            role: state.role.clone(),
            source,
        })?;
        self.dir
            .write(&staging, body)
            .map_err(|err| self.io_error(&staging, err))?;
        self.dir
            .rename(&staging, &self.dir, &file)
            .map_err(|err| self.io_error(&file, err))
    }
}

/// Keeps session state in memory for the life of the process.
#[derive(Default)]
pub struct MemoryStateStore {
    states: Mutex<HashMap<String, SessionState>>,
}

impl MemoryStateStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn states(&self) -> std::sync::MutexGuard<'_, HashMap<String, SessionState>> {
        match self.states.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl StateStore for MemoryStateStore {
    fn load(&self, role: &str) -> Result<Option<SessionState>, StateStoreError> {
        validate_role(role)?;
        Ok(self.states().get(role).cloned())
    }

    fn save(&self, state: &SessionState) -> Result<(), StateStoreError> {
        validate_role(&state.role)?;
        self.states().insert(state.role.clone(), state.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use serde_json::json;
    use tempfile::TempDir;

    #[fixture]
    fn temp_dir() -> TempDir {
        #[expect(clippy::expect_used, reason = "tests need a scratch directory")]
        tempfile::tempdir().expect("create temp dir")
    }

    fn utf8(dir: &TempDir) -> Utf8PathBuf {
        #[expect(clippy::expect_used, reason = "temp dirs have UTF-8 paths in tests")]
        Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 temp path")
    }

    #[rstest]
    fn file_store_round_trips_state(temp_dir: TempDir) {
        let root = utf8(&temp_dir).join("state");
        let Ok(store) = FileStateStore::open(&root) else {
            panic!("store should open");
        };
        let state = SessionState {
            role: "admin".into(),
            captured_at: 1_700_000_000,
            data: json!({"cookies": [{"name": "session-username", "value": "admin"}]}),
        };
        assert!(store.save(&state).is_ok());
        assert!(root.join("admin.json").exists());
        assert!(!root.join("admin.json.tmp").exists());
        assert_eq!(store.load("admin").ok().flatten(), Some(state));
    }

    #[rstest]
    fn missing_record_is_none(temp_dir: TempDir) {
        let Ok(store) = FileStateStore::open(utf8(&temp_dir)) else {
            panic!("store should open");
        };
        assert!(matches!(store.load("nobody"), Ok(None)));
    }

    #[rstest]
    fn malformed_record_is_reported(temp_dir: TempDir) {
        let root = utf8(&temp_dir);
        #[expect(clippy::expect_used, reason = "test seeds a corrupt record")]
        std::fs::write(root.join("admin.json"), "{not json").expect("write record");
        let Ok(store) = FileStateStore::open(&root) else {
            panic!("store should open");
        };
        assert!(matches!(
            store.load("admin"),
            Err(StateStoreError::Malformed { .. })
        ));
    }

    #[rstest]
    #[case("../escape")]
    #[case("")]
    #[case("with space")]
    fn rejects_unsafe_role_names(#[case] role: &str) {
        let store = MemoryStateStore::new();
        assert!(matches!(
            store.load(role),
            Err(StateStoreError::InvalidRole(_))
        ));
    }
}
