//! User Storage
//! Mission: Persist user accounts in SQLite with a unique email per account

use crate::auth::errors::StoreError;
use crate::auth::models::User;
use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::{ffi, params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// How long a write waits on another connection's lock before SQLITE_BUSY
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    email TEXT NOT NULL UNIQUE COLLATE NOCASE,
    password_hash TEXT NOT NULL,
    name TEXT,
    created_at TEXT NOT NULL
);
"#;

/// Persistence contract the user domain depends on
pub trait CredentialStore: Send + Sync {
    /// Insert a new user. Fails with `StoreError::Conflict` when the email
    /// is already taken; the check is the table's UNIQUE constraint.
    fn create_user(
        &self,
        email: &str,
        password_hash: &str,
        name: Option<&str>,
    ) -> Result<User, StoreError>;

    fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    fn find_user_by_id(&self, id: &Uuid) -> Result<Option<User>, StoreError>;

    fn count_users(&self) -> Result<usize, StoreError>;
}

/// User storage with SQLite backend
#[derive(Clone)]
pub struct UserStore {
    conn: Arc<Mutex<Connection>>,
}

impl UserStore {
    /// Open (or create) a file-backed user store
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(db_path.as_ref())?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        let journal_mode: String =
            conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
        if !journal_mode.eq_ignore_ascii_case("wal") {
            warn!("WAL mode not active, journal_mode = {}", journal_mode);
        }
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        let store = Self::from_connection(conn)?;
        info!("🔐 User store opened at: {}", db_path.as_ref().display());
        Ok(store)
    }

    /// Create an in-memory store (tests and ephemeral runs)
    pub fn in_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    let id: String = row.get(0)?;
    let id = Uuid::parse_str(&id).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(User {
        id,
        email: row.get(1)?,
        password_hash: row.get(2)?,
        name: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
                || e.extended_code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY
    )
}

impl CredentialStore for UserStore {
    fn create_user(
        &self,
        email: &str,
        password_hash: &str,
        name: Option<&str>,
    ) -> Result<User, StoreError> {
        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            name: name.map(str::to_string),
            created_at: Utc::now().to_rfc3339(),
        };

        let conn = self.conn.lock();
        let result = conn.execute(
            "INSERT INTO users (id, email, password_hash, name, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                user.id.to_string(),
                user.email,
                user.password_hash,
                user.name,
                user.created_at,
            ],
        );

        match result {
            Ok(_) => {
                debug!(user_id = %user.id, "Inserted user row");
                Ok(user)
            }
            Err(e) if is_unique_violation(&e) => Err(StoreError::Conflict),
            Err(e) => Err(e.into()),
        }
    }

    fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let conn = self.conn.lock();
        let user = conn
            .query_row(
                "SELECT id, email, password_hash, name, created_at
                 FROM users WHERE email = ?1",
                params![email],
                user_from_row,
            )
            .optional()?;
        Ok(user)
    }

    fn find_user_by_id(&self, id: &Uuid) -> Result<Option<User>, StoreError> {
        let conn = self.conn.lock();
        let user = conn
            .query_row(
                "SELECT id, email, password_hash, name, created_at
                 FROM users WHERE id = ?1",
                params![id.to_string()],
                user_from_row,
            )
            .optional()?;
        Ok(user)
    }

    fn count_users(&self) -> Result<usize, StoreError> {
        let conn = self.conn.lock();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

/// Store whose every call fails as the backend would on a broken database
#[cfg(test)]
pub(crate) struct FailingStore;

#[cfg(test)]
impl FailingStore {
    fn broken() -> StoreError {
        StoreError::Storage(rusqlite::Error::InvalidQuery)
    }
}

#[cfg(test)]
impl CredentialStore for FailingStore {
    fn create_user(
        &self,
        _email: &str,
        _password_hash: &str,
        _name: Option<&str>,
    ) -> Result<User, StoreError> {
        Err(Self::broken())
    }

    fn find_user_by_email(&self, _email: &str) -> Result<Option<User>, StoreError> {
        Err(Self::broken())
    }

    fn find_user_by_id(&self, _id: &Uuid) -> Result<Option<User>, StoreError> {
        Err(Self::broken())
    }

    fn count_users(&self) -> Result<usize, StoreError> {
        Err(Self::broken())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use tempfile::NamedTempFile;

    fn create_test_store() -> (UserStore, NamedTempFile) {
        let temp_file = NamedTempFile::new().unwrap();
        let store = UserStore::new(temp_file.path()).unwrap();
        (store, temp_file)
    }

    #[test]
    fn test_create_and_retrieve_user() {
        let (store, _temp) = create_test_store();

        let user = store
            .create_user("a@x.com", "$2b$04$hash", Some("Alice"))
            .unwrap();
        assert_eq!(user.email, "a@x.com");

        let by_email = store.find_user_by_email("a@x.com").unwrap().unwrap();
        assert_eq!(by_email.id, user.id);
        assert_eq!(by_email.password_hash, "$2b$04$hash");
        assert_eq!(by_email.name.as_deref(), Some("Alice"));

        let by_id = store.find_user_by_id(&user.id).unwrap().unwrap();
        assert_eq!(by_id.email, "a@x.com");
    }

    #[test]
    fn test_missing_user_is_none() {
        let store = UserStore::in_memory().unwrap();

        assert!(store.find_user_by_email("nobody@x.com").unwrap().is_none());
        assert!(store.find_user_by_id(&Uuid::new_v4()).unwrap().is_none());
    }

    #[test]
    fn test_duplicate_email_conflicts_without_overwrite() {
        let store = UserStore::in_memory().unwrap();

        let first = store.create_user("a@x.com", "hash-1", None).unwrap();
        let second = store.create_user("a@x.com", "hash-2", None);
        assert!(matches!(second, Err(StoreError::Conflict)));

        // Case variants collide too
        let upper = store.create_user("A@X.COM", "hash-3", None);
        assert!(matches!(upper, Err(StoreError::Conflict)));

        let stored = store.find_user_by_email("a@x.com").unwrap().unwrap();
        assert_eq!(stored.id, first.id);
        assert_eq!(stored.password_hash, "hash-1");
        assert_eq!(store.count_users().unwrap(), 1);
    }

    #[test]
    fn test_data_survives_reopen() {
        let temp_file = NamedTempFile::new().unwrap();
        {
            let store = UserStore::new(temp_file.path()).unwrap();
            store.create_user("a@x.com", "hash", None).unwrap();
        }

        let reopened = UserStore::new(temp_file.path()).unwrap();
        assert!(reopened.find_user_by_email("a@x.com").unwrap().is_some());
    }

    #[test]
    fn test_concurrent_duplicate_inserts_single_winner() {
        let store = UserStore::in_memory().unwrap();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                thread::spawn(move || store.create_user("race@x.com", &format!("hash-{i}"), None))
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let ok = results.iter().filter(|r| r.is_ok()).count();
        let conflicts = results
            .iter()
            .filter(|r| matches!(r, Err(StoreError::Conflict)))
            .count();

        assert_eq!(ok, 1);
        assert_eq!(conflicts, 7);
        assert_eq!(store.count_users().unwrap(), 1);
    }

    #[test]
    fn test_independent_connections_share_unique_constraint() {
        let temp_file = NamedTempFile::new().unwrap();
        // One connection per writer, like separate processes on the same file
        let stores: Vec<_> = (0..6)
            .map(|_| UserStore::new(temp_file.path()).unwrap())
            .collect();

        let handles: Vec<_> = stores
            .into_iter()
            .enumerate()
            .map(|(i, store)| {
                thread::spawn(move || store.create_user("race@x.com", &format!("hash-{i}"), None))
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let ok = results.iter().filter(|r| r.is_ok()).count();
        let conflicts = results
            .iter()
            .filter(|r| matches!(r, Err(StoreError::Conflict)))
            .count();

        assert_eq!(ok, 1, "results: {results:?}");
        assert_eq!(conflicts, 5, "results: {results:?}");

        let reader = UserStore::new(temp_file.path()).unwrap();
        assert_eq!(reader.count_users().unwrap(), 1);
    }
}
