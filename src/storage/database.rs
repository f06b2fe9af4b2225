use rusqlite::{Connection, Result as SqlResult};
use std::path::Path;
use std::sync::{Mutex, PoisonError};

/// Shared SQLite handle. Each call to [`Database::with_conn`] holds the
/// connection for the duration of the closure, so statements issued inside
/// one closure are not interleaved with other callers.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    pub fn new<P: AsRef<Path>>(path: P) -> SqlResult<Self> {
        let conn = Connection::open(path)?;
        Ok(Self::wrap(conn))
    }

    pub fn in_memory() -> SqlResult<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self::wrap(conn))
    }

    fn wrap(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    pub fn with_conn<T, E>(&self, f: impl FnOnce(&Connection) -> Result<T, E>) -> Result<T, E> {
        // A panic mid-statement leaves no partial write behind, the connection is still usable.
        let conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        f(&conn)
    }
}
