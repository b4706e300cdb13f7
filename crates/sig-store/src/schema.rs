use rusqlite::{Connection, OptionalExtension};

use crate::error::{Result, StoreError};

pub const SCHEMA_VERSION: i64 = 1;

pub fn initialize(conn: &Connection) -> Result<()> {
    conn.execute_batch("PRAGMA journal_mode = WAL;")?;
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.pragma_update(None, "busy_timeout", 5000)?;

    // Fails on in-memory databases; not fatal.
    if conn
        .execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")
        .is_ok()
    {
        tracing::info!("startup WAL checkpoint complete");
    }

    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS metadata (
            key   TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS signatures (
            hash        INTEGER PRIMARY KEY,
            primes      TEXT NOT NULL,
            fingerprint TEXT NOT NULL,
            polynomial  TEXT NOT NULL,
            created     TEXT NOT NULL DEFAULT ''
        );

        CREATE TABLE IF NOT EXISTS signature_primes (
            prime INTEGER NOT NULL,
            hash  INTEGER NOT NULL REFERENCES signatures(hash) ON DELETE CASCADE,
            PRIMARY KEY (prime, hash)
        );

        CREATE INDEX IF NOT EXISTS idx_sigprime_hash ON signature_primes(hash);
        ",
    )?;

    conn.execute(
        "INSERT OR REPLACE INTO metadata (key, value) VALUES ('schema_version', ?1)",
        [SCHEMA_VERSION.to_string()],
    )?;

    Ok(())
}

pub fn get_schema_version(conn: &Connection) -> Result<Option<i64>> {
    let mut stmt = conn.prepare("SELECT value FROM metadata WHERE key = 'schema_version'")?;
    let Some(raw) = stmt
        .query_row([], |row| row.get::<_, String>(0))
        .optional()?
    else {
        return Ok(None);
    };
    raw.parse::<i64>()
        .map(Some)
        .map_err(|_| StoreError::InvalidData(format!("bad schema version: {raw:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initialize_creates_tables() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();

        for table in &["metadata", "signatures", "signature_primes"] {
            let count: i64 = conn
                .query_row(&format!("SELECT count(*) FROM {table}"), [], |row| {
                    row.get(0)
                })
                .unwrap();
            assert_eq!(count, if *table == "metadata" { 1 } else { 0 });
        }
    }

    #[test]
    fn test_schema_version_set() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        assert_eq!(get_schema_version(&conn).unwrap(), Some(SCHEMA_VERSION));
    }

    #[test]
    fn test_schema_version_absent_before_initialize() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE metadata (key TEXT PRIMARY KEY, value TEXT NOT NULL);")
            .unwrap();
        assert_eq!(get_schema_version(&conn).unwrap(), None);
    }

    #[test]
    fn test_corrupt_schema_version_is_error() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn.execute(
            "UPDATE metadata SET value = 'three' WHERE key = 'schema_version'",
            [],
        )
        .unwrap();
        assert!(matches!(get_schema_version(&conn), Err(StoreError::InvalidData(_))));
    }

    #[test]
    fn test_schema_version_without_table_is_error() {
        let conn = Connection::open_in_memory().unwrap();
        assert!(matches!(get_schema_version(&conn), Err(StoreError::Sqlite(_))));
    }

    #[test]
    fn test_idempotent_initialize() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        initialize(&conn).unwrap();
    }

    #[test]
    fn test_prime_index_cascades() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn.execute_batch(
            "INSERT INTO signatures (hash, primes, fingerprint, polynomial) VALUES (1, '[3,5]', '[]', '1');
             INSERT INTO signature_primes (prime, hash) VALUES (3, 1), (5, 1);
             DELETE FROM signatures;",
        )
        .unwrap();
        let left: i64 = conn
            .query_row("SELECT count(*) FROM signature_primes", [], |row| row.get(0))
            .unwrap();
        assert_eq!(left, 0);
    }
}
