use std::path::Path;
use std::sync::Arc;

use rusqlite::{Connection, OptionalExtension, params};
use sig_core::{AlexanderModule, MemoryEntry, ModuleSignature};

use crate::error::{Result, StoreError};
use crate::memory::SignatureMemory;
use crate::schema;

/// SQLite persistence for [`SignatureMemory`].
pub struct SignatureStore {
    conn: Connection,
}

impl SignatureStore {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        schema::initialize(&conn)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        schema::initialize(&conn)?;
        Ok(Self { conn })
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    // --- Metadata ---

    pub fn get_metadata(&self, key: &str) -> Result<Option<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT value FROM metadata WHERE key = ?1")?;
        let result = stmt.query_row([key], |row| row.get(0)).optional()?;
        Ok(result)
    }

    pub fn set_metadata(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO metadata (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    // --- Save ---

    /// Replace the stored contents with `memory`, in one transaction.
    pub fn save_memory(&self, memory: &SignatureMemory) -> Result<()> {
        let entries = memory.entries();
        let tx = self.conn.unchecked_transaction()?;
        tx.execute_batch("DELETE FROM signature_primes; DELETE FROM signatures;")?;
        for entry in &entries {
            insert_entry(&tx, entry)?;
        }
        tx.commit()?;
        tracing::info!(count = entries.len(), "saved signature memory");
        Ok(())
    }

    /// Insert one signature unless its hash is already stored. Returns
    /// whether a row was written.
    pub fn save_signature(&self, signature: &ModuleSignature) -> Result<bool> {
        let tx = self.conn.unchecked_transaction()?;
        let written = insert_entry(&tx, &signature.to_memory_entry())?;
        tx.commit()?;
        Ok(written)
    }

    // --- Load ---

    /// Stored rows in insertion order.
    pub fn load_entries(&self) -> Result<Vec<MemoryEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT hash, primes, fingerprint, polynomial, created FROM signatures ORDER BY rowid",
        )?;
        let rows: Vec<(i64, String, String, String, String)> = stmt
            .query_map([], |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                ))
            })?
            .collect::<std::result::Result<_, _>>()?;

        rows.into_iter()
            .map(|(hash, primes, fingerprint, polynomial, created)| {
                Ok(MemoryEntry {
                    key: parse_hash(hash)?,
                    primes: serde_json::from_str(&primes)?,
                    fingerprint: serde_json::from_str(&fingerprint)?,
                    polynomial,
                    created,
                })
            })
            .collect()
    }

    /// Rebuild a memory by re-deriving each stored row from its primes.
    pub fn load_memory<F>(&self, factory: F) -> Result<SignatureMemory>
    where
        F: Fn(&[u64]) -> sig_core::Result<AlexanderModule>,
    {
        let memory = SignatureMemory::new();
        for entry in self.load_entries()? {
            let signature = ModuleSignature::new(factory(&entry.primes)?);
            if signature.hash() != entry.key {
                tracing::warn!(
                    stored = entry.key,
                    derived = signature.hash(),
                    "re-derived hash differs from stored row"
                );
            }
            memory.store(Arc::new(signature));
        }
        tracing::info!(count = memory.len(), "loaded signature memory");
        Ok(memory)
    }

    pub fn hashes_by_prime(&self, prime: u64) -> Result<Vec<u32>> {
        let mut stmt = self.conn.prepare(
            "SELECT sp.hash FROM signature_primes sp
             JOIN signatures s ON s.hash = sp.hash
             WHERE sp.prime = ?1 ORDER BY s.rowid",
        )?;
        let hashes: Vec<i64> = stmt
            .query_map([to_sql_int(prime)?], |row| row.get(0))?
            .collect::<std::result::Result<_, _>>()?;
        hashes.into_iter().map(parse_hash).collect()
    }

    pub fn contains(&self, hash: u32) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM signatures WHERE hash = ?1",
            [i64::from(hash)],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    pub fn count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM signatures", [], |row| row.get(0))?;
        usize::try_from(count).map_err(|_| StoreError::InvalidData(format!("bad row count: {count}")))
    }
}

fn insert_entry(conn: &Connection, entry: &MemoryEntry) -> Result<bool> {
    let hash = i64::from(entry.key);
    let written = conn.execute(
        "INSERT OR IGNORE INTO signatures (hash, primes, fingerprint, polynomial, created)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            hash,
            serde_json::to_string(&entry.primes)?,
            serde_json::to_string(&entry.fingerprint)?,
            entry.polynomial,
            entry.created,
        ],
    )?;
    if written == 0 {
        return Ok(false);
    }

    let mut stmt =
        conn.prepare("INSERT OR IGNORE INTO signature_primes (prime, hash) VALUES (?1, ?2)")?;
    for &prime in &entry.primes {
        stmt.execute(params![to_sql_int(prime)?, hash])?;
    }
    Ok(true)
}

fn to_sql_int(prime: u64) -> Result<i64> {
    i64::try_from(prime).map_err(|_| StoreError::InvalidData(format!("prime out of range: {prime}")))
}

fn parse_hash(value: i64) -> Result<u32> {
    u32::try_from(value).map_err(|_| StoreError::InvalidData(format!("bad signature hash: {value}")))
}
