//! Named-slot key/value storage backends for the cart.

use chrono::Utc;
use color_eyre::{eyre::eyre, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

/// Trait for cart storage backends.
///
/// A backend holds opaque string values under named slots, the way browser
/// local storage does.
pub trait CartStorage: Send + Sync {
  /// Read the value stored under `slot`, if any.
  fn read(&self, slot: &str) -> Result<Option<String>>;

  /// Replace the value stored under `slot`.
  fn write(&self, slot: &str, value: &str) -> Result<()>;

  /// Delete `slot` entirely.
  fn remove(&self, slot: &str) -> Result<()>;
}

/// In-process storage; contents vanish with the process.
#[derive(Debug, Default)]
pub struct MemoryStorage {
  slots: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
  pub fn new() -> Self {
    Self::default()
  }
}

impl CartStorage for MemoryStorage {
  fn read(&self, slot: &str) -> Result<Option<String>> {
    let slots = self
      .slots
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;
    Ok(slots.get(slot).cloned())
  }

  fn write(&self, slot: &str, value: &str) -> Result<()> {
    let mut slots = self
      .slots
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;
    slots.insert(slot.to_string(), value.to_string());
    Ok(())
  }

  fn remove(&self, slot: &str) -> Result<()> {
    let mut slots = self
      .slots
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;
    slots.remove(slot);
    Ok(())
  }
}

/// SQLite-based slot storage.
pub struct SqliteStorage {
  conn: Mutex<Connection>,
}

impl SqliteStorage {
  /// Open or create the database at `path`.
  pub fn open(path: &Path) -> Result<Self> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)
        .map_err(|e| eyre!("Failed to create cart directory: {}", e))?;
    }

    let conn = Connection::open(path)
      .map_err(|e| eyre!("Failed to open cart database at {}: {}", path.display(), e))?;

    let storage = Self {
      conn: Mutex::new(conn),
    };
    storage.run_migrations()?;

    Ok(storage)
  }

  /// Run database migrations for the slot table.
  fn run_migrations(&self) -> Result<()> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    conn
      .execute_batch(SLOT_SCHEMA)
      .map_err(|e| eyre!("Failed to run cart migrations: {}", e))?;

    Ok(())
  }
}

/// Schema for the slot table.
const SLOT_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS kv_store (
    slot TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
"#;

impl CartStorage for SqliteStorage {
  fn read(&self, slot: &str) -> Result<Option<String>> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    conn
      .query_row(
        "SELECT value FROM kv_store WHERE slot = ?",
        params![slot],
        |row| row.get(0),
      )
      .optional()
      .map_err(|e| eyre!("Failed to read slot {}: {}", slot, e))
  }

  fn write(&self, slot: &str, value: &str) -> Result<()> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    conn
      .execute(
        "INSERT OR REPLACE INTO kv_store (slot, value, updated_at) VALUES (?, ?, ?)",
        params![slot, value, Utc::now().to_rfc3339()],
      )
      .map_err(|e| eyre!("Failed to write slot {}: {}", slot, e))?;

    Ok(())
  }

  fn remove(&self, slot: &str) -> Result<()> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    conn
      .execute("DELETE FROM kv_store WHERE slot = ?", params![slot])
      .map_err(|e| eyre!("Failed to remove slot {}: {}", slot, e))?;

    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_memory_storage_roundtrip() {
    let storage = MemoryStorage::new();
    assert_eq!(storage.read("cart").unwrap(), None);

    storage.write("cart", "[]").unwrap();
    assert_eq!(storage.read("cart").unwrap().as_deref(), Some("[]"));

    storage.remove("cart").unwrap();
    assert_eq!(storage.read("cart").unwrap(), None);
  }

  #[test]
  fn test_sqlite_storage_persists_across_opens() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("cart.db");

    {
      let storage = SqliteStorage::open(&path).unwrap();
      storage.write("cart", r#"[{"id":1}]"#).unwrap();
      storage.write("cart", r#"[{"id":2}]"#).unwrap();
    }

    let storage = SqliteStorage::open(&path).unwrap();
    assert_eq!(
      storage.read("cart").unwrap().as_deref(),
      Some(r#"[{"id":2}]"#)
    );
    assert_eq!(storage.read("other").unwrap(), None);

    storage.remove("cart").unwrap();
    assert_eq!(storage.read("cart").unwrap(), None);
  }
}
