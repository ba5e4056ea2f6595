use std::fs;
use std::ops::Bound;
use std::path::Path;

use redb::{Database, ReadOnlyTable, ReadableTable, TableDefinition, TableError};
use tracing::debug;

use crate::error::EngineError;
use crate::ports::{Cursor, EngineResult, Entry, KvEngine, ReadTxn, WriteTxn};

const DB_FILE: &str = "hostwatch.redb";

type Bytes = &'static [u8];

fn table(namespace: &str) -> TableDefinition<'_, Bytes, Bytes> {
    TableDefinition::new(namespace)
}

fn backend(err: impl Into<redb::Error>) -> EngineError {
    EngineError::Backend(Box::new(err.into()))
}

/// Persistent engine backed by redb, one table per namespace.
///
/// redb is copy-on-write with MVCC: a read transaction sees the database as
/// of the moment it began, and at most one write transaction is open at a
/// time. Commits are durable once `commit` returns.
pub struct RedbEngine {
    db: Database,
}

impl RedbEngine {
    /// Open or create the database file inside `dir`
    pub fn open(dir: impl AsRef<Path>) -> EngineResult<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).map_err(|e| EngineError::Backend(Box::new(e)))?;

        let path = dir.join(DB_FILE);
        debug!("Opening redb database at {}", path.display());
        let db = Database::create(&path).map_err(backend)?;
        Ok(Self { db })
    }
}

impl KvEngine for RedbEngine {
    fn begin_read(&self) -> EngineResult<Box<dyn ReadTxn + '_>> {
        let txn = self.db.begin_read().map_err(backend)?;
        Ok(Box::new(RedbReadTxn { txn }))
    }

    fn begin_write(&self) -> EngineResult<Box<dyn WriteTxn + '_>> {
        let txn = self.db.begin_write().map_err(backend)?;
        Ok(Box::new(RedbWriteTxn { txn }))
    }
}

struct RedbReadTxn {
    txn: redb::ReadTransaction,
}

impl RedbReadTxn {
    /// `None` for a namespace that was never written; reads never create it
    fn open(&self, namespace: &str) -> EngineResult<Option<ReadOnlyTable<Bytes, Bytes>>> {
        match self.txn.open_table(table(namespace)) {
            Ok(table) => Ok(Some(table)),
            Err(TableError::TableDoesNotExist(_)) => Ok(None),
            Err(err) => Err(backend(err)),
        }
    }
}

impl ReadTxn for RedbReadTxn {
    fn get(&self, namespace: &str, key: &[u8]) -> EngineResult<Option<Vec<u8>>> {
        let Some(table) = self.open(namespace)? else {
            return Ok(None);
        };
        let value = table.get(key).map_err(backend)?;
        Ok(value.map(|v| v.value().to_vec()))
    }

    fn cursor(&self, namespace: &str) -> EngineResult<Box<dyn Cursor + '_>> {
        Ok(Box::new(RedbCursor {
            table: self.open(namespace)?,
            position: None,
        }))
    }
}

struct RedbCursor {
    table: Option<ReadOnlyTable<Bytes, Bytes>>,
    position: Option<Vec<u8>>,
}

impl RedbCursor {
    fn step(&mut self, lower: Bound<&[u8]>) -> EngineResult<Option<Entry>> {
        let Some(table) = self.table.as_ref() else {
            return Ok(None);
        };

        let mut range = table.range::<&[u8]>((lower, Bound::Unbounded)).map_err(backend)?;
        let entry = match range.next() {
            Some(item) => {
                let (key, value) = item.map_err(backend)?;
                Some((key.value().to_vec(), value.value().to_vec()))
            }
            None => None,
        };

        self.position = entry.as_ref().map(|(k, _)| k.clone());
        Ok(entry)
    }
}

impl Cursor for RedbCursor {
    fn seek(&mut self, key: &[u8]) -> EngineResult<Option<Entry>> {
        self.step(Bound::Included(key))
    }

    fn next(&mut self) -> EngineResult<Option<Entry>> {
        let Some(current) = self.position.take() else {
            return Ok(None);
        };
        self.step(Bound::Excluded(current.as_slice()))
    }
}

struct RedbWriteTxn {
    txn: redb::WriteTransaction,
}

impl WriteTxn for RedbWriteTxn {
    fn get(&self, namespace: &str, key: &[u8]) -> EngineResult<Option<Vec<u8>>> {
        let table = self.txn.open_table(table(namespace)).map_err(backend)?;
        let value = table.get(key).map_err(backend)?;
        Ok(value.map(|v| v.value().to_vec()))
    }

    fn put(&mut self, namespace: &str, key: &[u8], value: &[u8]) -> EngineResult<()> {
        let mut table = self.txn.open_table(table(namespace)).map_err(backend)?;
        table.insert(key, value).map_err(backend)?;
        Ok(())
    }

    fn commit(self: Box<Self>) -> EngineResult<()> {
        self.txn.commit().map_err(backend)
    }
}
