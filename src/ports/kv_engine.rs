use crate::error::EngineError;

pub type EngineResult<T> = Result<T, EngineError>;

/// One key/value pair returned by a cursor
pub type Entry = (Vec<u8>, Vec<u8>);

/// Port for an embedded, ordered key-value engine.
///
/// Keys within a namespace are kept in unsigned byte-wise order. Namespaces
/// come into existence on first write; reading one that was never written
/// behaves like reading an empty one.
pub trait KvEngine: Send + Sync {
    /// Open a read transaction over a consistent view of the data
    fn begin_read(&self) -> EngineResult<Box<dyn ReadTxn + '_>>;

    /// Open a write transaction. Blocks until any other open write
    /// transaction has been committed or dropped.
    fn begin_write(&self) -> EngineResult<Box<dyn WriteTxn + '_>>;
}

pub trait ReadTxn {
    fn get(&self, namespace: &str, key: &[u8]) -> EngineResult<Option<Vec<u8>>>;

    /// Forward cursor over `namespace`, unpositioned until `seek` is called
    fn cursor(&self, namespace: &str) -> EngineResult<Box<dyn Cursor + '_>>;
}

/// Forward cursor within a transaction
pub trait Cursor {
    /// Position at the first key `>= key` and return that entry
    fn seek(&mut self, key: &[u8]) -> EngineResult<Option<Entry>>;

    /// Advance past the current entry. Returns `None` once exhausted or
    /// when `seek` was never called.
    fn next(&mut self) -> EngineResult<Option<Entry>>;
}

/// Write transaction. Writes become visible to new read transactions only
/// after `commit`; dropping the transaction discards them.
pub trait WriteTxn {
    /// Read through this transaction, seeing its own uncommitted writes
    fn get(&self, namespace: &str, key: &[u8]) -> EngineResult<Option<Vec<u8>>>;

    /// Insert or replace the value stored under `key`
    fn put(&mut self, namespace: &str, key: &[u8], value: &[u8]) -> EngineResult<()>;

    fn commit(self: Box<Self>) -> EngineResult<()>;
}
