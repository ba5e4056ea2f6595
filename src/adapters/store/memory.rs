use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard, RwLock};

use crate::ports::{Cursor, EngineResult, Entry, KvEngine, ReadTxn, WriteTxn};

type Namespace = BTreeMap<Vec<u8>, Vec<u8>>;
type Tables = BTreeMap<String, Namespace>;

/// In-memory ordered key-value engine.
///
/// Committed state is an immutable `Arc` swapped on commit. A read
/// transaction pins the `Arc` it started with, so it never sees a later
/// commit and never holds a lock while it runs.
#[derive(Default)]
pub struct MemoryEngine {
    committed: RwLock<Arc<Tables>>,
    writer: Mutex<()>,
}

impl MemoryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    fn snapshot(&self) -> Arc<Tables> {
        Arc::clone(&self.committed.read())
    }
}

impl KvEngine for MemoryEngine {
    fn begin_read(&self) -> EngineResult<Box<dyn ReadTxn + '_>> {
        Ok(Box::new(MemoryReadTxn {
            snapshot: self.snapshot(),
        }))
    }

    fn begin_write(&self) -> EngineResult<Box<dyn WriteTxn + '_>> {
        let guard = self.writer.lock();

        Ok(Box::new(MemoryWriteTxn {
            engine: self,
            _guard: guard,
            base: self.snapshot(),
            pending: Tables::new(),
        }))
    }
}

struct MemoryReadTxn {
    snapshot: Arc<Tables>,
}

impl ReadTxn for MemoryReadTxn {
    fn get(&self, namespace: &str, key: &[u8]) -> EngineResult<Option<Vec<u8>>> {
        Ok(self
            .snapshot
            .get(namespace)
            .and_then(|table| table.get(key))
            .cloned())
    }

    fn cursor(&self, namespace: &str) -> EngineResult<Box<dyn Cursor + '_>> {
        Ok(Box::new(MemoryCursor {
            table: self.snapshot.get(namespace),
            position: None,
        }))
    }
}

struct MemoryCursor<'a> {
    table: Option<&'a Namespace>,
    position: Option<Vec<u8>>,
}

impl MemoryCursor<'_> {
    fn step(&mut self, lower: Bound<&[u8]>) -> Option<Entry> {
        let entry = self
            .table?
            .range::<[u8], _>((lower, Bound::Unbounded))
            .next()
            .map(|(k, v)| (k.clone(), v.clone()));

        self.position = entry.as_ref().map(|(k, _)| k.clone());
        entry
    }
}

impl Cursor for MemoryCursor<'_> {
    fn seek(&mut self, key: &[u8]) -> EngineResult<Option<Entry>> {
        Ok(self.step(Bound::Included(key)))
    }

    fn next(&mut self) -> EngineResult<Option<Entry>> {
        let Some(current) = self.position.take() else {
            return Ok(None);
        };
        Ok(self.step(Bound::Excluded(current.as_slice())))
    }
}

struct MemoryWriteTxn<'a> {
    engine: &'a MemoryEngine,
    _guard: MutexGuard<'a, ()>,
    base: Arc<Tables>,
    pending: Tables,
}

impl WriteTxn for MemoryWriteTxn<'_> {
    fn get(&self, namespace: &str, key: &[u8]) -> EngineResult<Option<Vec<u8>>> {
        let pending = self.pending.get(namespace).and_then(|table| table.get(key));
        let value = pending.or_else(|| self.base.get(namespace).and_then(|table| table.get(key)));
        Ok(value.cloned())
    }

    fn put(&mut self, namespace: &str, key: &[u8], value: &[u8]) -> EngineResult<()> {
        self.pending
            .entry(namespace.to_string())
            .or_default()
            .insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn commit(self: Box<Self>) -> EngineResult<()> {
        let MemoryWriteTxn {
            engine,
            _guard,
            base,
            pending,
        } = *self;

        // Release our pin so make_mut can reuse the map when no reader holds it
        drop(base);

        let mut committed = engine.committed.write();
        let tables = Arc::make_mut(&mut committed);
        for (namespace, entries) in pending {
            tables.entry(namespace).or_default().extend(entries);
        }
        Ok(())
    }
}
