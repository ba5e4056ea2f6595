use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{DateTime, TimeZone, Utc};

use crate::adapters::MemoryEngine;
use crate::ports::{EngineResult, KvEngine, ReadTxn, WriteTxn};

pub fn hour(year: i32, month: u32, day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, 0, 0).unwrap()
}

/// Memory engine that counts opened transactions
#[derive(Default)]
pub struct CountingEngine {
    inner: MemoryEngine,
    opened: AtomicUsize,
}

impl CountingEngine {
    pub fn transactions(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }
}

impl KvEngine for CountingEngine {
    fn begin_read(&self) -> EngineResult<Box<dyn ReadTxn + '_>> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        self.inner.begin_read()
    }

    fn begin_write(&self) -> EngineResult<Box<dyn WriteTxn + '_>> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        self.inner.begin_write()
    }
}
