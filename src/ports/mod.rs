pub mod kv_engine;

pub use kv_engine::{Cursor, EngineResult, Entry, KvEngine, ReadTxn, WriteTxn};
