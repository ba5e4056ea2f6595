//! Hourly host snapshot storage and daily rollups for a storage-host
//! monitoring daemon.

pub mod adapters;
pub mod application;
pub mod codec;
pub mod config;
pub mod domain;
pub mod error;
pub mod interface;
pub mod ports;
