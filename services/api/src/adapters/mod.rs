//! Concrete implementations of the core's service ports.

pub mod db;
pub mod memory;
pub mod storage;
