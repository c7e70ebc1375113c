//! Utility modules for browser access, persistence and display values.
//!
//! Provides:
//! - [`storage::KeyValueStorage`] - Web Storage abstraction with an in-memory twin
//! - [`units::parse_amount`], [`units::format_amount`] - fixed-point conversion
//! - [`format::format_address`], [`format::format_date_iso`] - display helpers

pub mod dom;
pub mod format;
pub mod storage;
pub mod units;

pub use storage::{BrowserStorage, KeyValueStorage, MemoryStorage};
