pub mod api;
pub mod config;
pub mod constants;
pub mod core;
pub mod infrastructure;
pub mod telemetry;

pub use crate::core::errors::LedgerError;
pub use crate::core::services::LedgerService;
pub use infrastructure::logging::in_memory::InMemoryLogging;
pub use infrastructure::storage::{Storage, in_memory::InMemoryStorage, sqlite::SqliteStorage};

#[cfg(test)]
mod tests;
