pub mod engine;
pub mod errors;
pub mod models;
pub mod recalculation;
pub mod report;
pub mod services;
