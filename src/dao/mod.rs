/// Durable undo history keyed by match.
pub mod history;
/// Match persistence collaborators.
pub mod match_store;
/// Database model definitions.
pub mod models;
/// Storage abstraction layer for database operations.
pub mod storage;
