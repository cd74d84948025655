/// Persisted record models.
pub mod models;
/// Session record store abstraction and implementations.
pub mod session_store;
/// Storage error types.
pub mod storage;
