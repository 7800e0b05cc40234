//! # History
//!
//! Audit trail construction. Two separate streams are exposed: the entity
//! stream (operations on one root, with their one-level cascades) and the
//! connection stream (service-channel link changes). Callers wanting a combined
//! view interleave the two by `edited_at`.

pub mod connection;
pub mod mapper;
pub mod query;

pub use connection::map_connection;
pub use mapper::{flatten, language_versions, map_operation, MappingContext};
pub use query::HistoryService;
