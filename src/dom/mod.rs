pub mod document;
pub mod error;
pub mod query;
pub mod snapshot;
