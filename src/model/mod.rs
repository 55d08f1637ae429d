pub mod types;

pub use types::{GrantRecord, GrantStatus, ResultSource, SearchResult};
