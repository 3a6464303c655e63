//! Per-company news vector indexes: build, persist, reload and search.
pub mod cache;
pub mod schema;
pub mod search;
pub mod table;

pub use cache::{CachedNewsIndex, CompanyVectorIndex, IndexOrigin, NewsIndexCache};
pub use search::{vector_query, SemanticRetriever};
