//! Music catalog search core - shared modules for all binaries.
//!
//! Raw track records are normalized into one canonical schema for indexing;
//! search parameters are compiled into backend queries over that schema.

pub mod backend;
pub mod batch;
pub mod classify;
pub mod error;
pub mod keys;
pub mod models;
pub mod normalize;
pub mod paging;
pub mod progress;
pub mod query;
pub mod safety;

pub use batch::normalize_batch;
pub use error::NormalizeError;
pub use keys::canonicalize;
pub use models::NormalizedDocument;
pub use normalize::{normalize, normalize_value};
pub use query::{compile, CompiledQuery, SearchParameters};
