//! Retrieval over the CFST 6508 directive.
//!
//! The directive PDF is loaded, chunked, embedded and indexed in a
//! persistent store; compliance queries retrieve the top-k passages by
//! cosine similarity and format them into a grounded context.

pub mod chunker;
pub mod index;
pub mod loader;
pub mod sqlite;
pub mod store;

pub use index::DirectiveIndex;
pub use sqlite::SqliteDirectiveStore;
pub use store::{DirectiveStore, PassageMatch, StoredPassage};
