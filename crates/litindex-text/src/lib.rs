//! litindex-text
//!
//! Tantivy-backed document store. `index` implements the writer session,
//! `inspect` reads a closed store back for verification. See `examples/`
//! for CLI-like usage during development.
pub mod tantivy_utils;
pub mod index;
pub mod inspect;

pub use index::{TantivyBackend, TantivySession};
pub use inspect::{StoreInspector, StoredFields};
