//! Retrieval layer: the consumed retriever contract plus the
//! embedding-backed implementation over a prebuilt passage index.

pub mod index;
pub mod retriever;
pub mod vector;

pub use index::{FlatFileIndex, PassageIndex, ScoredPassage};
pub use retriever::{Passage, Retriever};
pub use vector::VectorRetriever;
