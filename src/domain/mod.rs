//! Domain layer: core catalog entities and value objects for inkmatch.

pub mod errors;
pub mod models;

pub use errors::DomainError;
pub use models::{
    CatalogEntry, EmbeddingVector, NewTattoo, RankedResult, TattooDraft, TattooRecord,
};
