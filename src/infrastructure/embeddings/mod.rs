pub mod cached_engine;
pub mod simple_engine;

#[cfg(feature = "fastembed-engine")]
pub mod fastembed_engine;

pub use cached_engine::CachedEmbeddingEngine;
#[cfg(feature = "fastembed-engine")]
pub use fastembed_engine::FastEmbedEngine;
pub use simple_engine::SimpleEmbedEngine;
