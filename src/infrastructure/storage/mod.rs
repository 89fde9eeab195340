//! Storage adapters for inkmatch.
//!
//! The sled-backed catalog holds tattoo records; uploaded image bytes live
//! as plain files in the uploads directory.

pub mod sled_store;
pub mod uploads;

pub use sled_store::SledCatalogStore;
pub use uploads::{sanitize_file_name, UploadDirectory};
