//! Interface adapters exposing the application layer to clients.

pub mod http;

pub use http::{router, AppState};
