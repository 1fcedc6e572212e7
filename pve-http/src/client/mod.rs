//! Blocking TLS capable HTTP client implementation.

mod sync;
pub use sync::Client;
