//! HTTP transport used by the Proxmox VE API client.

mod client_trait;
pub use client_trait::{HttpClient, HttpError};

mod http_options;
pub use http_options::{HttpOptions, TlsOptions};

#[cfg(feature = "client-sync")]
pub mod client;
