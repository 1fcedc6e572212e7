//! Client core for the Proxmox VE REST API.
//!
//! A [`Connector`] selects a reachable host and logs in, yielding a [`Session`]. A [`Client`]
//! sends [`RequestDescriptor`]s for that session and wraps every outcome, including transport
//! failures, into a [`ResponseEnvelope`].

mod error;
pub use error::Error;

mod verb;
pub use verb::{ResponseType, Verb};

mod params;
pub use params::{to_parameters, IndexedParams, OutOfBounds, ParameterMap};

mod api_path_builder;
pub use api_path_builder::ApiPathBuilder;

pub mod session;
pub use session::{HostAndPort, Session, DEFAULT_PORT};

mod request;
pub use request::RequestDescriptor;

mod response;
pub use response::{ResponseEnvelope, NO_STATUS};

mod client;
pub use client::{invoke, Client};

mod connect;
pub use connect::{Connector, ReachabilityProbe, TcpProbe};

mod task;
pub use task::{upid_node, IsRunning, TaskStatus, WaitOptions};

pub mod endpoints;
pub use endpoints::ApiEndpoint;

pub use pve_http::{HttpClient, HttpError, HttpOptions, TlsOptions};
