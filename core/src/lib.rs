//! Fluent, blocking REST client for HAL-style hypermedia APIs.
//!
//! # Overview
//! A `RestRequest` is configured through chained calls (verb, credentials,
//! media types), executed once, and either yields a `RestResponse` or an
//! error describing why the status was not what the verb expects. The body
//! of a response parses into a `Resource` whose links produce further
//! requests.
//!
//! ```no_run
//! use rest_core::{ClientConfig, RestClient};
//!
//! let client = RestClient::new(ClientConfig::default());
//! let response = client
//!     .request("https://api.example.com/items")
//!     .get()
//!     .auth("alice", "secret")
//!     .accept("application/hal+json")
//!     .send()?;
//! if let Some(items) = response.resource()? {
//!     println!("{}", items["count"]);
//! }
//! # Ok::<(), rest_core::RestError>(())
//! ```
//!
//! # Design
//! - `Transport` is the only I/O seam; `UreqTransport` is the default.
//! - Builders consume `self`, so a configured request cannot be shared or
//!   executed twice.
//! - Nothing is retried or recovered; every failure surfaces as `RestError`.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod request;
pub mod resource;
pub mod response;
pub mod transport;
pub mod types;

pub use client::RestClient;
pub use config::ClientConfig;
pub use error::{RestError, Result, TransportError};
pub use http::{FilePart, HttpRequest, HttpResponse, Payload, RequestBody, Verb};
pub use request::RestRequest;
pub use resource::Resource;
pub use response::RestResponse;
pub use transport::{Transport, UreqTransport};
pub use types::{Credentials, Invocation};
