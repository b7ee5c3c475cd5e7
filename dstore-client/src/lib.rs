/// dstore Client Library
///
/// This crate provides the request layer for a remote entity store spoken to
/// over HTTP with protobuf-encoded bodies. A [`Dataset`] sends every call
/// immediately; a [`Transaction`] reads from a snapshot and buffers its
/// mutations until commit.

pub mod error;
pub mod config;
pub mod transport;
pub mod convert;
pub mod dispatch;
pub mod context;
pub mod lookup;
pub mod mutation;
pub mod query;
pub mod allocate;
pub mod dataset;
pub mod transaction;

// Re-export key types
pub use config::ClientConfig;
pub use context::{ContextMode, PendingQueue, RequestContext};
pub use dataset::Dataset;
pub use dispatch::{Action, Dispatcher, Request, Response};
pub use error::{ClientError, Result};
pub use mutation::{PendingKeys, Saved};
pub use transaction::Transaction;
pub use transport::{AuthorizedTransport, HttpTransport, RequestParams, TransportResponse};
pub use dstore_core::{Entity, Key, Query, Value};
