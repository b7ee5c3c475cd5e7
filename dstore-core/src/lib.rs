/// dstore core domain model
///
/// Keys, typed values, entities and queries shared by the client and the
/// command-line front end. Nothing here performs I/O.

pub mod error;
pub mod types;
pub mod query;

pub use bytes::Bytes;
pub use error::{Error, Result};
pub use types::*;
pub use query::{Direction, Filter, Operator, Order, Query};
