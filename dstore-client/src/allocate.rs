/// Reserve ids for incomplete keys
use dstore_core::Key;
use dstore_proto as proto;
use tracing::debug;

use crate::context::RequestContext;
use crate::convert::{key_from_proto, key_to_proto};
use crate::dispatch::Request;
use crate::error::{ClientError, Result};

/// Ask the store for `n` ids completing `incomplete_key`.
///
/// A complete key is rejected before anything is sent. The returned keys
/// follow the order the store reports them.
pub async fn allocate_ids<C>(ctx: &C, incomplete_key: &Key, n: usize) -> Result<Vec<Key>>
where
    C: RequestContext + ?Sized,
{
    if incomplete_key.is_complete() {
        return Err(ClientError::CompleteKey(incomplete_key.to_string()));
    }
    if n == 0 {
        return Ok(Vec::new());
    }

    let request = proto::AllocateIdsRequest {
        key: vec![key_to_proto(incomplete_key); n],
    };
    let response = ctx
        .dispatch(Request::AllocateIds(request))
        .await?
        .into_allocate_ids()?;

    debug!("Allocated {} of {} requested ids", response.key.len(), n);
    Ok(response.key.into_iter().map(key_from_proto).collect())
}
