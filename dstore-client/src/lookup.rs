/// Key lookups with transparent resolution of deferred keys
use dstore_core::{Entity, Key};
use dstore_proto as proto;
use tracing::debug;

use crate::context::RequestContext;
use crate::convert::{entities_from_results, key_to_proto};
use crate::dispatch::Request;
use crate::error::Result;

/// Fetch a single entity; `None` when the key does not exist
pub async fn get<C>(ctx: &C, key: &Key) -> Result<Option<Entity>>
where
    C: RequestContext + ?Sized,
{
    let mut found = get_multi(ctx, std::slice::from_ref(key)).await?;
    if found.is_empty() {
        Ok(None)
    } else {
        Ok(Some(found.swap_remove(0)))
    }
}

/// Fetch several entities in one round trip.
///
/// Entities come back in the order the store reports them as found.
/// Missing keys contribute nothing. Keys the store defers are requested
/// again until every key has been answered; any failure discards the
/// partial result.
pub async fn get_multi<C>(ctx: &C, keys: &[Key]) -> Result<Vec<Entity>>
where
    C: RequestContext + ?Sized,
{
    if keys.is_empty() {
        return Ok(Vec::new());
    }

    let mut pending: Vec<proto::Key> = keys.iter().map(key_to_proto).collect();
    let mut entities = Vec::with_capacity(keys.len());
    let mut round = 0usize;

    loop {
        let request = proto::LookupRequest {
            read_options: None,
            key: pending,
        };
        let response = ctx.dispatch(Request::Lookup(request)).await?.into_lookup()?;

        debug!(
            "Lookup round {}: {} found, {} missing, {} deferred",
            round,
            response.found.len(),
            response.missing.len(),
            response.deferred.len()
        );

        entities.extend(entities_from_results(response.found)?);

        if response.deferred.is_empty() {
            return Ok(entities);
        }
        pending = response.deferred;
        round += 1;
    }
}
