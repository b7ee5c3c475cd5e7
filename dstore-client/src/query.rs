/// Query execution: single pages and lazily paginated streams
use std::collections::VecDeque;

use dstore_core::{Entity, Query};
use dstore_proto as proto;
use futures::stream::{self, BoxStream, StreamExt};
use tracing::debug;

use crate::context::RequestContext;
use crate::convert::{cursor_to_string, entities_from_results, partition_for, query_to_proto};
use crate::dispatch::Request;
use crate::error::Result;

/// Run one page of a query.
///
/// Returns the decoded entities and the batch's end cursor as a base64
/// string, empty when the store sent none. Never fetches a second page.
pub async fn run_query<C>(ctx: &C, query: &Query) -> Result<(Vec<Entity>, String)>
where
    C: RequestContext + ?Sized,
{
    let namespace = query
        .namespace
        .as_deref()
        .or(ctx.dispatcher().config().namespace.as_deref());

    let request = proto::RunQueryRequest {
        read_options: None,
        partition_id: partition_for(namespace),
        query: Some(query_to_proto(query)?),
    };

    let response = ctx
        .dispatch(Request::RunQuery(request))
        .await?
        .into_run_query()?;

    let Some(batch) = response.batch else {
        return Ok((Vec::new(), String::new()));
    };

    let cursor = batch
        .end_cursor
        .as_deref()
        .map(cursor_to_string)
        .unwrap_or_default();
    let entities = entities_from_results(batch.entity_result)?;

    debug!(
        "Query page: {} entities, cursor: {}",
        entities.len(),
        !cursor.is_empty()
    );
    Ok((entities, cursor))
}

struct StreamState<'a, C: ?Sized> {
    ctx: &'a C,
    next: Option<Query>,
    remaining: Option<u32>,
    buffered: VecDeque<Entity>,
}

/// Stream every result of a query, fetching pages on demand.
///
/// Nothing is sent until the stream is first polled, and at most one page
/// request is in flight. The stream ends when a page arrives without a
/// cursor or without entities, or once the query's limit has been emitted.
/// A failed page yields one `Err` and ends the stream. Dropping the stream
/// stops further fetches.
pub fn run_query_stream<'a, C>(ctx: &'a C, query: Query) -> BoxStream<'a, Result<Entity>>
where
    C: RequestContext + ?Sized,
{
    let state = StreamState {
        ctx,
        remaining: query.limit,
        next: Some(query),
        buffered: VecDeque::new(),
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(entity) = state.buffered.pop_front() {
                return Some((Ok(entity), state));
            }

            let query = state.next.take()?;
            if state.remaining == Some(0) {
                return None;
            }

            let (mut entities, cursor) = match run_query(state.ctx, &query).await {
                Ok(page) => page,
                Err(e) => return Some((Err(e), state)),
            };
            if cursor.is_empty() || entities.is_empty() {
                return None;
            }

            if let Some(remaining) = state.remaining.as_mut() {
                let take = entities.len().min(*remaining as usize);
                entities.truncate(take);
                *remaining -= take as u32;
            }
            state.buffered.extend(entities);

            match state.remaining {
                Some(0) => {}
                remaining => {
                    let mut next = query.start(cursor).offset(0);
                    next.limit = remaining;
                    state.next = Some(next);
                }
            }
        }
    })
    .boxed()
}
