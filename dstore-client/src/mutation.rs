/// Save and delete mutation batches
///
/// Entities with complete keys are upserted; entities with incomplete keys
/// are inserted with a store-assigned id, which is copied back onto the
/// caller's key once the commit succeeds. Under a transaction the batch is
/// queued and the caller gets a [`PendingKeys`] handle to apply after commit.
use dstore_core::{Entity, Key};
use dstore_proto as proto;
use tokio::sync::oneshot;
use tracing::debug;

use crate::context::{Completion, ContextMode, RequestContext};
use crate::convert::{entity_data_to_proto, key_from_proto, key_to_proto};
use crate::dispatch::Request;
use crate::error::{ClientError, Result};

/// Outcome of a save
#[derive(Debug)]
#[must_use]
pub enum Saved {
    /// The batch was committed and generated keys were written back
    Committed,
    /// The batch waits for its transaction to commit
    Queued(PendingKeys),
}

impl Saved {
    pub fn is_committed(&self) -> bool {
        matches!(self, Saved::Committed)
    }

    /// The pending handle, if the batch was queued
    pub fn into_pending(self) -> Option<PendingKeys> {
        match self {
            Saved::Committed => None,
            Saved::Queued(pending) => Some(pending),
        }
    }
}

/// Keys a transaction will assign to a queued save
#[derive(Debug)]
pub struct PendingKeys {
    batch_len: usize,
    positions: Vec<usize>,
    receiver: oneshot::Receiver<Vec<Key>>,
}

impl PendingKeys {
    /// Number of entities in the batch that are waiting for an id
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Copy the generated key paths onto the entities that were saved.
    ///
    /// `entities` must be the batch passed to the save, in the same order.
    /// Fails if the transaction has not committed yet or ended without
    /// committing.
    pub fn apply(mut self, entities: &mut [Entity]) -> Result<()> {
        if entities.len() != self.batch_len {
            return Err(ClientError::InvalidArgument(format!(
                "expected a batch of {} entities, got {}",
                self.batch_len,
                entities.len()
            )));
        }
        match self.receiver.try_recv() {
            Ok(keys) => {
                assign_keys(entities, &self.positions, keys);
                Ok(())
            }
            Err(oneshot::error::TryRecvError::Empty) => Err(ClientError::NotCommitted(
                "transaction has not committed yet".to_string(),
            )),
            Err(oneshot::error::TryRecvError::Closed) => Err(ClientError::NotCommitted(
                "transaction ended without committing".to_string(),
            )),
        }
    }
}

/// Encoded save batch plus the input positions of the auto-id inserts
#[derive(Debug)]
struct SaveBatch {
    mutation: proto::Mutation,
    insert_positions: Vec<usize>,
}

fn build_save_batch(entities: &[Entity]) -> SaveBatch {
    let mut mutation = proto::Mutation::default();
    let mut insert_positions = Vec::new();

    for (index, entity) in entities.iter().enumerate() {
        let encoded = entity_data_to_proto(entity);
        if entity.key.is_complete() {
            mutation.upsert.push(encoded);
        } else {
            mutation.insert_auto_id.push(encoded);
            insert_positions.push(index);
        }
    }

    SaveBatch {
        mutation,
        insert_positions,
    }
}

/// Overwrite the path of each key at `positions` with the generated one
fn assign_keys(entities: &mut [Entity], positions: &[usize], generated: Vec<Key>) {
    for (&position, key) in positions.iter().zip(generated) {
        if let Some(entity) = entities.get_mut(position) {
            entity.key.path = key.path;
        }
    }
}

fn commit_request(mutation: proto::Mutation) -> Request {
    Request::Commit(proto::CommitRequest {
        transaction: None,
        mutation: Some(mutation),
        mode: None,
    })
}

/// Save one entity
pub async fn save<C>(ctx: &C, entity: &mut Entity) -> Result<Saved>
where
    C: RequestContext + ?Sized,
{
    save_multi(ctx, std::slice::from_mut(entity)).await
}

/// Save a batch of entities as one mutation
pub async fn save_multi<C>(ctx: &C, entities: &mut [Entity]) -> Result<Saved>
where
    C: RequestContext + ?Sized,
{
    ctx.ensure_active()?;
    let batch = build_save_batch(entities);

    match ctx.mode() {
        ContextMode::Buffered { queue, .. } => {
            let (sender, receiver) = oneshot::channel();
            let completion: Completion = Box::new(move |keys| {
                let keys = keys.into_iter().map(key_from_proto).collect();
                // The caller may have dropped its handle
                let _ = sender.send(keys);
            });
            debug!(
                "Queued save of {} entities ({} awaiting ids)",
                entities.len(),
                batch.insert_positions.len()
            );
            queue.push(batch.mutation, Some(completion))?;
            Ok(Saved::Queued(PendingKeys {
                batch_len: entities.len(),
                positions: batch.insert_positions,
                receiver,
            }))
        }
        ContextMode::Immediate => {
            let response = ctx
                .dispatch(commit_request(batch.mutation))
                .await?
                .into_commit()?;

            if let Some(result) = response.mutation_result {
                let generated = result
                    .insert_auto_id_key
                    .into_iter()
                    .map(key_from_proto)
                    .collect();
                assign_keys(entities, &batch.insert_positions, generated);
            }
            Ok(Saved::Committed)
        }
    }
}

/// Delete one key
pub async fn delete<C>(ctx: &C, key: &Key) -> Result<()>
where
    C: RequestContext + ?Sized,
{
    delete_multi(ctx, std::slice::from_ref(key)).await
}

/// Delete a batch of keys as one mutation
pub async fn delete_multi<C>(ctx: &C, keys: &[Key]) -> Result<()>
where
    C: RequestContext + ?Sized,
{
    ctx.ensure_active()?;
    let mutation = proto::Mutation {
        delete: keys.iter().map(key_to_proto).collect(),
        ..Default::default()
    };

    match ctx.mode() {
        ContextMode::Buffered { queue, .. } => {
            debug!("Queued delete of {} keys", keys.len());
            queue.push(mutation, None)?;
            Ok(())
        }
        ContextMode::Immediate => {
            ctx.dispatch(commit_request(mutation)).await?.into_commit()?;
            Ok(())
        }
    }
}
