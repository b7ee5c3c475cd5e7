/// Transaction handle
///
/// Lookups read the transaction's snapshot. Saves and deletes are queued
/// and sent together as one transactional commit.
use dstore_core::{Entity, Key, Query};
use dstore_proto as proto;
use futures::stream::BoxStream;
use tracing::{debug, warn};

use crate::context::{Completion, ContextMode, PendingQueue, RequestContext};
use crate::dispatch::{Dispatcher, Request};
use crate::error::{ClientError, Result};
use crate::mutation::Saved;
use crate::{allocate, lookup, mutation, query};

pub struct Transaction {
    dispatcher: Dispatcher,
    id: Vec<u8>,
    queue: PendingQueue,
}

impl Transaction {
    pub(crate) async fn begin(dispatcher: Dispatcher) -> Result<Self> {
        let response = dispatcher
            .dispatch(None, Request::BeginTransaction(proto::BeginTransactionRequest::default()))
            .await?
            .into_begin_transaction()?;

        let id = response.transaction.ok_or_else(|| {
            ClientError::UnexpectedResponse("BeginTransactionResponse without transaction".to_string())
        })?;
        debug!("Began transaction ({} byte id)", id.len());

        Ok(Self {
            dispatcher,
            id,
            queue: PendingQueue::new(),
        })
    }

    /// Opaque transaction id assigned by the store
    pub fn id(&self) -> &[u8] {
        &self.id
    }

    /// Number of queued mutation batches
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn is_finalized(&self) -> bool {
        self.queue.is_closed()
    }

    pub async fn get(&self, key: &Key) -> Result<Option<Entity>> {
        lookup::get(self, key).await
    }

    pub async fn get_multi(&self, keys: &[Key]) -> Result<Vec<Entity>> {
        lookup::get_multi(self, keys).await
    }

    /// Queue a save; apply the returned handle after commit to learn new ids
    pub async fn save(&self, entity: &mut Entity) -> Result<Saved> {
        mutation::save(self, entity).await
    }

    pub async fn save_multi(&self, entities: &mut [Entity]) -> Result<Saved> {
        mutation::save_multi(self, entities).await
    }

    pub async fn delete(&self, key: &Key) -> Result<()> {
        mutation::delete(self, key).await
    }

    pub async fn delete_multi(&self, keys: &[Key]) -> Result<()> {
        mutation::delete_multi(self, keys).await
    }

    pub async fn run_query(&self, query: &Query) -> Result<(Vec<Entity>, String)> {
        query::run_query(self, query).await
    }

    pub fn run_query_stream(&self, query: Query) -> BoxStream<'_, Result<Entity>> {
        query::run_query_stream(self, query)
    }

    pub async fn allocate_ids(&self, incomplete_key: &Key, n: usize) -> Result<Vec<Key>> {
        allocate::allocate_ids(self, incomplete_key, n).await
    }

    /// Send every queued mutation as one commit.
    ///
    /// Queued saves receive their generated keys in queue order. The
    /// transaction is finalized as soon as the commit starts, whether or
    /// not it succeeds.
    pub async fn commit(&self) -> Result<()> {
        let entries = self.queue.close().ok_or(ClientError::TransactionFinalized)?;
        let mut merged = proto::Mutation::default();
        let mut shares: Vec<(usize, Option<Completion>)> = Vec::with_capacity(entries.len());

        for entry in entries {
            let mutation = entry.mutation;
            shares.push((mutation.insert_auto_id.len(), entry.completion));
            merged.upsert.extend(mutation.upsert);
            merged.update.extend(mutation.update);
            merged.insert.extend(mutation.insert);
            merged.insert_auto_id.extend(mutation.insert_auto_id);
            merged.delete.extend(mutation.delete);
            if mutation.force == Some(true) {
                merged.force = Some(true);
            }
        }

        debug!("Committing transaction with {} queued batches", shares.len());
        let request = Request::Commit(proto::CommitRequest {
            transaction: None,
            mutation: Some(merged),
            mode: None,
        });
        let response = self
            .dispatcher
            .dispatch(Some(&self.id), request)
            .await?
            .into_commit()?;

        let mut generated = response
            .mutation_result
            .map(|r| r.insert_auto_id_key)
            .unwrap_or_default()
            .into_iter();

        for (count, completion) in shares {
            let keys: Vec<proto::Key> = generated.by_ref().take(count).collect();
            if let Some(completion) = completion {
                completion(keys);
            }
        }
        Ok(())
    }

    /// Abandon the transaction and discard queued mutations
    pub async fn rollback(&self) -> Result<()> {
        let dropped = self.queue.close().ok_or(ClientError::TransactionFinalized)?;
        let request = Request::Rollback(proto::RollbackRequest {
            transaction: Some(self.id.clone()),
        });
        self.dispatcher
            .dispatch(Some(&self.id), request)
            .await?
            .into_rollback()?;

        debug!("Rolled back transaction, discarded {} queued batches", dropped.len());
        Ok(())
    }
}

impl RequestContext for Transaction {
    fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    fn mode(&self) -> ContextMode<'_> {
        ContextMode::Buffered {
            transaction: &self.id,
            queue: &self.queue,
        }
    }

    fn ensure_active(&self) -> Result<()> {
        if self.is_finalized() {
            return Err(ClientError::TransactionFinalized);
        }
        Ok(())
    }
}

impl Drop for Transaction {
    fn drop(&mut self) {
        if !self.is_finalized() && !self.queue.is_empty() {
            warn!(
                "Transaction dropped with {} uncommitted batches",
                self.queue.len()
            );
        }
    }
}

impl std::fmt::Debug for Transaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transaction")
            .field("id", &self.id)
            .field("pending", &self.queue.len())
            .field("finalized", &self.is_finalized())
            .finish()
    }
}
