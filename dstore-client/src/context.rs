/// Request context: the capability shared by dataset and transaction handles
///
/// Operations are written once against [`RequestContext`]. The context's
/// [`ContextMode`] decides whether mutations are sent immediately or
/// buffered until the owning transaction commits.
use async_trait::async_trait;
use dstore_proto as proto;
use parking_lot::Mutex;

use crate::dispatch::{Dispatcher, Request, Response};
use crate::error::{ClientError, Result};

/// Continuation run after the owning transaction commits, receiving the
/// keys the store generated for this entry's `insert_auto_id` batch
pub type Completion = Box<dyn FnOnce(Vec<proto::Key>) + Send>;

/// One mutation waiting for its transaction to commit
pub struct PendingMutation {
    pub mutation: proto::Mutation,
    pub completion: Option<Completion>,
}

impl std::fmt::Debug for PendingMutation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingMutation")
            .field("mutation", &self.mutation)
            .field("completion", &self.completion.is_some())
            .finish()
    }
}

/// Ordered queue of mutations buffered by a transaction.
///
/// Closing the queue hands its entries to the commit or rollback that
/// closed it. Pushes after that fail, so nothing can be queued behind a
/// commit that is already in flight.
#[derive(Debug)]
pub struct PendingQueue {
    // None once closed
    entries: Mutex<Option<Vec<PendingMutation>>>,
}

impl Default for PendingQueue {
    fn default() -> Self {
        Self {
            entries: Mutex::new(Some(Vec::new())),
        }
    }
}

impl PendingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, mutation: proto::Mutation, completion: Option<Completion>) -> Result<()> {
        match self.entries.lock().as_mut() {
            Some(entries) => {
                entries.push(PendingMutation {
                    mutation,
                    completion,
                });
                Ok(())
            }
            None => Err(ClientError::TransactionFinalized),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().as_ref().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_closed(&self) -> bool {
        self.entries.lock().is_none()
    }

    /// Close the queue and return every queued entry, in queue order.
    ///
    /// Returns `None` if the queue was already closed.
    pub fn close(&self) -> Option<Vec<PendingMutation>> {
        self.entries.lock().take()
    }
}

/// How a context sends its requests
#[derive(Debug, Clone, Copy)]
pub enum ContextMode<'a> {
    /// Mutations commit immediately; lookups read the latest data
    Immediate,
    /// Mutations are queued for the transaction's commit; lookups read its snapshot
    Buffered {
        transaction: &'a [u8],
        queue: &'a PendingQueue,
    },
}

impl<'a> ContextMode<'a> {
    pub fn transaction(&self) -> Option<&'a [u8]> {
        match *self {
            ContextMode::Immediate => None,
            ContextMode::Buffered { transaction, .. } => Some(transaction),
        }
    }
}

#[async_trait]
pub trait RequestContext: Send + Sync {
    fn dispatcher(&self) -> &Dispatcher;

    fn mode(&self) -> ContextMode<'_>;

    /// Fails when the context can no longer issue requests
    fn ensure_active(&self) -> Result<()> {
        Ok(())
    }

    /// Send a request through the dispatcher with this context's framing
    async fn dispatch(&self, request: Request) -> Result<Response> {
        self.ensure_active()?;
        let transaction = self.mode().transaction();
        self.dispatcher().dispatch(transaction, request).await
    }
}
