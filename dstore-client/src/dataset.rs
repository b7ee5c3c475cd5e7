/// Non-transactional handle on a project's entities
use std::sync::Arc;

use dstore_core::{Entity, Key, Query};
use futures::stream::BoxStream;

use crate::config::ClientConfig;
use crate::context::{ContextMode, RequestContext};
use crate::dispatch::Dispatcher;
use crate::error::Result;
use crate::transaction::Transaction;
use crate::transport::{AuthorizedTransport, HttpTransport};
use crate::{allocate, lookup, mutation, query};

/// Dataset handle
///
/// Every call is sent immediately: saves and deletes commit on their own
/// and lookups read the latest data. Cloning is cheap; clones share the
/// transport.
///
/// # Example
///
/// ```no_run
/// use dstore_client::{ClientConfig, Dataset};
/// use dstore_core::{Entity, Key, PropertyMap};
///
/// # async fn example() -> dstore_client::Result<()> {
/// let dataset = Dataset::connect(ClientConfig::new("my-project"), Some("token".into()))?;
///
/// let mut task = Entity::new(Key::incomplete("Task"), PropertyMap::new());
/// dataset.save(&mut task).await?;
/// assert!(task.key.is_complete());
///
/// let fetched = dataset.get(&task.key).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Dataset {
    dispatcher: Dispatcher,
}

impl Dataset {
    /// Create a dataset over any authorized transport
    pub fn new(config: ClientConfig, transport: Arc<dyn AuthorizedTransport>) -> Result<Self> {
        Ok(Self::from_dispatcher(Dispatcher::new(config, transport)?))
    }

    /// Create a dataset over HTTPS with an optional bearer token
    pub fn connect(config: ClientConfig, token: Option<String>) -> Result<Self> {
        let transport = HttpTransport::new(token)?;
        Self::new(config, Arc::new(transport))
    }

    pub fn from_dispatcher(dispatcher: Dispatcher) -> Self {
        Self { dispatcher }
    }

    pub fn config(&self) -> &ClientConfig {
        self.dispatcher.config()
    }

    pub async fn get(&self, key: &Key) -> Result<Option<Entity>> {
        lookup::get(self, key).await
    }

    pub async fn get_multi(&self, keys: &[Key]) -> Result<Vec<Entity>> {
        lookup::get_multi(self, keys).await
    }

    /// Save one entity; an incomplete key is completed in place
    pub async fn save(&self, entity: &mut Entity) -> Result<()> {
        mutation::save(self, entity).await.map(|_| ())
    }

    /// Save a batch; incomplete keys are completed in place
    pub async fn save_multi(&self, entities: &mut [Entity]) -> Result<()> {
        mutation::save_multi(self, entities).await.map(|_| ())
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

    /// Begin a transaction
    pub async fn transaction(&self) -> Result<Transaction> {
        Transaction::begin(self.dispatcher.clone()).await
    }
}

impl RequestContext for Dataset {
    fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    fn mode(&self) -> ContextMode<'_> {
        ContextMode::Immediate
    }
}
