//! Scripted in-process transport shared by the integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use dstore_client::convert::{entity_to_proto, key_to_proto};
use dstore_client::{
    Action, AuthorizedTransport, ClientConfig, ClientError, Dataset, Request, RequestParams,
    Response, Result, TransportResponse,
};
use dstore_core::{Key, PropertyMap, Value};
use dstore_proto as proto;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

pub const PROJECT: &str = "test-project";

/// One scripted reply
pub enum Reply {
    /// Encoded response, delivered in one chunk
    Ok(Response),
    /// Encoded response, split into chunks of the given size
    Chunked(Response, usize),
    /// Non-success status with a text body
    Status(u16, String),
    /// Raw body bytes with a success status
    Raw(Vec<u8>),
    /// Transport-level failure
    Fail(String),
}

/// A request as the transport saw it
#[derive(Debug, Clone)]
pub struct Recorded {
    pub params: RequestParams,
    pub action: Action,
    pub request: Request,
}

#[derive(Default)]
pub struct MockTransport {
    replies: Mutex<VecDeque<Reply>>,
    recorded: Mutex<Vec<Recorded>>,
    deny_authorization: Mutex<Option<String>>,
    gate: Mutex<Option<SendGate>>,
}

/// Holds `send` open until released
#[derive(Clone, Default)]
struct SendGate {
    in_flight: Arc<Notify>,
    release: Arc<Notify>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push(&self, reply: Reply) {
        self.replies.lock().unwrap().push_back(reply);
    }

    pub fn reply(&self, response: Response) {
        self.push(Reply::Ok(response));
    }

    pub fn deny_authorization(&self, message: &str) {
        *self.deny_authorization.lock().unwrap() = Some(message.to_string());
    }

    /// Hold every `send` open until `release_sends` is called
    pub fn hold_sends(&self) {
        *self.gate.lock().unwrap() = Some(SendGate::default());
    }

    /// Wait until a held `send` has been entered
    pub async fn wait_in_flight(&self) {
        let gate = self.gate.lock().unwrap().clone().expect("sends are held");
        gate.in_flight.notified().await;
    }

    pub fn release_sends(&self) {
        if let Some(gate) = self.gate.lock().unwrap().take() {
            gate.release.notify_one();
        }
    }

    pub fn recorded(&self) -> Vec<Recorded> {
        self.recorded.lock().unwrap().clone()
    }

    pub fn dispatch_count(&self) -> usize {
        self.recorded.lock().unwrap().len()
    }

    pub fn remaining_replies(&self) -> usize {
        self.replies.lock().unwrap().len()
    }
}

#[async_trait]
impl AuthorizedTransport for MockTransport {
    async fn authorize(&self, mut params: RequestParams) -> Result<RequestParams> {
        if let Some(message) = self.deny_authorization.lock().unwrap().clone() {
            return Err(ClientError::Transport(message));
        }
        params.set_header("Authorization", "Bearer test-token");
        Ok(params)
    }

    async fn send(&self, params: RequestParams) -> Result<TransportResponse> {
        let action_name = params.path.rsplit('/').next().unwrap_or_default();
        let action = Action::from_name(action_name)
            .unwrap_or_else(|| panic!("unknown action in path {}", params.path));
        let request = Request::decode(action, &params.body).expect("request decodes");
        self.recorded.lock().unwrap().push(Recorded {
            params,
            action,
            request,
        });

        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.in_flight.notify_one();
            gate.release.notified().await;
        }

        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Reply::Fail("no scripted reply".to_string()));

        match reply {
            Reply::Ok(response) => Ok(TransportResponse::from_bytes(200, response.encode_to_vec())),
            Reply::Chunked(response, size) => {
                let body = response.encode_to_vec();
                let chunks = body.chunks(size.max(1)).map(Bytes::copy_from_slice).collect();
                Ok(TransportResponse::from_chunks(200, chunks))
            }
            Reply::Status(status, message) => Ok(TransportResponse::from_bytes(status, message)),
            Reply::Raw(body) => Ok(TransportResponse::from_bytes(200, body)),
            Reply::Fail(message) => Err(ClientError::Transport(message)),
        }
    }
}

pub fn config() -> ClientConfig {
    ClientConfig::new(PROJECT).with_api_host("https://datastore.test")
}

pub fn dataset(transport: &Arc<MockTransport>) -> Dataset {
    Dataset::new(config(), transport.clone()).expect("valid config")
}

pub fn props(pairs: &[(&str, Value)]) -> PropertyMap {
    pairs
        .iter()
        .map(|(name, value)| (name.to_string(), value.clone()))
        .collect()
}

pub fn entity_result(key: &Key, pairs: &[(&str, Value)]) -> proto::EntityResult {
    proto::EntityResult {
        entity: Some(entity_to_proto(key, &props(pairs))),
    }
}

pub fn lookup_response(
    found: Vec<proto::EntityResult>,
    missing: Vec<&Key>,
    deferred: Vec<&Key>,
) -> Response {
    Response::Lookup(proto::LookupResponse {
        found,
        missing: missing
            .into_iter()
            .map(|k| proto::EntityResult {
                entity: Some(proto::Entity {
                    key: Some(key_to_proto(k)),
                    property: Vec::new(),
                }),
            })
            .collect(),
        deferred: deferred.into_iter().map(key_to_proto).collect(),
    })
}

pub fn commit_response(generated: Vec<Key>) -> Response {
    Response::Commit(proto::CommitResponse {
        mutation_result: Some(proto::MutationResult {
            index_updates: Some(1),
            insert_auto_id_key: generated.iter().map(key_to_proto).collect(),
        }),
    })
}

/// Query page ending at `cursor`
pub fn query_response(entities: Vec<proto::EntityResult>, cursor: &[u8]) -> Response {
    batch_response(entities, Some(cursor.to_vec()))
}

/// Query page without an end cursor
pub fn last_page(entities: Vec<proto::EntityResult>) -> Response {
    batch_response(entities, None)
}

fn batch_response(entities: Vec<proto::EntityResult>, end_cursor: Option<Vec<u8>>) -> Response {
    Response::RunQuery(proto::RunQueryResponse {
        batch: Some(proto::QueryResultBatch {
            entity_result_type: Some(proto::entity_result::ResultType::Full as i32),
            entity_result: entities,
            end_cursor,
            more_results: None,
            skipped_results: None,
        }),
    })
}

pub fn begin_response(id: &[u8]) -> Response {
    Response::BeginTransaction(proto::BeginTransactionResponse {
        transaction: Some(id.to_vec()),
    })
}

pub fn lookup_keys(request: &Request) -> Vec<proto::Key> {
    match request {
        Request::Lookup(l) => l.key.clone(),
        other => panic!("expected lookup, got {:?}", other.action()),
    }
}

pub fn commit_of(request: &Request) -> &proto::CommitRequest {
    match request {
        Request::Commit(c) => c,
        other => panic!("expected commit, got {:?}", other.action()),
    }
}
