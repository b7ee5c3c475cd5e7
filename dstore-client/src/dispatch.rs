/// Request dispatcher: the single funnel every operation passes through
///
/// Adds transaction framing, encodes the request message, hands the HTTP
/// parameters to the authorized transport, collects the response body and
/// decodes it as the response message matching the action.
use bytes::{Bytes, BytesMut};
use dstore_proto as proto;
use futures::StreamExt;
use prost::Message;
use reqwest::Method;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::transport::{AuthorizedTransport, RequestParams};

pub const CONTENT_TYPE: &str = "application/x-protobuf";

/// Remote procedure exposed by the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Lookup,
    Commit,
    RunQuery,
    AllocateIds,
    BeginTransaction,
    Rollback,
}

impl Action {
    pub const ALL: [Action; 6] = [
        Action::Lookup,
        Action::Commit,
        Action::RunQuery,
        Action::AllocateIds,
        Action::BeginTransaction,
        Action::Rollback,
    ];

    /// Parse the name used in the request path
    pub fn from_name(name: &str) -> Option<Action> {
        Action::ALL.into_iter().find(|a| a.name() == name)
    }

    /// Name used in the request path
    pub fn name(&self) -> &'static str {
        match self {
            Action::Lookup => "lookup",
            Action::Commit => "commit",
            Action::RunQuery => "runQuery",
            Action::AllocateIds => "allocateIds",
            Action::BeginTransaction => "beginTransaction",
            Action::Rollback => "rollback",
        }
    }

    /// Wire message name: capitalized action plus suffix, e.g. `LookupRequest`
    pub fn message_name(&self, suffix: &str) -> String {
        let name = self.name();
        let mut out = String::with_capacity(name.len() + suffix.len());
        let mut chars = name.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
        }
        out.push_str(chars.as_str());
        out.push_str(suffix);
        out
    }
}

/// Logical request body, one variant per action
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    Lookup(proto::LookupRequest),
    Commit(proto::CommitRequest),
    RunQuery(proto::RunQueryRequest),
    AllocateIds(proto::AllocateIdsRequest),
    BeginTransaction(proto::BeginTransactionRequest),
    Rollback(proto::RollbackRequest),
}

impl Request {
    pub fn action(&self) -> Action {
        match self {
            Request::Lookup(_) => Action::Lookup,
            Request::Commit(_) => Action::Commit,
            Request::RunQuery(_) => Action::RunQuery,
            Request::AllocateIds(_) => Action::AllocateIds,
            Request::BeginTransaction(_) => Action::BeginTransaction,
            Request::Rollback(_) => Action::Rollback,
        }
    }

    pub fn encode_to_vec(&self) -> Vec<u8> {
        match self {
            Request::Lookup(m) => m.encode_to_vec(),
            Request::Commit(m) => m.encode_to_vec(),
            Request::RunQuery(m) => m.encode_to_vec(),
            Request::AllocateIds(m) => m.encode_to_vec(),
            Request::BeginTransaction(m) => m.encode_to_vec(),
            Request::Rollback(m) => m.encode_to_vec(),
        }
    }

    /// Decode a request body for the given action
    pub fn decode(action: Action, body: &[u8]) -> Result<Request> {
        Ok(match action {
            Action::Lookup => Request::Lookup(proto::LookupRequest::decode(body)?),
            Action::Commit => Request::Commit(proto::CommitRequest::decode(body)?),
            Action::RunQuery => Request::RunQuery(proto::RunQueryRequest::decode(body)?),
            Action::AllocateIds => Request::AllocateIds(proto::AllocateIdsRequest::decode(body)?),
            Action::BeginTransaction => {
                Request::BeginTransaction(proto::BeginTransactionRequest::decode(body)?)
            }
            Action::Rollback => Request::Rollback(proto::RollbackRequest::decode(body)?),
        })
    }

    /// Attach transaction framing for commits and lookups
    fn frame(&mut self, transaction: Option<&[u8]>) {
        match self {
            Request::Commit(commit) => match transaction {
                Some(tx) => {
                    commit.mode = Some(proto::commit_request::Mode::Transactional as i32);
                    commit.transaction = Some(tx.to_vec());
                }
                None => {
                    commit.mode = Some(proto::commit_request::Mode::NonTransactional as i32);
                    commit.transaction = None;
                }
            },
            Request::Lookup(lookup) => {
                if let Some(tx) = transaction {
                    lookup
                        .read_options
                        .get_or_insert_with(Default::default)
                        .transaction = Some(tx.to_vec());
                }
            }
            _ => {}
        }
    }
}

/// Decoded response body, one variant per action
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Lookup(proto::LookupResponse),
    Commit(proto::CommitResponse),
    RunQuery(proto::RunQueryResponse),
    AllocateIds(proto::AllocateIdsResponse),
    BeginTransaction(proto::BeginTransactionResponse),
    Rollback(proto::RollbackResponse),
}

impl Response {
    pub fn action(&self) -> Action {
        match self {
            Response::Lookup(_) => Action::Lookup,
            Response::Commit(_) => Action::Commit,
            Response::RunQuery(_) => Action::RunQuery,
            Response::AllocateIds(_) => Action::AllocateIds,
            Response::BeginTransaction(_) => Action::BeginTransaction,
            Response::Rollback(_) => Action::Rollback,
        }
    }

    /// Decode a response body as the message type matching `action`
    pub fn decode(action: Action, body: &[u8]) -> Result<Response> {
        Ok(match action {
            Action::Lookup => Response::Lookup(proto::LookupResponse::decode(body)?),
            Action::Commit => Response::Commit(proto::CommitResponse::decode(body)?),
            Action::RunQuery => Response::RunQuery(proto::RunQueryResponse::decode(body)?),
            Action::AllocateIds => Response::AllocateIds(proto::AllocateIdsResponse::decode(body)?),
            Action::BeginTransaction => {
                Response::BeginTransaction(proto::BeginTransactionResponse::decode(body)?)
            }
            Action::Rollback => Response::Rollback(proto::RollbackResponse::decode(body)?),
        })
    }

    pub fn encode_to_vec(&self) -> Vec<u8> {
        match self {
            Response::Lookup(m) => m.encode_to_vec(),
            Response::Commit(m) => m.encode_to_vec(),
            Response::RunQuery(m) => m.encode_to_vec(),
            Response::AllocateIds(m) => m.encode_to_vec(),
            Response::BeginTransaction(m) => m.encode_to_vec(),
            Response::Rollback(m) => m.encode_to_vec(),
        }
    }

    fn unexpected(self, expected: Action) -> ClientError {
        ClientError::UnexpectedResponse(format!(
            "expected {}, got {}",
            expected.message_name("Response"),
            self.action().message_name("Response")
        ))
    }

    pub fn into_lookup(self) -> Result<proto::LookupResponse> {
        match self {
            Response::Lookup(r) => Ok(r),
            other => Err(other.unexpected(Action::Lookup)),
        }
    }

    pub fn into_commit(self) -> Result<proto::CommitResponse> {
        match self {
            Response::Commit(r) => Ok(r),
            other => Err(other.unexpected(Action::Commit)),
        }
    }

    pub fn into_run_query(self) -> Result<proto::RunQueryResponse> {
        match self {
            Response::RunQuery(r) => Ok(r),
            other => Err(other.unexpected(Action::RunQuery)),
        }
    }

    pub fn into_allocate_ids(self) -> Result<proto::AllocateIdsResponse> {
        match self {
            Response::AllocateIds(r) => Ok(r),
            other => Err(other.unexpected(Action::AllocateIds)),
        }
    }

    pub fn into_begin_transaction(self) -> Result<proto::BeginTransactionResponse> {
        match self {
            Response::BeginTransaction(r) => Ok(r),
            other => Err(other.unexpected(Action::BeginTransaction)),
        }
    }

    pub fn into_rollback(self) -> Result<proto::RollbackResponse> {
        match self {
            Response::Rollback(r) => Ok(r),
            other => Err(other.unexpected(Action::Rollback)),
        }
    }
}

/// Stateless request dispatcher bound to a project and a transport
#[derive(Clone)]
pub struct Dispatcher {
    config: Arc<ClientConfig>,
    transport: Arc<dyn AuthorizedTransport>,
}

impl Dispatcher {
    pub fn new(config: ClientConfig, transport: Arc<dyn AuthorizedTransport>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config: Arc::new(config),
            transport,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Build the HTTP parameters for an encoded request
    fn request_params(&self, action: Action, body: Vec<u8>) -> RequestParams {
        RequestParams {
            method: Method::POST,
            host: self.config.api_host.clone(),
            path: self.config.action_path(action.name()),
            headers: vec![
                ("Content-Type".to_string(), CONTENT_TYPE.to_string()),
                ("User-Agent".to_string(), self.config.user_agent.clone()),
            ],
            body: Bytes::from(body),
        }
    }

    /// Frame, encode and send a request, returning the decoded response
    pub async fn dispatch(&self, transaction: Option<&[u8]>, mut request: Request) -> Result<Response> {
        request.frame(transaction);

        let action = request.action();
        let body = request.encode_to_vec();
        debug!(
            "Dispatching {} ({} bytes, transactional: {})",
            action.message_name("Request"),
            body.len(),
            transaction.is_some()
        );

        let params = self.request_params(action, body);
        let params = self.transport.authorize(params).await?;
        let mut response = self.transport.send(params).await?;

        let mut buf = BytesMut::new();
        while let Some(chunk) = response.body.next().await {
            buf.extend_from_slice(&chunk?);
        }

        if !response.is_success() {
            let message = String::from_utf8_lossy(&buf).into_owned();
            warn!("{} failed with status {}: {}", action.name(), response.status, message);
            return Err(ClientError::Status {
                status: response.status,
                message,
            });
        }

        debug!(
            "Received {} ({} bytes)",
            action.message_name("Response"),
            buf.len()
        );
        Response::decode(action, &buf)
    }
}
