/// Protocol Buffers messages for the dstore wire protocol
///
/// Every RPC is an HTTP POST whose body is a binary `<Action>Request`
/// message and whose response body is the matching `<Action>Response`.
/// Field numbers follow the `datastore.v1beta2` schema.

// ============================================================================
// Keys
// ============================================================================

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PartitionId {
    #[prost(string, optional, tag = "3")]
    pub dataset_id: Option<String>,
    #[prost(string, optional, tag = "4")]
    pub namespace: Option<String>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Key {
    #[prost(message, optional, tag = "1")]
    pub partition_id: Option<PartitionId>,
    #[prost(message, repeated, tag = "2")]
    pub path_element: Vec<key::PathElement>,
}

pub mod key {
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct PathElement {
        #[prost(string, required, tag = "1")]
        pub kind: String,
        #[prost(int64, optional, tag = "2")]
        pub id: Option<i64>,
        #[prost(string, optional, tag = "3")]
        pub name: Option<String>,
    }
}

// ============================================================================
// Values and entities
// ============================================================================

/// A property value; at most one of the `*_value` fields is set, none for null
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Value {
    #[prost(bool, optional, tag = "1")]
    pub boolean_value: Option<bool>,
    #[prost(int64, optional, tag = "2")]
    pub integer_value: Option<i64>,
    #[prost(double, optional, tag = "3")]
    pub double_value: Option<f64>,
    #[prost(int64, optional, tag = "4")]
    pub timestamp_microseconds_value: Option<i64>,
    #[prost(message, optional, tag = "5")]
    pub key_value: Option<Key>,
    #[prost(string, optional, tag = "16")]
    pub blob_key_value: Option<String>,
    #[prost(string, optional, tag = "17")]
    pub string_value: Option<String>,
    #[prost(bytes = "vec", optional, tag = "18")]
    pub blob_value: Option<Vec<u8>>,
    #[prost(message, optional, tag = "6")]
    pub entity_value: Option<Entity>,
    #[prost(message, repeated, tag = "7")]
    pub list_value: Vec<Value>,
    #[prost(int32, optional, tag = "14")]
    pub meaning: Option<i32>,
    /// Absent means indexed
    #[prost(bool, optional, tag = "15")]
    pub indexed: Option<bool>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Property {
    #[prost(string, required, tag = "1")]
    pub name: String,
    #[prost(message, optional, tag = "4")]
    pub value: Option<Value>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Entity {
    #[prost(message, optional, tag = "1")]
    pub key: Option<Key>,
    #[prost(message, repeated, tag = "2")]
    pub property: Vec<Property>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct EntityResult {
    #[prost(message, optional, tag = "1")]
    pub entity: Option<Entity>,
}

pub mod entity_result {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
    #[repr(i32)]
    pub enum ResultType {
        Full = 1,
        Projection = 2,
        KeyOnly = 3,
    }
}

// ============================================================================
// Queries
// ============================================================================

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Query {
    #[prost(message, repeated, tag = "2")]
    pub projection: Vec<PropertyExpression>,
    #[prost(message, repeated, tag = "3")]
    pub kind: Vec<KindExpression>,
    #[prost(message, optional, tag = "4")]
    pub filter: Option<Filter>,
    #[prost(message, repeated, tag = "5")]
    pub order: Vec<PropertyOrder>,
    #[prost(message, repeated, tag = "6")]
    pub group_by: Vec<PropertyReference>,
    #[prost(bytes = "vec", optional, tag = "7")]
    pub start_cursor: Option<Vec<u8>>,
    #[prost(bytes = "vec", optional, tag = "8")]
    pub end_cursor: Option<Vec<u8>>,
    #[prost(int32, optional, tag = "10")]
    pub offset: Option<i32>,
    #[prost(int32, optional, tag = "11")]
    pub limit: Option<i32>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct KindExpression {
    #[prost(string, required, tag = "1")]
    pub name: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PropertyReference {
    #[prost(string, required, tag = "2")]
    pub name: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PropertyExpression {
    #[prost(message, optional, tag = "1")]
    pub property: Option<PropertyReference>,
    #[prost(enumeration = "property_expression::AggregationFunction", optional, tag = "2")]
    pub aggregation_function: Option<i32>,
}

pub mod property_expression {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
    #[repr(i32)]
    pub enum AggregationFunction {
        First = 1,
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PropertyOrder {
    #[prost(message, optional, tag = "1")]
    pub property: Option<PropertyReference>,
    #[prost(enumeration = "property_order::Direction", optional, tag = "2")]
    pub direction: Option<i32>,
}

pub mod property_order {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
    #[repr(i32)]
    pub enum Direction {
        Ascending = 1,
        Descending = 2,
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Filter {
    #[prost(message, optional, tag = "1")]
    pub composite_filter: Option<CompositeFilter>,
    #[prost(message, optional, tag = "2")]
    pub property_filter: Option<PropertyFilter>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CompositeFilter {
    #[prost(enumeration = "composite_filter::Operator", optional, tag = "1")]
    pub operator: Option<i32>,
    #[prost(message, repeated, tag = "2")]
    pub filter: Vec<Filter>,
}

pub mod composite_filter {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
    #[repr(i32)]
    pub enum Operator {
        And = 1,
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PropertyFilter {
    #[prost(message, optional, tag = "1")]
    pub property: Option<PropertyReference>,
    #[prost(enumeration = "property_filter::Operator", optional, tag = "2")]
    pub operator: Option<i32>,
    #[prost(message, optional, tag = "3")]
    pub value: Option<Value>,
}

pub mod property_filter {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
    #[repr(i32)]
    pub enum Operator {
        LessThan = 1,
        LessThanOrEqual = 2,
        GreaterThan = 3,
        GreaterThanOrEqual = 4,
        Equal = 5,
        HasAncestor = 11,
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct QueryResultBatch {
    #[prost(enumeration = "entity_result::ResultType", optional, tag = "1")]
    pub entity_result_type: Option<i32>,
    #[prost(message, repeated, tag = "2")]
    pub entity_result: Vec<EntityResult>,
    #[prost(bytes = "vec", optional, tag = "4")]
    pub end_cursor: Option<Vec<u8>>,
    #[prost(enumeration = "query_result_batch::MoreResultsType", optional, tag = "5")]
    pub more_results: Option<i32>,
    #[prost(int32, optional, tag = "6")]
    pub skipped_results: Option<i32>,
}

pub mod query_result_batch {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
    #[repr(i32)]
    pub enum MoreResultsType {
        NotFinished = 1,
        MoreResultsAfterLimit = 2,
        NoMoreResults = 3,
    }
}

// ============================================================================
// Mutations
// ============================================================================

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Mutation {
    #[prost(message, repeated, tag = "1")]
    pub upsert: Vec<Entity>,
    #[prost(message, repeated, tag = "2")]
    pub update: Vec<Entity>,
    #[prost(message, repeated, tag = "3")]
    pub insert: Vec<Entity>,
    #[prost(message, repeated, tag = "4")]
    pub insert_auto_id: Vec<Entity>,
    #[prost(message, repeated, tag = "5")]
    pub delete: Vec<Key>,
    #[prost(bool, optional, tag = "6")]
    pub force: Option<bool>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MutationResult {
    #[prost(int32, optional, tag = "1")]
    pub index_updates: Option<i32>,
    #[prost(message, repeated, tag = "2")]
    pub insert_auto_id_key: Vec<Key>,
}

// ============================================================================
// RPC messages
// ============================================================================

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ReadOptions {
    #[prost(enumeration = "read_options::ReadConsistency", optional, tag = "1")]
    pub read_consistency: Option<i32>,
    #[prost(bytes = "vec", optional, tag = "2")]
    pub transaction: Option<Vec<u8>>,
}

pub mod read_options {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
    #[repr(i32)]
    pub enum ReadConsistency {
        Default = 0,
        Strong = 1,
        Eventual = 2,
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct LookupRequest {
    #[prost(message, optional, tag = "1")]
    pub read_options: Option<ReadOptions>,
    #[prost(message, repeated, tag = "3")]
    pub key: Vec<Key>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct LookupResponse {
    #[prost(message, repeated, tag = "1")]
    pub found: Vec<EntityResult>,
    #[prost(message, repeated, tag = "2")]
    pub missing: Vec<EntityResult>,
    #[prost(message, repeated, tag = "3")]
    pub deferred: Vec<Key>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RunQueryRequest {
    #[prost(message, optional, tag = "1")]
    pub read_options: Option<ReadOptions>,
    #[prost(message, optional, tag = "2")]
    pub partition_id: Option<PartitionId>,
    #[prost(message, optional, tag = "3")]
    pub query: Option<Query>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RunQueryResponse {
    #[prost(message, optional, tag = "1")]
    pub batch: Option<QueryResultBatch>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct BeginTransactionRequest {
    #[prost(enumeration = "begin_transaction_request::IsolationLevel", optional, tag = "1")]
    pub isolation_level: Option<i32>,
}

pub mod begin_transaction_request {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
    #[repr(i32)]
    pub enum IsolationLevel {
        Snapshot = 0,
        Serializable = 1,
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct BeginTransactionResponse {
    #[prost(bytes = "vec", optional, tag = "1")]
    pub transaction: Option<Vec<u8>>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RollbackRequest {
    #[prost(bytes = "vec", optional, tag = "1")]
    pub transaction: Option<Vec<u8>>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RollbackResponse {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CommitRequest {
    #[prost(bytes = "vec", optional, tag = "1")]
    pub transaction: Option<Vec<u8>>,
    #[prost(message, optional, tag = "5")]
    pub mutation: Option<Mutation>,
    #[prost(enumeration = "commit_request::Mode", optional, tag = "6")]
    pub mode: Option<i32>,
}

pub mod commit_request {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
    #[repr(i32)]
    pub enum Mode {
        Transactional = 1,
        NonTransactional = 2,
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CommitResponse {
    #[prost(message, optional, tag = "1")]
    pub mutation_result: Option<MutationResult>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AllocateIdsRequest {
    #[prost(message, repeated, tag = "1")]
    pub key: Vec<Key>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AllocateIdsResponse {
    #[prost(message, repeated, tag = "1")]
    pub key: Vec<Key>,
}
