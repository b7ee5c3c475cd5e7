/// Type conversions between wire messages and dstore domain types
///
/// All functions are pure. Due to Rust's orphan rules, we use conversion
/// functions instead of trait implementations.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use bytes::Bytes;
use chrono::{DateTime, TimeZone, Utc};
use dstore_core::{
    Direction, Entity, Filter, Identifier, Key, Operator, PathElement, Property, PropertyData,
    PropertyMap, Query, Value,
};
use dstore_proto as proto;

use crate::error::{ClientError, Result};

// ============================================================================
// Key Conversions
// ============================================================================

/// Partition for a namespace, or None for the default namespace
pub fn partition_for(namespace: Option<&str>) -> Option<proto::PartitionId> {
    namespace.map(|ns| proto::PartitionId {
        dataset_id: None,
        namespace: Some(ns.to_string()),
    })
}

/// Convert a domain Key to its wire form
pub fn key_to_proto(key: &Key) -> proto::Key {
    let path_element = key
        .path
        .iter()
        .map(|element| {
            let (id, name) = match &element.id {
                Some(Identifier::Id(id)) => (Some(*id), None),
                Some(Identifier::Name(name)) => (None, Some(name.clone())),
                None => (None, None),
            };
            proto::key::PathElement {
                kind: element.kind.clone(),
                id,
                name,
            }
        })
        .collect();

    proto::Key {
        partition_id: partition_for(key.namespace.as_deref()),
        path_element,
    }
}

/// Convert a wire Key to a domain Key
pub fn key_from_proto(key: proto::Key) -> Key {
    let path = key
        .path_element
        .into_iter()
        .map(|element| {
            let id = match (element.id, element.name) {
                (Some(id), _) => Some(Identifier::Id(id)),
                (None, Some(name)) => Some(Identifier::Name(name)),
                (None, None) => None,
            };
            PathElement {
                kind: element.kind,
                id,
            }
        })
        .collect();

    Key {
        namespace: key.partition_id.and_then(|p| p.namespace),
        path,
    }
}

// ============================================================================
// Value Conversions
// ============================================================================

/// Convert a domain Value to its wire form
pub fn value_to_proto(value: &Value) -> proto::Value {
    let mut out = proto::Value::default();
    match value {
        Value::Null => {}
        Value::Boolean(b) => out.boolean_value = Some(*b),
        Value::Integer(i) => out.integer_value = Some(*i),
        Value::Double(d) => out.double_value = Some(*d),
        Value::Timestamp(ts) => out.timestamp_microseconds_value = Some(ts.timestamp_micros()),
        Value::Key(k) => out.key_value = Some(key_to_proto(k)),
        Value::String(s) => out.string_value = Some(s.clone()),
        Value::Blob(b) => out.blob_value = Some(b.to_vec()),
        Value::Entity(map) => {
            out.entity_value = Some(proto::Entity {
                key: None,
                property: map
                    .iter()
                    .map(|(name, value)| value_to_property(name, value))
                    .collect(),
            })
        }
        Value::List(items) => out.list_value = items.iter().map(value_to_proto).collect(),
    }
    out
}

/// Convert a wire Value to a domain Value; a value with no field set is null
pub fn value_from_proto(value: proto::Value) -> Result<Value> {
    if let Some(b) = value.boolean_value {
        return Ok(Value::Boolean(b));
    }
    if let Some(i) = value.integer_value {
        return Ok(Value::Integer(i));
    }
    if let Some(d) = value.double_value {
        return Ok(Value::Double(d));
    }
    if let Some(micros) = value.timestamp_microseconds_value {
        return Ok(Value::Timestamp(timestamp_from_micros(micros)?));
    }
    if let Some(key) = value.key_value {
        return Ok(Value::Key(key_from_proto(key)));
    }
    if let Some(s) = value.string_value {
        return Ok(Value::String(s));
    }
    if let Some(s) = value.blob_key_value {
        return Ok(Value::String(s));
    }
    if let Some(b) = value.blob_value {
        return Ok(Value::Blob(Bytes::from(b)));
    }
    if let Some(entity) = value.entity_value {
        return Ok(Value::Entity(properties_from_proto(entity.property)?));
    }
    if !value.list_value.is_empty() {
        let items: Result<Vec<Value>> = value.list_value.into_iter().map(value_from_proto).collect();
        return Ok(Value::List(items?));
    }
    Ok(Value::Null)
}

fn timestamp_from_micros(micros: i64) -> Result<DateTime<Utc>> {
    let secs = micros.div_euclid(1_000_000);
    let nanos = (micros.rem_euclid(1_000_000) * 1_000) as u32;
    Utc.timestamp_opt(secs, nanos).single().ok_or_else(|| {
        ClientError::UnexpectedResponse(format!("timestamp out of range: {}us", micros))
    })
}

/// Named wire property for a value, indexed by default
pub fn value_to_property(name: &str, value: &Value) -> proto::Property {
    proto::Property {
        name: name.to_string(),
        value: Some(value_to_proto(value)),
    }
}

fn properties_from_proto(properties: Vec<proto::Property>) -> Result<PropertyMap> {
    let mut map = PropertyMap::new();
    for property in properties {
        let value = match property.value {
            Some(v) => value_from_proto(v)?,
            None => Value::Null,
        };
        map.insert(property.name, value);
    }
    Ok(map)
}

// ============================================================================
// Entity Conversions
// ============================================================================

/// Generic converter: every property of a plain map is indexed
pub fn entity_to_proto(key: &Key, properties: &PropertyMap) -> proto::Entity {
    proto::Entity {
        key: Some(key_to_proto(key)),
        property: properties
            .iter()
            .map(|(name, value)| value_to_property(name, value))
            .collect(),
    }
}

/// Explicit property list: `exclude_from_indexes` is the negation of `indexed`
pub fn property_list_to_proto(key: &Key, properties: &[Property]) -> proto::Entity {
    proto::Entity {
        key: Some(key_to_proto(key)),
        property: properties
            .iter()
            .map(|p| {
                let mut value = value_to_proto(&p.value);
                value.indexed = Some(!p.exclude_from_indexes);
                proto::Property {
                    name: p.name.clone(),
                    value: Some(value),
                }
            })
            .collect(),
    }
}

/// Encode an entity according to the shape of its property data
pub fn entity_data_to_proto(entity: &Entity) -> proto::Entity {
    match &entity.data {
        PropertyData::Map(map) => entity_to_proto(&entity.key, map),
        PropertyData::List(list) => property_list_to_proto(&entity.key, list),
    }
}

/// Convert a wire entity to a domain Entity
pub fn entity_from_proto(entity: proto::Entity) -> Result<Entity> {
    let key = entity
        .key
        .ok_or_else(|| ClientError::UnexpectedResponse("entity without key".to_string()))?;
    Ok(Entity::new(key_from_proto(key), properties_from_proto(entity.property)?))
}

/// Convert a wire result list to domain entities, preserving order
pub fn entities_from_results(results: Vec<proto::EntityResult>) -> Result<Vec<Entity>> {
    results
        .into_iter()
        .filter_map(|r| r.entity)
        .map(entity_from_proto)
        .collect()
}

// ============================================================================
// Query Conversions
// ============================================================================

/// Encode raw cursor bytes as the caller-facing base64 string
pub fn cursor_to_string(cursor: &[u8]) -> String {
    BASE64.encode(cursor)
}

pub fn cursor_from_string(cursor: &str) -> Result<Vec<u8>> {
    BASE64
        .decode(cursor)
        .map_err(|e| ClientError::InvalidArgument(format!("Invalid cursor '{}': {}", cursor, e)))
}

fn operator_to_proto(op: Operator) -> proto::property_filter::Operator {
    use proto::property_filter::Operator as P;
    match op {
        Operator::Equal => P::Equal,
        Operator::LessThan => P::LessThan,
        Operator::LessThanOrEqual => P::LessThanOrEqual,
        Operator::GreaterThan => P::GreaterThan,
        Operator::GreaterThanOrEqual => P::GreaterThanOrEqual,
        Operator::HasAncestor => P::HasAncestor,
    }
}

fn filter_to_proto(filter: &Filter) -> proto::Filter {
    proto::Filter {
        composite_filter: None,
        property_filter: Some(proto::PropertyFilter {
            property: Some(proto::PropertyReference {
                name: filter.property.clone(),
            }),
            operator: Some(operator_to_proto(filter.operator) as i32),
            value: Some(value_to_proto(&filter.value)),
        }),
    }
}

fn clamp_i32(n: u32) -> i32 {
    i32::try_from(n).unwrap_or(i32::MAX)
}

/// Convert a domain Query to its wire form
pub fn query_to_proto(query: &Query) -> Result<proto::Query> {
    let filter = match query.filters.as_slice() {
        [] => None,
        [single] => Some(filter_to_proto(single)),
        many => Some(proto::Filter {
            composite_filter: Some(proto::CompositeFilter {
                operator: Some(proto::composite_filter::Operator::And as i32),
                filter: many.iter().map(filter_to_proto).collect(),
            }),
            property_filter: None,
        }),
    };

    let start_cursor = query
        .start_cursor
        .as_deref()
        .map(cursor_from_string)
        .transpose()?;
    let end_cursor = query
        .end_cursor
        .as_deref()
        .map(cursor_from_string)
        .transpose()?;

    Ok(proto::Query {
        projection: query
            .select
            .iter()
            .map(|name| proto::PropertyExpression {
                property: Some(proto::PropertyReference { name: name.clone() }),
                aggregation_function: None,
            })
            .collect(),
        kind: query
            .kinds
            .iter()
            .map(|name| proto::KindExpression { name: name.clone() })
            .collect(),
        filter,
        order: query
            .orders
            .iter()
            .map(|order| proto::PropertyOrder {
                property: Some(proto::PropertyReference {
                    name: order.property.clone(),
                }),
                direction: Some(match order.direction {
                    Direction::Ascending => proto::property_order::Direction::Ascending as i32,
                    Direction::Descending => proto::property_order::Direction::Descending as i32,
                }),
            })
            .collect(),
        group_by: query
            .group_by
            .iter()
            .map(|name| proto::PropertyReference { name: name.clone() })
            .collect(),
        start_cursor,
        end_cursor,
        offset: query.offset.map(clamp_i32),
        limit: query.limit.map(clamp_i32),
    })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_with_namespace() {
        let key = Key::with_name("Company", "acme")
            .child_id("Employee", 7)
            .in_namespace("tenant");
        let wire = key_to_proto(&key);
        assert_eq!(wire.path_element.len(), 2);
        assert_eq!(wire.path_element[0].name.as_deref(), Some("acme"));
        assert_eq!(wire.path_element[1].id, Some(7));
        assert_eq!(
            wire.partition_id.as_ref().and_then(|p| p.namespace.as_deref()),
            Some("tenant")
        );
        assert_eq!(key_from_proto(wire), key);
    }

    #[test]
    fn test_incomplete_key() {
        let key = Key::incomplete("Task");
        let wire = key_to_proto(&key);
        assert!(wire.partition_id.is_none());
        assert_eq!(wire.path_element[0].id, None);
        assert_eq!(wire.path_element[0].name, None);
        assert!(!key_from_proto(wire).is_complete());
    }

    #[test]
    fn test_nested_values() {
        let mut inner = PropertyMap::new();
        inner.insert("city".to_string(), Value::from("Oslo"));
        let value = Value::List(vec![
            Value::Entity(inner),
            Value::Key(Key::with_id("User", 1)),
            Value::Blob(Bytes::from_static(b"\x00\x01")),
            Value::Null,
        ]);
        let converted = value_from_proto(value_to_proto(&value)).unwrap();
        assert_eq!(converted, value);
    }

    #[test]
    fn test_timestamp_precision() {
        let ts = Utc.timestamp_opt(1_600_000_000, 123_456_000).unwrap();
        let wire = value_to_proto(&Value::Timestamp(ts));
        assert_eq!(wire.timestamp_microseconds_value, Some(1_600_000_000_123_456));
        assert_eq!(value_from_proto(wire).unwrap(), Value::Timestamp(ts));

        let before_epoch = Utc.timestamp_opt(-2, 500_000_000).unwrap();
        let wire = value_to_proto(&Value::Timestamp(before_epoch));
        assert_eq!(value_from_proto(wire).unwrap(), Value::Timestamp(before_epoch));
    }

    #[test]
    fn test_property_list_index_flags() {
        let key = Key::with_id("Post", 1);
        let entity = property_list_to_proto(
            &key,
            &[Property::new("title", "Hello"), Property::unindexed("body", "...")],
        );
        assert_eq!(entity.property[0].name, "title");
        assert_eq!(entity.property[0].value.as_ref().unwrap().indexed, Some(true));
        assert_eq!(entity.property[1].value.as_ref().unwrap().indexed, Some(false));
    }

    #[test]
    fn test_plain_map_leaves_index_default() {
        let mut map = PropertyMap::new();
        map.insert("title".to_string(), Value::from("Hello"));
        let entity = entity_to_proto(&Key::with_id("Post", 1), &map);
        assert_eq!(entity.property[0].value.as_ref().unwrap().indexed, None);
    }

    #[test]
    fn test_entity_without_key_rejected() {
        let result = entity_from_proto(proto::Entity::default());
        assert!(matches!(result, Err(ClientError::UnexpectedResponse(_))));
    }

    #[test]
    fn test_query_to_proto() {
        let cursor = cursor_to_string(b"page-2");
        let query = Query::new("Task")
            .filter("done", Operator::Equal, false)
            .filter("priority", Operator::GreaterThan, 3)
            .order("-created")
            .select(&["title"])
            .start(cursor)
            .offset(0)
            .limit(25);

        let wire = query_to_proto(&query).unwrap();
        assert_eq!(wire.kind[0].name, "Task");
        let composite = wire.filter.unwrap().composite_filter.unwrap();
        assert_eq!(composite.filter.len(), 2);
        assert_eq!(
            wire.order[0].direction,
            Some(proto::property_order::Direction::Descending as i32)
        );
        assert_eq!(wire.projection[0].property.as_ref().unwrap().name, "title");
        assert_eq!(wire.start_cursor.as_deref(), Some(&b"page-2"[..]));
        assert_eq!(wire.offset, Some(0));
        assert_eq!(wire.limit, Some(25));
    }

    #[test]
    fn test_invalid_cursor() {
        let query = Query::new("Task").start("***not base64***");
        assert!(matches!(
            query_to_proto(&query),
            Err(ClientError::InvalidArgument(_))
        ));
    }
}
