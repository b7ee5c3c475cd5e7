use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::{Error, Result};

/// Identifier of a single path segment: a numeric id or a name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Identifier {
    Id(i64),
    Name(String),
}

impl Identifier {
    /// An identifier is usable only when it carries a non-empty value.
    pub fn is_empty(&self) -> bool {
        match self {
            Identifier::Id(id) => *id == 0,
            Identifier::Name(name) => name.is_empty(),
        }
    }
}

/// One (kind, identifier) segment of a key path
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PathElement {
    pub kind: String,
    pub id: Option<Identifier>,
}

impl PathElement {
    pub fn incomplete(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            id: None,
        }
    }

    pub fn with_name(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            id: Some(Identifier::Name(name.into())),
        }
    }

    pub fn with_id(kind: impl Into<String>, id: i64) -> Self {
        Self {
            kind: kind.into(),
            id: Some(Identifier::Id(id)),
        }
    }

    pub fn has_identifier(&self) -> bool {
        self.id.as_ref().map(|id| !id.is_empty()).unwrap_or(false)
    }
}

/// Entity key: an ordered ancestor path plus an optional namespace
///
/// Keys are built root-first:
///
/// ```
/// use dstore_core::Key;
///
/// let key = Key::with_name("Company", "acme").child_id("Employee", 42);
/// assert!(key.is_complete());
/// assert_eq!(key.to_string(), "Company:acme/Employee:#42");
///
/// let pending = Key::incomplete("Company").child_incomplete("Employee");
/// assert!(!pending.is_complete());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Key {
    pub namespace: Option<String>,
    pub path: Vec<PathElement>,
}

impl Key {
    pub fn from_path(path: Vec<PathElement>) -> Self {
        Self {
            namespace: None,
            path,
        }
    }

    pub fn incomplete(kind: impl Into<String>) -> Self {
        Self::from_path(vec![PathElement::incomplete(kind)])
    }

    pub fn with_name(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self::from_path(vec![PathElement::with_name(kind, name)])
    }

    pub fn with_id(kind: impl Into<String>, id: i64) -> Self {
        Self::from_path(vec![PathElement::with_id(kind, id)])
    }

    pub fn child_name(mut self, kind: impl Into<String>, name: impl Into<String>) -> Self {
        self.path.push(PathElement::with_name(kind, name));
        self
    }

    pub fn child_id(mut self, kind: impl Into<String>, id: i64) -> Self {
        self.path.push(PathElement::with_id(kind, id));
        self
    }

    pub fn child_incomplete(mut self, kind: impl Into<String>) -> Self {
        self.path.push(PathElement::incomplete(kind));
        self
    }

    pub fn in_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// A key is complete iff its final path segment has a non-empty identifier
    pub fn is_complete(&self) -> bool {
        self.path
            .last()
            .map(PathElement::has_identifier)
            .unwrap_or(false)
    }

    /// Kind of the final path segment
    pub fn kind(&self) -> Option<&str> {
        self.path.last().map(|e| e.kind.as_str())
    }

    pub fn id(&self) -> Option<&Identifier> {
        self.path.last().and_then(|e| e.id.as_ref())
    }

    /// Key of the parent entity, if this key has ancestors
    pub fn parent(&self) -> Option<Key> {
        if self.path.len() < 2 {
            return None;
        }
        Some(Key {
            namespace: self.namespace.clone(),
            path: self.path[..self.path.len() - 1].to_vec(),
        })
    }

    /// Parse the textual form `Kind:name/Kind:#id/Kind`.
    ///
    /// A trailing segment without `:` is incomplete.
    pub fn parse(s: &str) -> Result<Key> {
        let s = s.trim();
        if s.is_empty() {
            return Err(Error::InvalidKey("key path is empty".to_string()));
        }

        let mut path = Vec::new();
        let segments: Vec<&str> = s.split('/').collect();
        let last = segments.len() - 1;

        for (i, segment) in segments.into_iter().enumerate() {
            let element = match segment.split_once(':') {
                Some((kind, ident)) => {
                    if kind.is_empty() {
                        return Err(Error::InvalidKey(format!("empty kind in segment '{}'", segment)));
                    }
                    if ident.is_empty() {
                        return Err(Error::InvalidKey(format!(
                            "empty identifier in segment '{}'",
                            segment
                        )));
                    }
                    match ident.strip_prefix('#') {
                        Some(digits) => {
                            let id = digits.parse::<i64>().map_err(|_| {
                                Error::InvalidKey(format!("invalid numeric id '{}'", digits))
                            })?;
                            PathElement::with_id(kind, id)
                        }
                        None => PathElement::with_name(kind, ident),
                    }
                }
                None if i == last && !segment.is_empty() => PathElement::incomplete(segment),
                None => {
                    return Err(Error::InvalidKey(format!(
                        "ancestor segment '{}' has no identifier",
                        segment
                    )))
                }
            };
            path.push(element);
        }

        Ok(Key::from_path(path))
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, element) in self.path.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            match &element.id {
                Some(Identifier::Id(id)) => write!(f, "{}:#{}", element.kind, id)?,
                Some(Identifier::Name(name)) => write!(f, "{}:{}", element.kind, name)?,
                None => f.write_str(&element.kind)?,
            }
        }
        Ok(())
    }
}

/// Property map of an entity or embedded entity value
pub type PropertyMap = BTreeMap<String, Value>;

/// Typed property value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Boolean(bool),
    Integer(i64),
    Double(f64),
    Timestamp(DateTime<Utc>),
    Key(Key),
    String(String),
    Blob(Bytes),
    Entity(PropertyMap),
    List(Vec<Value>),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Double(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_key(&self) -> Option<&Key> {
        match self {
            Value::Key(k) => Some(k),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_entity(&self) -> Option<&PropertyMap> {
        match self {
            Value::Entity(m) => Some(m),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Integer(i as i64)
    }
}

impl From<f64> for Value {
    fn from(d: f64) -> Self {
        Value::Double(d)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Key> for Value {
    fn from(k: Key) -> Self {
        Value::Key(k)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(ts: DateTime<Utc>) -> Self {
        Value::Timestamp(ts)
    }
}

impl From<Bytes> for Value {
    fn from(b: Bytes) -> Self {
        Value::Blob(b)
    }
}

impl From<Vec<Value>> for Value {
    fn from(l: Vec<Value>) -> Self {
        Value::List(l)
    }
}

/// Property with explicit index control
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub name: String,
    pub value: Value,
    #[serde(default)]
    pub exclude_from_indexes: bool,
}

impl Property {
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            exclude_from_indexes: false,
        }
    }

    pub fn unindexed(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            exclude_from_indexes: true,
        }
    }
}

/// Entity property data
///
/// `Map` indexes every property; `List` carries per-property index control.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyData {
    Map(PropertyMap),
    List(Vec<Property>),
}

impl Default for PropertyData {
    fn default() -> Self {
        PropertyData::Map(PropertyMap::new())
    }
}

/// A keyed bag of named properties
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub key: Key,
    pub data: PropertyData,
}

impl Entity {
    pub fn new(key: Key, properties: PropertyMap) -> Self {
        Self {
            key,
            data: PropertyData::Map(properties),
        }
    }

    pub fn with_properties(key: Key, properties: Vec<Property>) -> Self {
        Self {
            key,
            data: PropertyData::List(properties),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        match &self.data {
            PropertyData::Map(map) => map.get(name),
            PropertyData::List(list) => list.iter().find(|p| p.name == name).map(|p| &p.value),
        }
    }

    pub fn len(&self) -> usize {
        match &self.data {
            PropertyData::Map(map) => map.len(),
            PropertyData::List(list) => list.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_key_completeness() {
        assert!(Key::with_name("Company", "acme").is_complete());
        assert!(Key::with_id("Company", 7).is_complete());
        assert!(!Key::incomplete("Company").is_complete());
        assert!(!Key::with_name("Company", "").is_complete());
        assert!(!Key::with_id("Company", 0).is_complete());
        assert!(!Key::from_path(vec![]).is_complete());

        // Only the final segment matters
        let key = Key::with_name("Company", "acme").child_incomplete("Employee");
        assert!(!key.is_complete());
    }

    #[test]
    fn test_key_parse() {
        let key = Key::parse("Company:acme/Employee:#42").unwrap();
        assert_eq!(key.path.len(), 2);
        assert_eq!(key.path[0], PathElement::with_name("Company", "acme"));
        assert_eq!(key.path[1], PathElement::with_id("Employee", 42));

        let key = Key::parse("Company:acme/Employee").unwrap();
        assert!(!key.is_complete());
        assert_eq!(key.kind(), Some("Employee"));

        assert!(Key::parse("").is_err());
        assert!(Key::parse("Company/Employee:1").is_err());
        assert!(Key::parse("Company:#abc").is_err());
        assert!(Key::parse(":name").is_err());
    }

    #[test]
    fn test_key_parse_rejects_empty_identifier() {
        for text in ["Task:", "Company:/Employee:#1", "Company:acme/Employee:", "Task:#"] {
            let err = Key::parse(text).unwrap_err();
            assert!(matches!(err, Error::InvalidKey(_)), "{} should be rejected", text);
        }
    }

    #[test]
    fn test_key_parent() {
        let key = Key::with_name("Company", "acme")
            .child_id("Employee", 1)
            .in_namespace("ns");
        let parent = key.parent().unwrap();
        assert_eq!(parent.path, vec![PathElement::with_name("Company", "acme")]);
        assert_eq!(parent.namespace.as_deref(), Some("ns"));
        assert!(parent.parent().is_none());
    }

    #[test]
    fn test_entity_get() {
        let mut map = PropertyMap::new();
        map.insert("name".to_string(), Value::from("Alice"));
        let entity = Entity::new(Key::with_id("User", 1), map);
        assert_eq!(entity.get("name").and_then(Value::as_str), Some("Alice"));
        assert!(entity.get("age").is_none());

        let entity = Entity::with_properties(
            Key::with_id("User", 1),
            vec![Property::new("age", 30), Property::unindexed("bio", "long text")],
        );
        assert_eq!(entity.get("age").and_then(Value::as_i64), Some(30));
        assert_eq!(entity.len(), 2);
    }

    #[test]
    fn test_value_json() {
        let value = Value::List(vec![Value::from(1), Value::from("a"), Value::Null]);
        let json = serde_json::to_string(&value).unwrap();
        let back: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value, back);
    }

    fn segment() -> impl Strategy<Value = PathElement> {
        prop_oneof![
            ("[A-Z][a-z]{0,8}", 1i64..i64::MAX).prop_map(|(k, id)| PathElement::with_id(k, id)),
            ("[A-Z][a-z]{0,8}", "[a-z0-9]{1,12}").prop_map(|(k, n)| PathElement::with_name(k, n)),
        ]
    }

    proptest! {
        #[test]
        fn prop_display_parse(path in prop::collection::vec(segment(), 1..5)) {
            let key = Key::from_path(path);
            let parsed = Key::parse(&key.to_string()).unwrap();
            prop_assert_eq!(parsed, key);
        }

        #[test]
        fn prop_incomplete_leaf(path in prop::collection::vec(segment(), 0..4), kind in "[A-Z][a-z]{0,8}") {
            let key = Key::from_path(path).child_incomplete(kind);
            prop_assert!(!key.is_complete());
        }
    }
}
