/// JSON conversion for entities on the command line
use anyhow::{bail, Context, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use dstore_core::{Entity, PropertyData, PropertyMap, Value};

/// Parse a JSON object into a property map
pub fn json_to_properties(json: &serde_json::Value) -> Result<PropertyMap> {
    let obj = json.as_object().context("Entity must be a JSON object")?;

    let mut properties = PropertyMap::new();
    for (name, value) in obj {
        properties.insert(name.clone(), json_to_value(value)?);
    }
    Ok(properties)
}

pub fn json_to_value(value: &serde_json::Value) -> Result<Value> {
    Ok(match value {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Boolean(*b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Integer(i)
            } else if let Some(f) = n.as_f64() {
                Value::Double(f)
            } else {
                bail!("Number out of range: {}", n)
            }
        }
        serde_json::Value::String(s) => Value::String(s.clone()),
        serde_json::Value::Array(items) => {
            Value::List(items.iter().map(json_to_value).collect::<Result<_>>()?)
        }
        serde_json::Value::Object(_) => Value::Entity(json_to_properties(value)?),
    })
}

/// Parse a filter operand: JSON if it parses, otherwise a plain string
pub fn parse_operand(text: &str) -> Result<Value> {
    match serde_json::from_str::<serde_json::Value>(text) {
        Ok(json) => json_to_value(&json),
        Err(_) => Ok(Value::String(text.to_string())),
    }
}

pub fn entity_to_json(entity: &Entity) -> serde_json::Value {
    let mut properties = serde_json::Map::new();
    match &entity.data {
        PropertyData::Map(map) => {
            for (name, value) in map {
                properties.insert(name.clone(), value_to_json(value));
            }
        }
        PropertyData::List(list) => {
            for property in list {
                properties.insert(property.name.clone(), value_to_json(&property.value));
            }
        }
    }

    serde_json::json!({
        "key": entity.key.to_string(),
        "properties": properties,
    })
}

pub fn value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Boolean(b) => serde_json::Value::Bool(*b),
        Value::Integer(i) => serde_json::Value::Number((*i).into()),
        Value::Double(f) => serde_json::Number::from_f64(*f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Value::Timestamp(ts) => serde_json::Value::String(ts.to_rfc3339()),
        Value::Key(key) => serde_json::Value::String(key.to_string()),
        Value::String(s) => serde_json::Value::String(s.clone()),
        // Blobs are rendered as base64
        Value::Blob(bytes) => serde_json::Value::String(BASE64.encode(bytes)),
        Value::Entity(map) => serde_json::Value::Object(
            map.iter()
                .map(|(name, value)| (name.clone(), value_to_json(value)))
                .collect(),
        ),
        Value::List(items) => serde_json::Value::Array(items.iter().map(value_to_json).collect()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dstore_core::{Bytes, Key};

    #[test]
    fn test_json_to_properties() {
        let json = serde_json::json!({
            "title": "write docs",
            "priority": 3,
            "ratio": 0.5,
            "tags": ["a", "b"],
            "meta": {"done": false},
            "note": null,
        });
        let props = json_to_properties(&json).unwrap();
        assert_eq!(props["title"], Value::from("write docs"));
        assert_eq!(props["priority"], Value::Integer(3));
        assert_eq!(props["ratio"], Value::Double(0.5));
        assert_eq!(
            props["tags"],
            Value::List(vec![Value::from("a"), Value::from("b")])
        );
        assert!(matches!(props["meta"], Value::Entity(_)));
        assert_eq!(props["note"], Value::Null);
    }

    #[test]
    fn test_non_object_rejected() {
        assert!(json_to_properties(&serde_json::json!([1, 2])).is_err());
    }

    #[test]
    fn test_parse_operand() {
        assert_eq!(parse_operand("42").unwrap(), Value::Integer(42));
        assert_eq!(parse_operand("true").unwrap(), Value::Boolean(true));
        assert_eq!(parse_operand("\"x\"").unwrap(), Value::from("x"));
        assert_eq!(parse_operand("plain").unwrap(), Value::from("plain"));
    }

    #[test]
    fn test_entity_to_json() {
        let mut props = PropertyMap::new();
        props.insert("count".to_string(), Value::Integer(2));
        props.insert("blob".to_string(), Value::Blob(Bytes::from_static(b"hi")));
        let entity = Entity::new(Key::with_name("Task", "a").child_id("Note", 4), props);

        let json = entity_to_json(&entity);
        assert_eq!(json["key"], "Task:a/Note:#4");
        assert_eq!(json["properties"]["count"], 2);
        assert_eq!(json["properties"]["blob"], "aGk=");
    }
}
