/// Table formatting for entities using comfy-table

use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};
use dstore_core::{Entity, Key, PropertyData, Value};
use std::collections::BTreeSet;

/// Format a list of entities as a table
///
/// The first column is the key; every property name seen across the
/// entities becomes a further column, sorted alphabetically.
pub fn format_entities_table(entities: &[Entity]) -> String {
    if entities.is_empty() {
        return "No entities found".to_string();
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    let mut columns = BTreeSet::new();
    for entity in entities {
        columns.extend(property_names(entity));
    }

    let mut header = vec![Cell::new("__key__")];
    header.extend(columns.iter().map(Cell::new));
    table.set_header(header);

    for entity in entities {
        let mut row = vec![Cell::new(entity.key.to_string())];
        row.extend(columns.iter().map(|col| match entity.get(col) {
            Some(value) => Cell::new(format_value(value)),
            None => Cell::new("-"),
        }));
        table.add_row(row);
    }

    table.to_string()
}

/// Format allocated keys, one per row
pub fn format_keys_table(keys: &[Key]) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec![Cell::new("key")]);
    for key in keys {
        table.add_row(vec![Cell::new(key.to_string())]);
    }
    table.to_string()
}

fn property_names(entity: &Entity) -> Vec<String> {
    match &entity.data {
        PropertyData::Map(map) => map.keys().cloned().collect(),
        PropertyData::List(list) => list.iter().map(|p| p.name.clone()).collect(),
    }
}

/// Format a value for display in a table cell
fn format_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Boolean(b) => b.to_string(),
        Value::Integer(i) => i.to_string(),
        Value::Double(f) => f.to_string(),
        Value::Timestamp(ts) => ts.to_rfc3339(),
        Value::Key(key) => key.to_string(),
        Value::String(s) => s.clone(),
        Value::Blob(bytes) => format!("<Binary {} bytes>", bytes.len()),
        Value::List(items) => {
            let items: Vec<String> = items.iter().map(format_value).collect();
            format!("[{}]", items.join(", "))
        }
        Value::Entity(map) => {
            let pairs: Vec<String> = map
                .iter()
                .map(|(k, v)| format!("\"{}\": {}", k, format_value(v)))
                .collect();
            format!("{{{}}}", pairs.join(", "))
        }
    }
}
