/// Query builder for kind queries
///
/// The builder only records what was asked for; conversion to the wire
/// form happens in the client's codec.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::{Error, Key, Value};

/// Property filter operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    Equal,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    HasAncestor,
}

impl FromStr for Operator {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "=" => Ok(Operator::Equal),
            "<" => Ok(Operator::LessThan),
            "<=" => Ok(Operator::LessThanOrEqual),
            ">" => Ok(Operator::GreaterThan),
            ">=" => Ok(Operator::GreaterThanOrEqual),
            "HAS_ANCESTOR" => Ok(Operator::HasAncestor),
            other => Err(Error::InvalidQuery(format!("unknown operator '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub property: String,
    pub operator: Operator,
    pub value: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub property: String,
    pub direction: Direction,
}

/// Query builder
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub namespace: Option<String>,
    pub kinds: Vec<String>,
    pub filters: Vec<Filter>,
    pub orders: Vec<Order>,
    pub group_by: Vec<String>,
    pub select: Vec<String>,
    pub start_cursor: Option<String>,
    pub end_cursor: Option<String>,
    pub offset: Option<u32>,
    pub limit: Option<u32>,
}

impl Query {
    /// Create a new query over a kind
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kinds: vec![kind.into()],
            ..Default::default()
        }
    }

    /// Scope the query to a namespace
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Add a property filter
    pub fn filter(mut self, property: impl Into<String>, operator: Operator, value: impl Into<Value>) -> Self {
        self.filters.push(Filter {
            property: property.into(),
            operator,
            value: value.into(),
        });
        self
    }

    /// Restrict results to descendants of `ancestor`
    pub fn has_ancestor(mut self, ancestor: Key) -> Self {
        self.filters.push(Filter {
            property: "__key__".to_string(),
            operator: Operator::HasAncestor,
            value: Value::Key(ancestor),
        });
        self
    }

    /// Sort by a property; a leading `-` sorts descending
    pub fn order(mut self, property: &str) -> Self {
        let (property, direction) = match property.strip_prefix('-') {
            Some(p) => (p, Direction::Descending),
            None => (property, Direction::Ascending),
        };
        self.orders.push(Order {
            property: property.to_string(),
            direction,
        });
        self
    }

    pub fn group_by(mut self, properties: &[&str]) -> Self {
        self.group_by = properties.iter().map(|p| p.to_string()).collect();
        self
    }

    /// Project the result onto the given properties
    pub fn select(mut self, properties: &[&str]) -> Self {
        self.select = properties.iter().map(|p| p.to_string()).collect();
        self
    }

    /// Resume from a cursor returned by a previous page
    pub fn start(mut self, cursor: impl Into<String>) -> Self {
        self.start_cursor = Some(cursor.into());
        self
    }

    pub fn end(mut self, cursor: impl Into<String>) -> Self {
        self.end_cursor = Some(cursor.into());
        self
    }

    pub fn offset(mut self, offset: u32) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Set the maximum number of results
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }
}
