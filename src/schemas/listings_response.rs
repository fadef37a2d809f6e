use crate::schemas::requisition::Requisition;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

/// Keys under which an object body is expected to carry its listing array,
/// checked in this order.
const ENTRY_KEYS: [&str; 6] = [
    "requisitions",
    "requisition_listings",
    "listings",
    "data",
    "results",
    "items",
];

/// A successfully parsed listings response.
#[derive(Debug, Clone)]
pub struct ListingsResponse {
    pub body: Value,
    pub attempt: u32,
    pub fetched_at: DateTime<Utc>,
    pub elapsed_ms: i64,
}

impl ListingsResponse {
    pub fn payload(&self) -> ListingsPayload {
        ListingsPayload::from(self.body.clone())
    }
}

/// Shape of the listings body. The endpoint's schema is undocumented, so both a
/// bare array and a wrapping object are accepted.
#[derive(Debug, Clone, PartialEq)]
pub enum ListingsPayload {
    List(Vec<Value>),
    Object(Map<String, Value>),
    Other(Value),
}

impl ListingsPayload {
    pub fn kind(&self) -> &'static str {
        match self {
            ListingsPayload::List(_) => "array",
            ListingsPayload::Object(_) => "object",
            ListingsPayload::Other(_) => "scalar",
        }
    }

    pub fn entries(&self) -> &[Value] {
        match self {
            ListingsPayload::List(items) => items,
            ListingsPayload::Object(map) => ENTRY_KEYS
                .iter()
                .find_map(|key| map.get(*key).and_then(Value::as_array))
                .map(Vec::as_slice)
                .unwrap_or(&[]),
            ListingsPayload::Other(_) => &[],
        }
    }

    /// Decodes every entry that looks like a requisition. Entries that don't
    /// decode are skipped; their count is returned alongside.
    pub fn requisitions(&self) -> (Vec<Requisition>, usize) {
        let mut skipped = 0;
        let requisitions = self
            .entries()
            .iter()
            .filter_map(|entry| match Requisition::from_listing(entry) {
                Ok(requisition) => Some(requisition),
                Err(e) => {
                    tracing::debug!("Skipping listing entry: {}", e);
                    skipped += 1;
                    None
                }
            })
            .collect();
        (requisitions, skipped)
    }
}

impl From<Value> for ListingsPayload {
    fn from(body: Value) -> Self {
        match body {
            Value::Array(items) => ListingsPayload::List(items),
            Value::Object(map) => ListingsPayload::Object(map),
            other => ListingsPayload::Other(other),
        }
    }
}
