//! Request and response payloads exchanged with search and write handlers.
//!
//! The payloads are engine-version neutral: documents and queries travel as
//! raw JSON so each backend can translate them for its own client.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Search query addressed to one index.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    /// Index to search.
    pub index: String,
    /// Query DSL body.
    #[serde(default)]
    pub query: Value,
    /// Offset of the first hit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<u32>,
    /// Maximum number of hits.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
}

impl SearchRequest {
    /// Builds a request for `index` with the given query body.
    #[must_use]
    pub fn new(index: impl Into<String>, query: Value) -> Self {
        Self {
            index: index.into(),
            query,
            from: None,
            size: None,
        }
    }
}

/// One matching document.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    /// Document identifier.
    pub id: String,
    /// Relevance score, absent for unscored queries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    /// Stored document source.
    #[serde(default)]
    pub source: Value,
}

/// Result of a search.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    /// Engine-reported execution time.
    pub took_ms: u64,
    /// Total number of matching documents.
    pub total_hits: u64,
    /// Returned page of hits.
    #[serde(default)]
    pub hits: Vec<SearchHit>,
}

/// Single-document write.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexRequest {
    /// Target index.
    pub index: String,
    /// Document identifier; the engine assigns one when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Document body.
    pub document: Value,
}

/// Outcome of a single-document write.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexResponse {
    /// Index written to.
    pub index: String,
    /// Identifier of the stored document.
    pub id: String,
    /// Engine result label such as `created` or `updated`.
    pub result: String,
    /// Document version after the write.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<i64>,
}

/// Document within a bulk write.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkDocument {
    /// Document identifier; the engine assigns one when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Document body.
    pub document: Value,
}

/// Batch write into one index.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkIndexRequest {
    /// Target index.
    pub index: String,
    /// Documents to write.
    pub documents: Vec<BulkDocument>,
}

/// Per-document outcome of a bulk write.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkItemResult {
    /// Identifier of the stored document, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Engine status code for this item.
    pub status: u16,
    /// Failure reason for this item.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Result of a bulk write.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkIndexResponse {
    /// Engine-reported execution time.
    pub took_ms: u64,
    /// Whether any item failed.
    pub errors: bool,
    /// Per-document outcomes in request order.
    #[serde(default)]
    pub items: Vec<BulkItemResult>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn search_request_accepts_minimal_body() {
        let request: SearchRequest =
            serde_json::from_value(json!({"index": "products"})).expect("minimal request");
        assert_eq!(request.index, "products");
        assert_eq!(request.query, Value::Null);
        assert_eq!(request.size, None);
    }

    #[test]
    fn bulk_response_serialises_camel_case() {
        let response = BulkIndexResponse {
            took_ms: 4,
            errors: true,
            items: vec![BulkItemResult {
                id: Some("1".to_owned()),
                status: 400,
                error: Some("mapper_parsing_exception".to_owned()),
            }],
        };
        let value = serde_json::to_value(&response).expect("serialise");
        assert_eq!(value["tookMs"], json!(4));
        assert_eq!(value["items"][0]["status"], json!(400));
    }
}
