//! Decoding of result pages
//!
//! The backend sends every field of a page as a JSON document wrapped in a
//! string. Each one is decoded on its own.

use jobql_core::{JobqlError, QueryResult, Result, WirePage};
use serde::Deserialize;

/// `bytesProcessed` arrives either as a number or as a string holding one
#[derive(Deserialize)]
#[serde(untagged)]
enum ByteCount {
    Number(u64),
    Text(String),
}

/// Decode a wire page into a result tagged with `query_id`
pub fn decode_page(page: &WirePage, query_id: &str) -> Result<QueryResult> {
    let content: Vec<Vec<serde_json::Value>> = serde_json::from_str(&page.content)
        .map_err(|e| JobqlError::Decode(format!("content: {e}")))?;
    let labels: Vec<String> = serde_json::from_str(&page.labels)
        .map_err(|e| JobqlError::Decode(format!("labels: {e}")))?;
    let bytes_processed = decode_bytes_processed(&page.bytes_processed)?;

    Ok(QueryResult {
        query_id: query_id.to_string(),
        content,
        labels,
        bytes_processed,
    })
}

fn decode_bytes_processed(raw: &str) -> Result<u64> {
    let count: ByteCount = serde_json::from_str(raw)
        .map_err(|e| JobqlError::Decode(format!("bytesProcessed: {e}")))?;
    match count {
        ByteCount::Number(n) => Ok(n),
        ByteCount::Text(text) => text
            .trim()
            .parse()
            .map_err(|e| JobqlError::Decode(format!("bytesProcessed {text:?}: {e}"))),
    }
}
