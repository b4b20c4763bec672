//! Mapping source-specific JSON onto [`DailyArticle`].
//!
//! Every field has a fixed list of candidate names, tried in order at the
//! top level and then inside a nested `data` object. The first non-empty
//! candidate wins; a field with no candidate gets a placeholder.

use dailyread_crypto::sha256_hex_prefix;
use dailyread_types::DailyArticle;
use serde_json::{Map, Value};

use crate::SourceError;

const ID_FIELDS: &[&str] = &["id", "article_id", "aid"];
const TITLE_FIELDS: &[&str] = &["title", "c_title", "name"];
const AUTHOR_FIELDS: &[&str] = &["author", "c_author", "writer"];
const CONTENT_FIELDS: &[&str] = &["content", "c_content", "body", "text"];

pub const UNTITLED: &str = "Untitled";
pub const UNKNOWN_AUTHOR: &str = "Unknown";
pub const NO_CONTENT: &str = "<p>No content</p>";

/// Bytes of content hash used for a synthesised id.
const HASH_ID_BYTES: usize = 8;

fn scalar(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

fn first_present(layers: &[&Map<String, Value>], candidates: &[&str]) -> Option<String> {
    layers
        .iter()
        .flat_map(|layer| candidates.iter().filter_map(move |name| layer.get(*name)))
        .find_map(scalar)
}

/// Normalise one response body. Only a non-object body is an error.
pub fn normalize_article(body: &Value) -> Result<DailyArticle, SourceError> {
    let top = body
        .as_object()
        .ok_or_else(|| SourceError::InvalidBody("expected a JSON object".into()))?;
    let mut layers = vec![top];
    if let Some(nested) = top.get("data").and_then(Value::as_object) {
        layers.push(nested);
    }

    let title = first_present(&layers, TITLE_FIELDS).unwrap_or_else(|| UNTITLED.to_string());
    let author = first_present(&layers, AUTHOR_FIELDS).unwrap_or_else(|| UNKNOWN_AUTHOR.to_string());
    let content = first_present(&layers, CONTENT_FIELDS).unwrap_or_else(|| NO_CONTENT.to_string());
    let id = first_present(&layers, ID_FIELDS).unwrap_or_else(|| {
        sha256_hex_prefix(&[title.as_bytes(), b"\0", content.as_bytes()], HASH_ID_BYTES)
    });

    Ok(DailyArticle {
        id,
        title,
        author,
        content,
    })
}
