//! JSON payload: the contract between scoring and everything downstream.
//!
//! Encoding is plain serde. Decoding is deliberately lenient, record by
//! record: labels always come from the fixed schema, missing categories or
//! checks read as 0, scores are clamped to [0, 2], and a record that is not
//! an object is skipped and reported. Only a document that is not valid JSON,
//! or not an array, fails as a whole.

use crate::domain::{Category, CategoryKey, Check, SectorRow};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Symbol used for records that carry none.
pub const UNKNOWN_SYMBOL: &str = "?";

#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("expected a JSON array of rows, found {0}")]
    NotAnArray(&'static str),

    #[error("failed to read payload {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Rows decoded from a payload plus the positions of skipped records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedRows {
    pub rows: Vec<SectorRow>,
    pub skipped: Vec<usize>,
}

impl DecodedRows {
    /// Keep only rows whose symbol is in `sectors`. An empty filter keeps everything.
    pub fn filter_sectors(mut self, sectors: &[String]) -> Self {
        if !sectors.is_empty() {
            self.rows.retain(|r| sectors.iter().any(|s| s == &r.symbol));
        }
        self
    }
}

/// Serialize rows as a JSON array, indented when `pretty`.
pub fn encode(rows: &[SectorRow], pretty: bool) -> Result<String, PayloadError> {
    let text = if pretty {
        serde_json::to_string_pretty(rows)?
    } else {
        serde_json::to_string(rows)?
    };
    Ok(text)
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Parse a payload document, which must be a JSON array of rows.
pub fn decode(text: &str) -> Result<DecodedRows, PayloadError> {
    let value: Value = serde_json::from_str(text)?;
    decode_value(&value)
}

pub fn decode_value(value: &Value) -> Result<DecodedRows, PayloadError> {
    let items = value.as_array().ok_or(PayloadError::NotAnArray(kind(value)))?;
    let mut decoded = DecodedRows::default();
    for (i, item) in items.iter().enumerate() {
        match item.as_object() {
            Some(obj) => decoded.rows.push(row_from_object(obj)),
            None => {
                log::warn!("skipping payload record {i}: expected an object, found {}", kind(item));
                decoded.skipped.push(i);
            }
        }
    }
    Ok(decoded)
}

/// Read and decode a payload file.
pub fn load(path: &Path) -> Result<DecodedRows, PayloadError> {
    let text = std::fs::read_to_string(path).map_err(|source| PayloadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    decode(&text)
}

/// Integer score with lenient coercion, clamped to [0, 2]. Anything unreadable is 0.
fn coerce_score(raw: Option<&Value>) -> u8 {
    let n = match raw {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
            .unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse::<i64>().unwrap_or(0),
        Some(Value::Bool(b)) => i64::from(*b),
        _ => 0,
    };
    n.clamp(0, i64::from(Check::MAX_SCORE)) as u8
}

fn category_from_value(key: CategoryKey, node: Option<&Value>) -> Category {
    let checks = node
        .and_then(|n| n.get("checks"))
        .and_then(Value::as_array);
    let checks = key
        .labels()
        .iter()
        .enumerate()
        .map(|(i, label)| {
            let raw = checks.and_then(|c| c.get(i)).and_then(|c| c.get("score"));
            Check::new(*label, coerce_score(raw))
        })
        .collect();
    Category { checks }
}

fn row_from_object(obj: &Map<String, Value>) -> SectorRow {
    let symbol = obj
        .get("symbol")
        .and_then(Value::as_str)
        .unwrap_or(UNKNOWN_SYMBOL);
    let categories_node = obj.get("categories");
    let categories: BTreeMap<CategoryKey, Category> = CategoryKey::ALL
        .iter()
        .map(|&key| {
            let node = categories_node.and_then(|c| c.get(key.as_str()));
            (key, category_from_value(key, node))
        })
        .collect();
    SectorRow::new(symbol, categories)
}
