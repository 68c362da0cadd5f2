use serde_json::Value;
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};

pub fn escape_xml(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Reads a JSON document from disk. Unlike the engine, this is strict: a
/// missing file or a syntax error is reported to the caller.
pub fn read_json_document(path: &Path) -> Result<Value> {
    let source = fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_json_document(&source)
}

pub fn parse_json_document(source: &str) -> Result<Value> {
    if source.trim().is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_str(source)?)
}

/// Formats a coordinate without trailing noise, e.g. `800` or `-12.5`.
pub fn format_number(value: f64) -> String {
    let rounded = (value * 10.0).round() / 10.0;
    if rounded == rounded.trunc() {
        format!("{:.0}", rounded)
    } else {
        format!("{:.1}", rounded)
    }
}
