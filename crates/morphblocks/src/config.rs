//! Shared helpers for parsing text-valued config records in factories.

use morphcore::{parse_coord, BlockError, Coord3};
use std::collections::HashMap;

pub fn require<'a>(config: &'a HashMap<String, String>, key: &str) -> Result<&'a str, BlockError> {
    config
        .get(key)
        .map(String::as_str)
        .ok_or_else(|| BlockError::ConfigParse {
            key: key.to_string(),
            reason: "missing".to_string(),
        })
}

pub fn f64_or(config: &HashMap<String, String>, key: &str, default: f64) -> Result<f64, BlockError> {
    match config.get(key) {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|_| BlockError::ConfigParse {
            key: key.to_string(),
            reason: format!("'{}' is not a number", raw),
        }),
    }
}

pub fn require_coord(config: &HashMap<String, String>, key: &str) -> Result<Coord3, BlockError> {
    parse_coord(require(config, key)?).ok_or_else(|| BlockError::ConfigParse {
        key: key.to_string(),
        reason: "expected three numbers 'x y z'".to_string(),
    })
}
