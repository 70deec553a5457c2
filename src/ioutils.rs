use crate::constants::STDIN_INDICATOR;
use crate::error::{Error, Result};
use serde_json::{Map, Value};

/// Parses render data, which must be a JSON object. Empty input yields an
/// empty map.
pub fn parse_string_to_json(buf: &str) -> Result<Map<String, Value>> {
    if buf.trim().is_empty() {
        return Ok(Map::new());
    }
    match serde_json::from_str(buf)? {
        Value::Object(map) => Ok(map),
        other => Err(Error::ConfigValidation(format!(
            "render data must be a JSON object, got {}",
            json_kind(&other)
        ))),
    }
}

pub fn read_from(mut reader: impl std::io::Read) -> Result<String> {
    let mut buf = String::new();
    reader.read_to_string(&mut buf).map_err(Error::IoError)?;
    Ok(buf)
}

/// Reads `--data`: inline JSON, or stdin when given `-`.
pub fn read_data(arg: Option<&str>) -> Result<Map<String, Value>> {
    match arg {
        None => Ok(Map::new()),
        Some(STDIN_INDICATOR) => parse_string_to_json(&read_from(std::io::stdin())?),
        Some(inline) => parse_string_to_json(inline),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
