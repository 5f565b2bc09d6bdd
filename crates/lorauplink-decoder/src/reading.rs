use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use rquickjs::{Type, Value};
use serde_json::{Map, Number, Value as JsonValue};

use crate::config::DecoderConfig;
use crate::error::{DecodeError, Result};

/// Decoded readings: field name to scalar or nested value.
pub type Readings = Map<String, JsonValue>;

// Largest integer an f64 holds exactly.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// Walks a script result into JSON under the decoder's budgets.
///
/// Shared sub-objects are visited once per path. Every converted value counts
/// against `max_result_values`, and the watchdog flag is polled between values
/// since plain property reads never reach the interpreter's interrupt check.
pub(crate) struct ResultConverter<'a> {
    max_depth: usize,
    values_left: usize,
    max_values: usize,
    timeout: Duration,
    interrupted: &'a AtomicBool,
}

impl<'a> ResultConverter<'a> {
    pub(crate) fn new(config: &DecoderConfig, interrupted: &'a AtomicBool) -> Self {
        Self {
            max_depth: config.max_result_depth,
            values_left: config.max_result_values,
            max_values: config.max_result_values,
            timeout: config.timeout,
            interrupted,
        }
    }

    /// Convert a script result into readings.
    ///
    /// Only a plain object is accepted at the top level; arrays, functions,
    /// scalars, `null` and `undefined` are rejected.
    pub(crate) fn readings(mut self, value: &Value<'_>) -> Result<Readings> {
        let object = match value.type_of() {
            Type::Object => value.as_object(),
            other => {
                return Err(DecodeError::InvalidResultShape(format!(
                    "expected an object, got {}",
                    type_name(other)
                )))
            }
        };
        let Some(object) = object else {
            return Err(DecodeError::InvalidResultShape(
                "expected an object".to_string(),
            ));
        };

        let mut readings = Map::new();
        for prop in object.props::<String, Value>() {
            let (key, value) = prop.map_err(script_error)?;
            let converted = self
                .to_json(&value, 1)
                .map_err(|err| prefix_key(err, &key))?;
            readings.insert(key, converted);
        }
        Ok(readings)
    }

    fn to_json(&mut self, value: &Value<'_>, depth: usize) -> Result<JsonValue> {
        self.charge(depth)?;

        match value.type_of() {
            Type::Undefined | Type::Null => Ok(JsonValue::Null),
            Type::Bool => Ok(JsonValue::Bool(value.as_bool().unwrap_or_default())),
            Type::Int => Ok(value.as_int().map(JsonValue::from).unwrap_or_default()),
            Type::Float => Ok(value.as_float().map(float_to_json).unwrap_or_default()),
            Type::String => match value.as_string() {
                Some(text) => Ok(JsonValue::String(text.to_string().map_err(script_error)?)),
                None => Ok(JsonValue::Null),
            },
            Type::Array => {
                let Some(array) = value.as_array() else {
                    return Ok(JsonValue::Array(Vec::new()));
                };
                let mut items = Vec::with_capacity(array.len().min(self.values_left));
                for item in array.iter::<Value>() {
                    let item = item.map_err(script_error)?;
                    items.push(self.to_json(&item, depth + 1)?);
                }
                Ok(JsonValue::Array(items))
            }
            Type::Object => {
                let Some(object) = value.as_object() else {
                    return Ok(JsonValue::Object(Map::new()));
                };
                let mut map = Map::new();
                for prop in object.props::<String, Value>() {
                    let (key, item) = prop.map_err(script_error)?;
                    map.insert(key, self.to_json(&item, depth + 1)?);
                }
                Ok(JsonValue::Object(map))
            }
            other => Err(DecodeError::InvalidResultShape(format!(
                "unsupported value of type {}",
                type_name(other)
            ))),
        }
    }

    fn charge(&mut self, depth: usize) -> Result<()> {
        if self.interrupted.load(Ordering::SeqCst) {
            return Err(DecodeError::Timeout(self.timeout));
        }
        if depth > self.max_depth {
            return Err(DecodeError::InvalidResultShape(format!(
                "nesting deeper than {} levels",
                self.max_depth
            )));
        }
        if self.values_left == 0 {
            return Err(DecodeError::InvalidResultShape(format!(
                "more than {} values",
                self.max_values
            )));
        }
        self.values_left -= 1;
        Ok(())
    }
}

// JavaScript has a single number type; integral values come back as integers.
fn float_to_json(value: f64) -> JsonValue {
    if value.fract() == 0.0 && value.abs() <= MAX_SAFE_INTEGER {
        return JsonValue::from(value as i64);
    }
    Number::from_f64(value)
        .map(JsonValue::Number)
        .unwrap_or(JsonValue::Null)
}

fn type_name(kind: Type) -> String {
    format!("{kind:?}").to_ascii_lowercase()
}

fn prefix_key(err: DecodeError, key: &str) -> DecodeError {
    match err {
        DecodeError::InvalidResultShape(message) => {
            DecodeError::InvalidResultShape(format!("field '{key}': {message}"))
        }
        other => other,
    }
}

fn script_error(err: rquickjs::Error) -> DecodeError {
    DecodeError::Script(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integral_floats_become_integers() {
        assert_eq!(float_to_json(2.0), JsonValue::from(2));
        assert_eq!(float_to_json(-7.0), JsonValue::from(-7));
        assert_eq!(float_to_json(25.8), serde_json::json!(25.8));
    }

    #[test]
    fn non_finite_floats_become_null() {
        assert_eq!(float_to_json(f64::NAN), JsonValue::Null);
        assert_eq!(float_to_json(f64::INFINITY), JsonValue::Null);
    }

    #[test]
    fn huge_integral_floats_stay_floats() {
        assert_eq!(float_to_json(1e300), serde_json::json!(1e300));
    }
}
