//! Rewrites string leaves into the primitive types a schema declares.
//!
//! Only properties named by the schema are visited; anything else in the
//! tree is left as it is.

use memchr::memchr_iter;
use serde_json::{Map, Number, Value};
use tracing::trace;

use crate::constants::CHECKBOX_ON;
use crate::schema::{Schema, SchemaType};
use crate::{Error, Result};

/// Coerces `tree` in place. Non-object trees are returned untouched.
pub fn coerce(tree: &mut Value, schema: &Schema) -> Result<()> {
    match tree {
        Value::Object(map) => coerce_map(map, schema),
        _ => Ok(()),
    }
}

pub fn coerce_value(mut tree: Value, schema: &Schema) -> Result<Value> {
    coerce(&mut tree, schema)?;
    Ok(tree)
}

fn coerce_map(map: &mut Map<String, Value>, schema: &Schema) -> Result<()> {
    for (name, property) in &schema.properties {
        match property.kind {
            Some(SchemaType::Integer) => coerce_numeric(map, name, parse_integer)?,
            Some(SchemaType::Number) => coerce_numeric(map, name, parse_number)?,
            Some(SchemaType::String) if property.is_time_like() => add_missing_seconds(map, name),
            Some(SchemaType::Boolean) => {
                let checked = map.get(name).is_some_and(is_checked);
                map.insert(name.clone(), Value::Bool(checked));
            }
            Some(SchemaType::Object) => {
                if let Some(Value::Object(child)) = map.get_mut(name) {
                    coerce_map(child, property)?;
                }
            }
            _ => {}
        }
    }
    Ok(())
}

fn coerce_numeric(
    map: &mut Map<String, Value>,
    name: &str,
    parse: fn(&str, &Value) -> Result<Value>,
) -> Result<()> {
    match map.get(name) {
        Some(value) if is_truthy(value) => {
            let typed = parse(name, value)?;
            map.insert(name.to_string(), typed);
        }
        _ => {
            if map.shift_remove(name).is_some() {
                trace!(property = name, "removed empty numeric property");
            }
        }
    }
    Ok(())
}

fn parse_integer(name: &str, value: &Value) -> Result<Value> {
    match value {
        Value::String(text) => text
            .trim()
            .parse::<i64>()
            .map(Value::from)
            .map_err(|err| Error::invalid_number(name, text.as_str(), err)),
        Value::Number(number) if number.is_i64() || number.is_u64() => Ok(value.clone()),
        Value::Number(number) => match number.as_f64() {
            Some(float) => Ok(Value::from(float.trunc() as i64)),
            None => Err(Error::invalid_number(name, number.to_string(), "not an integer")),
        },
        _ => Err(Error::InvalidNumberValue {
            property: name.to_string(),
        }),
    }
}

fn parse_number(name: &str, value: &Value) -> Result<Value> {
    match value {
        Value::String(text) => {
            let float = text
                .trim()
                .parse::<f64>()
                .map_err(|err| Error::invalid_number(name, text.as_str(), err))?;
            Number::from_f64(float)
                .map(Value::Number)
                .ok_or_else(|| Error::invalid_number(name, text.as_str(), "not a finite number"))
        }
        Value::Number(_) => Ok(value.clone()),
        _ => Err(Error::InvalidNumberValue {
            property: name.to_string(),
        }),
    }
}

/// `HH:MM` becomes `HH:MM:00`; any other colon count is left alone.
fn add_missing_seconds(map: &mut Map<String, Value>, name: &str) {
    if let Some(Value::String(text)) = map.get_mut(name) {
        if memchr_iter(b':', text.as_bytes()).count() == 1 {
            text.push_str(":00");
        }
    }
}

fn is_checked(value: &Value) -> bool {
    match value {
        Value::String(text) => text == CHECKBOX_ON,
        Value::Bool(flag) => *flag,
        _ => false,
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|float| float != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
