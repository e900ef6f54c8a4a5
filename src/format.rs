//! Best-effort formatter for values whose schema says nothing about them
//! (`unknown`, `any`, `object`). Not schema-driven.
use serde_json::{Map, Value as Json};
use thiserror::Error;

use crate::value::{PropertyKey, Value};

#[derive(Debug, Error)]
#[error("bigint values have no JSON form")]
struct NotJson;

pub fn format_any(value: &Value) -> String {
    match value {
        Value::Undefined | Value::Null | Value::Number(_) | Value::Symbol(_) => value.to_display_string(),
        Value::BigInt(i) => format!("{i}n"),
        other => match to_json(other) {
            Ok(Some(json)) => json.to_string(),
            Ok(None) | Err(NotJson) => other.to_display_string(),
        },
    }
}

/// `None` marks values JSON has no slot for (they are dropped from objects
/// and become `null` in arrays).
fn to_json(value: &Value) -> Result<Option<Json>, NotJson> {
    let json = match value {
        Value::Undefined | Value::Symbol(_) => return Ok(None),
        Value::BigInt(_) => return Err(NotJson),
        Value::Null => Json::Null,
        Value::Bool(b) => Json::Bool(*b),
        Value::Number(n) => json_num_pref_i64(*n),
        Value::String(s) => Json::String(s.clone()),
        Value::Array(xs) => {
            let mut out = Vec::with_capacity(xs.len());
            for x in xs {
                out.push(to_json(x)?.unwrap_or(Json::Null));
            }
            Json::Array(out)
        }
        Value::Object(obj) => {
            let mut out = Map::new();
            for (k, v) in obj {
                let PropertyKey::String(k) = k else { continue };
                if let Some(v) = to_json(v)? {
                    out.insert(k.clone(), v);
                }
            }
            Json::Object(out)
        }
        // collections expose no enumerable own properties
        Value::Set(_) | Value::Map(_) => Json::Object(Map::new()),
    };
    Ok(Some(json))
}

// Helper: prefer emitting integers when exact
fn json_num_pref_i64(n: f64) -> Json {
    if !n.is_finite() {
        return Json::Null;
    }
    if n.fract() == 0.0 && n.abs() <= 9_007_199_254_740_991.0 {
        // -0 lands here too and prints as 0
        Json::from(n as i64)
    } else {
        serde_json::Number::from_f64(n).map(Json::Number).unwrap_or(Json::Null)
    }
}

// ------------------------------- Tests ------------------------------------ //
