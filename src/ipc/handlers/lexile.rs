use crate::ipc::helpers::{required_f64, required_str, respond, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::map::lexile::{
    calculate_lexile_distribution, calculate_lexile_stats, format_lexile, get_lexile_band,
    parse_lexile, LEXILE_BANDS,
};
use serde_json::{json, Value};

/// Whole numbers are taken as measures, strings are parsed, anything else is no data.
pub fn lexile_value(v: &Value) -> Option<i32> {
    match v {
        Value::Number(n) => match n.as_i64() {
            Some(i) => i32::try_from(i).ok(),
            None => n
                .as_f64()
                .filter(|f| f.fract() == 0.0)
                .filter(|f| *f >= f64::from(i32::MIN) && *f <= f64::from(i32::MAX))
                .map(|f| f as i32),
        },
        Value::String(s) => parse_lexile(s),
        _ => None,
    }
}

fn values_param(req: &Request) -> Result<Vec<Option<i32>>, HandlerErr> {
    let raw = req
        .params
        .get("values")
        .and_then(|v| v.as_array())
        .ok_or_else(|| HandlerErr::bad_params("values must be an array"))?;
    Ok(raw.iter().map(lexile_value).collect())
}

fn lexile_parse(req: &Request) -> Result<Value, HandlerErr> {
    let text = required_str(&req.params, "text")?;
    Ok(match parse_lexile(text) {
        Some(v) => json!({ "value": v, "formatted": format_lexile(v) }),
        None => json!({ "value": null, "formatted": null }),
    })
}

fn lexile_format(req: &Request) -> Result<Value, HandlerErr> {
    let v = req
        .params
        .get("value")
        .and_then(|v| v.as_i64())
        .and_then(|n| i32::try_from(n).ok())
        .ok_or_else(|| HandlerErr::bad_params("value must be an integer"))?;
    Ok(json!({ "formatted": format_lexile(v) }))
}

fn lexile_band(req: &Request) -> Result<Value, HandlerErr> {
    let band = match req.params.get("value") {
        Some(Value::String(s)) => match parse_lexile(s) {
            Some(v) => get_lexile_band(f64::from(v)),
            None => return Ok(json!({ "band": null })),
        },
        _ => get_lexile_band(required_f64(&req.params, "value")?),
    };
    Ok(json!({ "band": band }))
}

pub fn try_handle(_state: &mut AppState, req: &Request) -> Option<Value> {
    let res = match req.method.as_str() {
        "lexile.parse" => lexile_parse(req),
        "lexile.format" => lexile_format(req),
        "lexile.band" => lexile_band(req),
        "lexile.bands" => Ok(json!({ "bands": LEXILE_BANDS })),
        "lexile.distribution" => {
            values_param(req).map(|v| json!(calculate_lexile_distribution(&v)))
        }
        "lexile.stats" => values_param(req).map(|v| json!(calculate_lexile_stats(&v))),
        _ => return None,
    };
    Some(respond(req, res))
}
