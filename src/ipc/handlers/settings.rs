use crate::ipc::helpers::{db_conn, respond, HandlerErr};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn settings_get(state: &AppState) -> Result<serde_json::Value, HandlerErr> {
    db_conn(state)?;
    Ok(json!({ "analytics": state.settings }))
}

fn settings_update(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let conn = db_conn(state)?;
    let patch = req
        .params
        .get("patch")
        .and_then(|v| v.as_object())
        .ok_or_else(|| HandlerErr::bad_params("patch must be an object"))?;

    let mut next = state.settings.clone();
    next.merge_patch(patch).map_err(HandlerErr::bad_params)?;
    next.save(conn)
        .map_err(|e| HandlerErr::new("db_update_failed", e.to_string()))?;

    state
        .norms
        .set_fallback_year(next.fallback_academic_year.clone());
    state.settings = next;
    Ok(json!({ "analytics": state.settings }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "settings.get" => Some(respond(req, settings_get(state))),
        "settings.update" => {
            let res = settings_update(state, req);
            Some(respond(req, res))
        }
        _ => None,
    }
}
