use crate::db;
use crate::ipc::handlers::norms::workspace_registry;
use crate::ipc::helpers::{respond, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::settings::AnalyticsSettings;
use serde_json::json;
use std::path::PathBuf;

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    respond(
        req,
        Ok(json!({
            "version": env!("CARGO_PKG_VERSION"),
            "workspacePath": state.workspace.as_ref().map(|p| p.to_string_lossy().to_string()),
            "academicYears": state
                .norms
                .tables()
                .map(|t| t.academic_year().to_string())
                .collect::<Vec<_>>(),
            "fallbackAcademicYear": state.norms.fallback_year(),
        })),
    )
}

fn workspace_select(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let path = req
        .params
        .get("path")
        .and_then(|v| v.as_str())
        .map(PathBuf::from)
        .ok_or_else(|| HandlerErr::bad_params("missing params.path"))?;

    let conn = db::open_db(&path)
        .map_err(|e| HandlerErr::new("db_open_failed", format!("{e:?}")))?;
    let settings = AnalyticsSettings::load(&conn)
        .map_err(|e| HandlerErr::new("db_query_failed", e.to_string()))?;
    let registry = workspace_registry(&conn, &settings)
        .map_err(|e| HandlerErr::new("db_query_failed", e.to_string()))?;

    log::info!(
        "workspace opened at {} ({} academic years)",
        path.to_string_lossy(),
        registry.tables().count()
    );
    state.workspace = Some(path.clone());
    state.db = Some(conn);
    state.settings = settings;
    state.norms = registry;
    Ok(json!({ "workspacePath": path.to_string_lossy() }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "workspace.select" => {
            let res = workspace_select(state, req);
            Some(respond(req, res))
        }
        _ => None,
    }
}
