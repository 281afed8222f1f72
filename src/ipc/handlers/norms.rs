use crate::db;
use crate::ipc::helpers::{
    academic_year, db_conn, required_grade, required_subject, required_term, respond, HandlerErr,
};
use crate::ipc::types::{AppState, Request};
use crate::map::norms::{NormOrigin, NormRegistry, NormSetDocument, NormTable};
use crate::settings::AnalyticsSettings;
use rusqlite::Connection;
use serde_json::json;
use std::collections::HashMap;
use std::path::PathBuf;

/// Built-in tables overlaid with every valid norm set stored in the workspace.
pub fn workspace_registry(
    conn: &Connection,
    settings: &AnalyticsSettings,
) -> anyhow::Result<NormRegistry> {
    let mut registry = NormRegistry::builtin();
    registry.set_fallback_year(settings.fallback_academic_year.clone());
    for stored in db::norm_sets_load(conn)? {
        let parsed = serde_json::from_str::<NormSetDocument>(&stored.document_json)
            .map_err(|e| e.to_string())
            .and_then(|doc| doc.into_table().map_err(|e| e.to_string()));
        match parsed {
            Ok(table) => {
                if let NormOrigin::Imported { fingerprint, .. } = table.origin() {
                    if *fingerprint != stored.fingerprint {
                        log::debug!(
                            "norm set {} fingerprint changed on reload ({} -> {})",
                            stored.academic_year,
                            stored.fingerprint,
                            fingerprint
                        );
                    }
                }
                registry.register(table);
            }
            Err(e) => log::warn!(
                "skipping stored norm set {} ({}): {}",
                stored.academic_year,
                stored.id,
                e
            ),
        }
    }
    Ok(registry)
}

fn norms_list(state: &AppState) -> Result<serde_json::Value, HandlerErr> {
    let imported_at: HashMap<String, String> = match state.db.as_ref() {
        Some(conn) => db::norm_sets_load(conn)
            .map_err(|e| HandlerErr::new("db_query_failed", e.to_string()))?
            .into_iter()
            .map(|s| (s.academic_year, s.imported_at))
            .collect(),
        None => HashMap::new(),
    };

    let sets: Vec<serde_json::Value> = state
        .norms
        .tables()
        .map(|t| {
            let imported = match t.origin() {
                NormOrigin::Imported { .. } => imported_at.get(t.academic_year()),
                NormOrigin::Builtin => None,
            };
            json!({
                "academicYear": t.academic_year(),
                "origin": t.origin(),
                "entryCount": t.len(),
                "grades": t.grades().iter().map(|g| g.value()).collect::<Vec<_>>(),
                "importedAt": imported,
            })
        })
        .collect();

    Ok(json!({
        "normSets": sets,
        "fallbackAcademicYear": state.norms.fallback_year(),
    }))
}

fn norms_get(state: &AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let p = &req.params;
    let grade = required_grade(p)?;
    let term = required_term(p, "term")?;
    let subject = required_subject(p)?;
    let table = state.norms.resolve_table(academic_year(p))?;
    let entry = state
        .norms
        .lookup(academic_year(p), grade, term, subject)?;
    Ok(json!({
        "academicYear": table.academic_year(),
        "grade": grade.value(),
        "term": term,
        "subject": subject,
        "mean": entry.mean,
        "sd": entry.standard_deviation,
    }))
}

fn import_table(
    state: &mut AppState,
    doc: NormSetDocument,
) -> Result<serde_json::Value, HandlerErr> {
    let conn = db_conn(state)?;
    let table: NormTable = doc.into_table()?;
    let id = db::norm_set_upsert(conn, &table)
        .map_err(|e| HandlerErr::new("db_update_failed", e.to_string()))?;

    let fingerprint = match table.origin() {
        NormOrigin::Imported { fingerprint, .. } => fingerprint.clone(),
        NormOrigin::Builtin => String::new(),
    };
    let year = table.academic_year().to_string();
    let entry_count = table.len();
    let replaced = state.norms.register(table).is_some();
    log::info!(
        "imported norm set {} ({} entries, fingerprint {})",
        year,
        entry_count,
        fingerprint
    );
    Ok(json!({
        "normSetId": id,
        "academicYear": year,
        "fingerprint": fingerprint,
        "entryCount": entry_count,
        "replaced": replaced,
    }))
}

fn norms_import(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let raw = req
        .params
        .get("document")
        .cloned()
        .ok_or_else(|| HandlerErr::bad_params("missing document"))?;
    let doc: NormSetDocument = serde_json::from_value(raw)
        .map_err(|e| HandlerErr::new("invalid_norm_set", e.to_string()))?;
    import_table(state, doc)
}

fn norms_import_file(
    state: &mut AppState,
    req: &Request,
) -> Result<serde_json::Value, HandlerErr> {
    let path = req
        .params
        .get("path")
        .and_then(|v| v.as_str())
        .map(PathBuf::from)
        .ok_or_else(|| HandlerErr::bad_params("missing path"))?;
    let text = std::fs::read_to_string(&path).map_err(|e| {
        HandlerErr::new("io_failed", e.to_string())
            .with_details(json!({ "path": path.to_string_lossy() }))
    })?;
    let doc: NormSetDocument = serde_json::from_str(&text)
        .map_err(|e| HandlerErr::new("invalid_norm_set", e.to_string()))?;
    import_table(state, doc)
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let res = match req.method.as_str() {
        "norms.list" => norms_list(state),
        "norms.get" => norms_get(state, req),
        "norms.import" => norms_import(state, req),
        "norms.importFile" => norms_import_file(state, req),
        _ => return None,
    };
    Some(respond(req, res))
}
