//! Batch classification of assessment records for reporting pages.
//!
//! Records come from user-entered or legacy data, so an unusable field never
//! fails the request: the row reports "no data" for whatever depended on it
//! and lists the problem under `issues`.

use crate::ipc::handlers::lexile::lexile_value;
use crate::ipc::helpers::{parse_grade_value, respond, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::map::achievement::{achievement_for, project_spring};
use crate::map::calendar::{academic_year_for, parse_test_date, term_for};
use crate::map::lexile::{
    calculate_lexile_distribution, calculate_lexile_stats, format_lexile, get_lexile_band,
};
use crate::map::percentile::{
    percentile_range, rit_to_percentile, Percentile, PercentileSource, DEFAULT_PERCENTILE,
};
use crate::map::{Grade, Subject, Term};
use serde_json::{json, Value};

const MAX_RECORDS: usize = 20_000;

struct Classified {
    row: Value,
    lexile: Option<i32>,
    defaulted: bool,
}

fn str_field<'a>(rec: &'a Value, key: &str) -> Option<&'a str> {
    rec.get(key)
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn classify_one(state: &AppState, rec: &Value) -> Classified {
    let mut issues: Vec<&'static str> = Vec::new();

    let test_date = str_field(rec, "testDate").and_then(parse_test_date);
    if str_field(rec, "testDate").is_some() && test_date.is_none() {
        issues.push("unparseable testDate");
    }

    let grade: Option<Grade> = rec.get("grade").and_then(parse_grade_value);
    if grade.is_none() {
        issues.push("unknown grade");
    }
    let subject = str_field(rec, "subject").and_then(Subject::parse);
    if subject.is_none() {
        issues.push("unknown subject");
    }
    let term: Option<Term> = str_field(rec, "term")
        .and_then(Term::parse)
        .or_else(|| test_date.map(term_for));
    if term.is_none() {
        issues.push("unknown term");
    }
    let academic_year: Option<String> = str_field(rec, "academicYear")
        .map(str::to_string)
        .or_else(|| {
            test_date.map(|d| academic_year_for(d, state.settings.academic_year_start_month))
        });
    let rit = rec.get("rit").and_then(|v| v.as_f64()).filter(|v| v.is_finite());
    if rit.is_none() {
        issues.push("missing rit");
    }

    let no_data = Percentile {
        value: DEFAULT_PERCENTILE,
        source: PercentileSource::Default,
    };
    let year = academic_year.as_deref();
    // Table the row is scored against, after the fallback-year rule.
    let norm_year = state
        .norms
        .resolve_table(year)
        .ok()
        .map(|t| t.academic_year().to_string());
    let (percentile, range, achievement, projection) = match (rit, grade, term, subject) {
        (Some(score), Some(g), Some(t), Some(s)) => {
            let pct = rit_to_percentile(&state.norms, score, g, t, s, year);
            if pct.is_default() {
                issues.push("no norm available");
            }
            let range = percentile_range(
                &state.norms,
                score,
                g,
                t,
                s,
                year,
                state.settings.percentile_std_error,
            );
            (
                pct,
                Some(range),
                achievement_for(&state.norms, score, g, t, s, year),
                project_spring(&state.norms, score, g, t, s, year),
            )
        }
        _ => (no_data, None, None, None),
    };

    let lexile_raw = rec.get("lexile").filter(|v| !v.is_null());
    let lexile = lexile_raw.and_then(lexile_value);
    if lexile_raw.is_some() && lexile.is_none() {
        issues.push("unparseable lexile");
    }

    let defaulted = percentile.is_default();
    let row = json!({
        "studentId": rec.get("studentId").cloned().unwrap_or(Value::Null),
        "grade": grade.map(|g| g.value()),
        "term": term,
        "subject": subject,
        "academicYear": academic_year,
        "normYear": norm_year,
        "rit": rit,
        "percentile": percentile,
        "percentileRange": range,
        "achievement": achievement.map(|a| json!({ "status": a, "info": a.info() })),
        "projection": projection.map(|p| json!({
            "projectedScore": p.projected_score,
            "springNorm": p.spring_norm,
            "status": p.status,
            "info": p.status.info(),
        })),
        "lexile": lexile.map(|v| json!({
            "value": v,
            "formatted": format_lexile(v),
            "band": get_lexile_band(f64::from(v)),
        })),
        "issues": issues,
    });
    Classified {
        row,
        lexile,
        defaulted,
    }
}

fn records_classify(state: &AppState, req: &Request) -> Result<Value, HandlerErr> {
    let records = req
        .params
        .get("records")
        .and_then(|v| v.as_array())
        .ok_or_else(|| HandlerErr::bad_params("records must be an array"))?;
    if records.len() > MAX_RECORDS {
        return Err(HandlerErr::bad_params(format!(
            "at most {} records per request",
            MAX_RECORDS
        ))
        .with_details(json!({ "count": records.len() })));
    }

    let classified: Vec<Classified> = records.iter().map(|r| classify_one(state, r)).collect();
    let lexiles: Vec<Option<i32>> = classified.iter().map(|c| c.lexile).collect();
    let no_norm_count = classified.iter().filter(|c| c.defaulted).count();
    let rows: Vec<Value> = classified.into_iter().map(|c| c.row).collect();

    Ok(json!({
        "count": rows.len(),
        "noNormCount": no_norm_count,
        "rows": rows,
        "lexileDistribution": calculate_lexile_distribution(&lexiles),
        "lexileStats": calculate_lexile_stats(&lexiles),
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    match req.method.as_str() {
        "records.classify" => Some(respond(req, records_classify(state, req))),
        _ => None,
    }
}
