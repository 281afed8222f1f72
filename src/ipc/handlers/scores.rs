use crate::ipc::helpers::{
    academic_year, choices, optional_f64, optional_str, required_f64, required_grade,
    required_subject, required_term, respond, HandlerErr,
};
use crate::ipc::types::{AppState, Request};
use crate::map::achievement::{
    achievement_for, get_achievement_status, get_projected_status, project_spring,
    AchievementStatus, ProjectedStatus,
};
use crate::map::growth::{conditional_growth, conditional_growth_distribution, GrowthNormParams};
use crate::map::percentile::{
    percentile_range, rit_to_percentile, try_percentile_range, try_rit_to_percentile,
    PercentileSource,
};
use crate::map::GrowthPeriod;
use serde_json::{json, Value};

fn strict(params: &Value) -> bool {
    params
        .get("strict")
        .and_then(|v| v.as_bool())
        .unwrap_or(false)
}

fn percentile(state: &AppState, req: &Request) -> Result<Value, HandlerErr> {
    let p = &req.params;
    let score = required_f64(p, "score")?;
    let grade = required_grade(p)?;
    let term = required_term(p, "term")?;
    let subject = required_subject(p)?;
    let year = academic_year(p);

    if strict(p) {
        let value = try_rit_to_percentile(&state.norms, score, grade, term, subject, year)?;
        return Ok(json!({ "percentile": value, "source": PercentileSource::Norm }));
    }
    let result = rit_to_percentile(&state.norms, score, grade, term, subject, year);
    Ok(json!({ "percentile": result.value, "source": result.source }))
}

fn percentile_range_handler(state: &AppState, req: &Request) -> Result<Value, HandlerErr> {
    let p = &req.params;
    let score = required_f64(p, "score")?;
    let grade = required_grade(p)?;
    let term = required_term(p, "term")?;
    let subject = required_subject(p)?;
    let year = academic_year(p);
    let std_error = optional_f64(p, "stdError")?.unwrap_or(state.settings.percentile_std_error);
    if std_error < 0.0 {
        return Err(HandlerErr::bad_params("stdError must not be negative"));
    }

    let range = if strict(p) {
        try_percentile_range(&state.norms, score, grade, term, subject, year, std_error)?
    } else {
        percentile_range(&state.norms, score, grade, term, subject, year, std_error)
    };
    Ok(json!({
        "low": range.low,
        "mid": range.mid,
        "high": range.high,
        "source": range.source,
        "stdError": std_error,
    }))
}

fn growth_period(p: &Value) -> Result<GrowthPeriod, HandlerErr> {
    if let Some(raw) = optional_str(p, "period") {
        return GrowthPeriod::parse(raw).ok_or_else(|| {
            HandlerErr::bad_params(format!(
                "period must be one of: {}",
                choices(&GrowthPeriod::ALL, GrowthPeriod::as_str)
            ))
        });
    }
    let start = required_term(p, "startTerm")?;
    let end = required_term(p, "endTerm")?;
    GrowthPeriod::between(start, end)
        .ok_or_else(|| HandlerErr::bad_params("startTerm must precede endTerm"))
}

/// Explicit `params`, or norms resolved from grade/subject/period.
fn growth_params(state: &AppState, p: &Value) -> Result<GrowthNormParams, HandlerErr> {
    if let Some(raw) = p.get("params") {
        return serde_json::from_value::<GrowthNormParams>(raw.clone())
            .map_err(|e| HandlerErr::bad_params(format!("params: {}", e)));
    }
    let grade = required_grade(p)?;
    let subject = required_subject(p)?;
    let period = growth_period(p)?;
    let table = state.norms.resolve_table(academic_year(p))?;
    GrowthNormParams::from_norms(table, grade, subject, period).ok_or_else(|| {
        HandlerErr::new(
            "missing_norm",
            format!(
                "no {} growth norms for grade {} {} in {}",
                subject,
                grade,
                period.as_str(),
                table.academic_year()
            ),
        )
    })
}

fn expected_growth(state: &AppState, req: &Request) -> Result<Value, HandlerErr> {
    let p = &req.params;
    let start_score = required_f64(p, "startScore")?;
    let params = growth_params(state, p)?;
    let dist = conditional_growth_distribution(start_score, &params)?;
    Ok(json!({
        "expectedGrowth": dist.expected_growth,
        "conditionalSd": dist.conditional_sd,
        "marginalMean": dist.marginal_mean,
        "regressionCoefficient": dist.regression_coefficient,
        "params": params,
    }))
}

fn growth_percentile(state: &AppState, req: &Request) -> Result<Value, HandlerErr> {
    let p = &req.params;
    let start_score = required_f64(p, "startScore")?;
    let end_score = required_f64(p, "endScore")?;
    let params = growth_params(state, p)?;
    let r = conditional_growth(start_score, end_score, &params)?;
    Ok(json!({
        "percentile": r.percentile,
        "observedGrowth": r.observed_growth,
        "expectedGrowth": r.expected_growth,
        "conditionalSd": r.conditional_sd,
        "z": r.z,
        "params": params,
    }))
}

fn achievement_json(status: Option<AchievementStatus>) -> Value {
    match status {
        Some(s) => json!({ "status": s, "info": s.info(), "normAvailable": true }),
        None => json!({ "status": null, "info": null, "normAvailable": false }),
    }
}

fn achievement(state: &AppState, req: &Request) -> Result<Value, HandlerErr> {
    let p = &req.params;
    let score = required_f64(p, "score")?;
    if let Some(norm) = optional_f64(p, "norm")? {
        return Ok(achievement_json(Some(get_achievement_status(score, norm))));
    }
    let grade = required_grade(p)?;
    let term = required_term(p, "term")?;
    let subject = required_subject(p)?;
    Ok(achievement_json(achievement_for(
        &state.norms,
        score,
        grade,
        term,
        subject,
        academic_year(p),
    )))
}

fn projected_json(projected_score: f64, spring_norm: f64, status: ProjectedStatus) -> Value {
    json!({
        "projectedScore": projected_score,
        "springNorm": spring_norm,
        "status": status,
        "info": status.info(),
        "normAvailable": true,
    })
}

fn projection(state: &AppState, req: &Request) -> Result<Value, HandlerErr> {
    let p = &req.params;
    if let (Some(projected), Some(spring)) =
        (optional_f64(p, "projectedScore")?, optional_f64(p, "springNorm")?)
    {
        return Ok(projected_json(
            projected,
            spring,
            get_projected_status(projected, spring),
        ));
    }
    let score = required_f64(p, "score")?;
    let grade = required_grade(p)?;
    let term = required_term(p, "term")?;
    let subject = required_subject(p)?;
    match project_spring(&state.norms, score, grade, term, subject, academic_year(p)) {
        Some(sp) => Ok(projected_json(sp.projected_score, sp.spring_norm, sp.status)),
        None => Ok(json!({
            "projectedScore": null,
            "springNorm": null,
            "status": null,
            "info": null,
            "normAvailable": false,
        })),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    let res = match req.method.as_str() {
        "map.percentile" => percentile(state, req),
        "map.percentileRange" => percentile_range_handler(state, req),
        "map.expectedGrowth" => expected_growth(state, req),
        "map.growthPercentile" => growth_percentile(state, req),
        "map.achievement" => achievement(state, req),
        "map.projection" => projection(state, req),
        _ => return None,
    };
    Some(respond(req, res))
}
