use super::error::NormLookupError;
use super::normal::z_to_percentile;
use super::norms::{NormEntry, NormRegistry};
use super::types::{Grade, Subject, Term};
use serde::Serialize;

pub const DEFAULT_PERCENTILE: u8 = 50;
pub const DEFAULT_STD_ERROR: f64 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PercentileSource {
    /// Computed from a norm entry.
    Norm,
    /// No norm was available; the value is the assumed average.
    Default,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Percentile {
    pub value: u8,
    pub source: PercentileSource,
}

impl Percentile {
    pub fn is_default(&self) -> bool {
        self.source == PercentileSource::Default
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PercentileRange {
    pub low: u8,
    pub mid: u8,
    pub high: u8,
    pub source: PercentileSource,
}

pub fn percentile_from_norm(score: f64, norm: &NormEntry) -> u8 {
    z_to_percentile((score - norm.mean) / norm.standard_deviation)
}

pub fn try_rit_to_percentile(
    registry: &NormRegistry,
    score: f64,
    grade: Grade,
    term: Term,
    subject: Subject,
    academic_year: Option<&str>,
) -> Result<u8, NormLookupError> {
    if !score.is_finite() {
        return Err(NormLookupError::NonFiniteScore);
    }
    let norm = registry.lookup(academic_year, grade, term, subject)?;
    Ok(percentile_from_norm(score, &norm))
}

/// Missing data is reported as the 50th percentile, tagged `Default`.
pub fn rit_to_percentile(
    registry: &NormRegistry,
    score: f64,
    grade: Grade,
    term: Term,
    subject: Subject,
    academic_year: Option<&str>,
) -> Percentile {
    match try_rit_to_percentile(registry, score, grade, term, subject, academic_year) {
        Ok(value) => Percentile {
            value,
            source: PercentileSource::Norm,
        },
        Err(e) => {
            log::debug!("percentile defaulted to {}: {}", DEFAULT_PERCENTILE, e);
            Percentile {
                value: DEFAULT_PERCENTILE,
                source: PercentileSource::Default,
            }
        }
    }
}

pub fn try_percentile_range(
    registry: &NormRegistry,
    score: f64,
    grade: Grade,
    term: Term,
    subject: Subject,
    academic_year: Option<&str>,
    std_error: f64,
) -> Result<PercentileRange, NormLookupError> {
    if !score.is_finite() || !std_error.is_finite() {
        return Err(NormLookupError::NonFiniteScore);
    }
    let norm = registry.lookup(academic_year, grade, term, subject)?;
    let err = std_error.abs();
    Ok(PercentileRange {
        low: percentile_from_norm(score - err, &norm),
        mid: percentile_from_norm(score, &norm),
        high: percentile_from_norm(score + err, &norm),
        source: PercentileSource::Norm,
    })
}

/// Percentiles at `score - std_error`, `score`, and `score + std_error`.
pub fn percentile_range(
    registry: &NormRegistry,
    score: f64,
    grade: Grade,
    term: Term,
    subject: Subject,
    academic_year: Option<&str>,
    std_error: f64,
) -> PercentileRange {
    try_percentile_range(
        registry,
        score,
        grade,
        term,
        subject,
        academic_year,
        std_error,
    )
    .unwrap_or(PercentileRange {
        low: DEFAULT_PERCENTILE,
        mid: DEFAULT_PERCENTILE,
        high: DEFAULT_PERCENTILE,
        source: PercentileSource::Default,
    })
}
