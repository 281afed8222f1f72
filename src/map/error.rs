use super::types::{Grade, Subject, Term};
use thiserror::Error;

/// Strict norm lookup failures. The convenience layer maps all of these to
/// the 50th percentile.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NormLookupError {
    #[error("no norm table for academic year {requested} (fallback {fallback} also missing)")]
    UnknownAcademicYear { requested: String, fallback: String },

    #[error("no {subject} norm for grade {grade} {term} in {academic_year}")]
    MissingNorm {
        academic_year: String,
        grade: Grade,
        term: Term,
        subject: Subject,
    },

    #[error("score must be a finite number")]
    NonFiniteScore,
}

impl NormLookupError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnknownAcademicYear { .. } => "unknown_academic_year",
            Self::MissingNorm { .. } => "missing_norm",
            Self::NonFiniteScore => "non_finite_score",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GrowthError {
    #[error("degenerate growth parameters: {reason}")]
    DegenerateParameters { reason: String },
}

impl GrowthError {
    pub fn degenerate(reason: impl Into<String>) -> Self {
        Self::DegenerateParameters {
            reason: reason.into(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::DegenerateParameters { .. } => "degenerate_growth_parameters",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum NormSetError {
    #[error("unsupported norm set format: {0}")]
    UnsupportedFormat(String),

    #[error("academic year must look like YYYY-YYYY with consecutive years: {0}")]
    BadAcademicYear(String),

    #[error("norms[{index}]: {message}")]
    BadEntry { index: usize, message: String },

    #[error("growthCorrelations[{index}]: {message}")]
    BadCorrelation { index: usize, message: String },

    #[error("norm set contains no entries")]
    Empty,
}

impl NormSetError {
    pub fn code(&self) -> &'static str {
        "invalid_norm_set"
    }
}
