//! Norm reference tables and the registry that resolves academic years.
//!
//! A table is keyed by `(grade, term, subject)` and is immutable once built.
//! The registry holds one table per academic year and a fallback year that is
//! used whenever the requested year is absent.

use super::error::{NormLookupError, NormSetError};
use super::norm_data;
use super::types::{Grade, GrowthPeriod, Subject, Term};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashSet};

pub const NORM_SET_FORMAT_V1: &str = "mapnorms-v1";
pub const DEFAULT_FALLBACK_YEAR: &str = "2025-2026";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormEntry {
    pub mean: f64,
    #[serde(rename = "sd")]
    pub standard_deviation: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NormKey {
    pub grade: Grade,
    pub term: Term,
    pub subject: Subject,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum NormOrigin {
    Builtin,
    Imported {
        fingerprint: String,
        source: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormTable {
    academic_year: String,
    origin: NormOrigin,
    entries: BTreeMap<NormKey, NormEntry>,
    subject_correlations: BTreeMap<(Subject, GrowthPeriod), f64>,
    grade_correlations: BTreeMap<(Subject, GrowthPeriod, Grade), f64>,
}

impl NormTable {
    pub fn new(academic_year: impl Into<String>, origin: NormOrigin) -> Self {
        Self {
            academic_year: academic_year.into(),
            origin,
            entries: BTreeMap::new(),
            subject_correlations: BTreeMap::new(),
            grade_correlations: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, grade: Grade, term: Term, subject: Subject, entry: NormEntry) {
        self.entries.insert(
            NormKey {
                grade,
                term,
                subject,
            },
            entry,
        );
    }

    pub fn set_correlation(
        &mut self,
        subject: Subject,
        period: GrowthPeriod,
        grade: Option<Grade>,
        correlation: f64,
    ) {
        match grade {
            Some(g) => {
                self.grade_correlations
                    .insert((subject, period, g), correlation);
            }
            None => {
                self.subject_correlations
                    .insert((subject, period), correlation);
            }
        }
    }

    pub fn academic_year(&self) -> &str {
        &self.academic_year
    }

    pub fn origin(&self) -> &NormOrigin {
        &self.origin
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, grade: Grade, term: Term, subject: Subject) -> Option<NormEntry> {
        self.entries
            .get(&NormKey {
                grade,
                term,
                subject,
            })
            .copied()
    }

    /// Grade-specific correlation if one was configured, else the subject default.
    pub fn correlation(&self, grade: Grade, subject: Subject, period: GrowthPeriod) -> Option<f64> {
        self.grade_correlations
            .get(&(subject, period, grade))
            .or_else(|| self.subject_correlations.get(&(subject, period)))
            .copied()
    }

    pub fn grades(&self) -> Vec<Grade> {
        let mut out: Vec<Grade> = self.entries.keys().map(|k| k.grade).collect();
        out.dedup();
        out
    }

    /// Canonical document form; entries come out in key order.
    pub fn to_document(&self) -> NormSetDocument {
        let source = match &self.origin {
            NormOrigin::Imported { source, .. } => source.clone(),
            NormOrigin::Builtin => None,
        };
        let norms = self
            .entries
            .iter()
            .map(|(k, e)| NormRow {
                grade: k.grade.value(),
                term: k.term,
                subject: k.subject,
                mean: e.mean,
                sd: e.standard_deviation,
            })
            .collect();
        let mut growth_correlations: Vec<CorrelationRow> = self
            .subject_correlations
            .iter()
            .map(|((subject, period), r)| CorrelationRow {
                subject: *subject,
                period: *period,
                grade: None,
                correlation: *r,
            })
            .collect();
        growth_correlations.extend(self.grade_correlations.iter().map(
            |((subject, period, grade), r)| CorrelationRow {
                subject: *subject,
                period: *period,
                grade: Some(grade.value()),
                correlation: *r,
            },
        ));
        NormSetDocument {
            format: NORM_SET_FORMAT_V1.to_string(),
            academic_year: self.academic_year.clone(),
            source,
            norms,
            growth_correlations,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormRow {
    pub grade: u8,
    pub term: Term,
    pub subject: Subject,
    pub mean: f64,
    pub sd: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrelationRow {
    pub subject: Subject,
    pub period: GrowthPeriod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grade: Option<u8>,
    pub correlation: f64,
}

/// Loadable, versioned norm configuration for one academic year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormSetDocument {
    pub format: String,
    pub academic_year: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub norms: Vec<NormRow>,
    #[serde(default)]
    pub growth_correlations: Vec<CorrelationRow>,
}

pub fn is_valid_academic_year(key: &str) -> bool {
    let Some((a, b)) = key.split_once('-') else {
        return false;
    };
    let four_digits = |s: &str| s.len() == 4 && s.bytes().all(|c| c.is_ascii_digit());
    if !four_digits(a) || !four_digits(b) {
        return false;
    }
    match (a.parse::<u16>(), b.parse::<u16>()) {
        (Ok(a), Ok(b)) => b == a + 1,
        _ => false,
    }
}

impl NormSetDocument {
    /// Validates the document and builds a table tagged with its fingerprint.
    pub fn into_table(self) -> Result<NormTable, NormSetError> {
        if self.format != NORM_SET_FORMAT_V1 {
            return Err(NormSetError::UnsupportedFormat(self.format));
        }
        let year = self.academic_year.trim().to_string();
        if !is_valid_academic_year(&year) {
            return Err(NormSetError::BadAcademicYear(self.academic_year));
        }
        if self.norms.is_empty() {
            return Err(NormSetError::Empty);
        }

        let mut table = NormTable::new(year, NormOrigin::Builtin);
        let mut seen = HashSet::new();
        for (index, row) in self.norms.iter().enumerate() {
            let bad = |message: String| NormSetError::BadEntry { index, message };
            let Some(grade) = Grade::new(row.grade) else {
                return Err(bad(format!("grade must be in 0..={}", Grade::MAX)));
            };
            if !row.mean.is_finite() {
                return Err(bad("mean must be finite".into()));
            }
            if !row.sd.is_finite() || row.sd <= 0.0 {
                return Err(bad("sd must be a positive number".into()));
            }
            if !seen.insert((grade, row.term, row.subject)) {
                return Err(bad(format!(
                    "duplicate entry for grade {} {} {}",
                    grade, row.term, row.subject
                )));
            }
            table.insert(
                grade,
                row.term,
                row.subject,
                NormEntry {
                    mean: row.mean,
                    standard_deviation: row.sd,
                },
            );
        }

        let mut seen_corr = HashSet::new();
        for (index, row) in self.growth_correlations.iter().enumerate() {
            let bad = |message: String| NormSetError::BadCorrelation { index, message };
            if !(row.correlation.is_finite() && row.correlation > -1.0 && row.correlation < 1.0)
            {
                return Err(bad("correlation must be strictly between -1 and 1".into()));
            }
            let grade = match row.grade {
                None => None,
                Some(g) => match Grade::new(g) {
                    Some(g) => Some(g),
                    None => return Err(bad(format!("grade must be in 0..={}", Grade::MAX))),
                },
            };
            if !seen_corr.insert((row.subject, row.period, grade)) {
                return Err(bad("duplicate correlation".into()));
            }
            table.set_correlation(row.subject, row.period, grade, row.correlation);
        }

        let mut canonical = table.to_document();
        canonical.source = self.source.clone();
        table.origin = NormOrigin::Imported {
            fingerprint: fingerprint(&canonical),
            source: self.source,
        };
        Ok(table)
    }
}

/// SHA-256 over the canonical JSON serialisation, hex encoded.
pub fn fingerprint(doc: &NormSetDocument) -> String {
    let bytes = serde_json::to_vec(doc).unwrap_or_default();
    let digest = Sha256::digest(&bytes);
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

#[derive(Debug, Clone)]
pub struct NormRegistry {
    tables: BTreeMap<String, NormTable>,
    fallback_year: String,
}

impl Default for NormRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl NormRegistry {
    pub fn empty(fallback_year: impl Into<String>) -> Self {
        Self {
            tables: BTreeMap::new(),
            fallback_year: fallback_year.into(),
        }
    }

    pub fn builtin() -> Self {
        let mut reg = Self::empty(DEFAULT_FALLBACK_YEAR);
        for year in norm_data::BUILTIN_YEARS {
            reg.register(norm_data::builtin_table(year));
        }
        reg
    }

    /// Replaces any table already registered for the same academic year.
    pub fn register(&mut self, table: NormTable) -> Option<NormTable> {
        self.tables.insert(table.academic_year.clone(), table)
    }

    pub fn fallback_year(&self) -> &str {
        &self.fallback_year
    }

    pub fn set_fallback_year(&mut self, year: impl Into<String>) {
        self.fallback_year = year.into();
    }

    pub fn tables(&self) -> impl Iterator<Item = &NormTable> {
        self.tables.values()
    }

    /// Requested year if present, else the fallback year.
    pub fn resolve_table(
        &self,
        academic_year: Option<&str>,
    ) -> Result<&NormTable, NormLookupError> {
        academic_year
            .and_then(|y| self.tables.get(y.trim()))
            .or_else(|| self.tables.get(&self.fallback_year))
            .ok_or_else(|| NormLookupError::UnknownAcademicYear {
                requested: academic_year.unwrap_or_default().to_string(),
                fallback: self.fallback_year.clone(),
            })
    }

    pub fn lookup(
        &self,
        academic_year: Option<&str>,
        grade: Grade,
        term: Term,
        subject: Subject,
    ) -> Result<NormEntry, NormLookupError> {
        let table = self.resolve_table(academic_year)?;
        table
            .get(grade, term, subject)
            .ok_or_else(|| NormLookupError::MissingNorm {
                academic_year: table.academic_year.clone(),
                grade,
                term,
                subject,
            })
    }
}
