//! Built-in status norms (2020 MAP Growth technical manual, student
//! achievement tables) for grades 3 through 6.
//!
//! Both built-in academic years publish the same reference table; districts
//! that adopt newer norms import them as a norm set.

use super::norms::{NormEntry, NormOrigin, NormTable};
use super::types::{Grade, GrowthPeriod, Subject, Term};

pub const BUILTIN_YEARS: [&str; 2] = ["2024-2025", "2025-2026"];

/// (grade, [fall, winter, spring]) as (mean, sd)
type GradeRow = (u8, [(f64, f64); 3]);

const READING: [GradeRow; 4] = [
    (3, [(186.60, 17.84), (193.90, 17.24), (197.12, 17.14)]),
    (4, [(196.67, 17.10), (201.85, 16.71), (204.83, 16.75)]),
    (5, [(204.48, 16.25), (208.01, 16.07), (210.98, 16.16)]),
    (6, [(210.17, 15.87), (212.96, 15.71), (215.36, 15.88)]),
];

const LANGUAGE_USAGE: [GradeRow; 4] = [
    (3, [(185.69, 16.03), (192.36, 15.51), (196.11, 15.62)]),
    (4, [(196.02, 15.37), (200.62, 15.09), (203.56, 15.19)]),
    (5, [(203.18, 14.76), (206.51, 14.63), (208.86, 14.82)]),
    (6, [(208.48, 14.60), (211.05, 14.52), (212.81, 14.72)]),
];

/// Test-retest correlations between occasions, by subject.
const CORRELATIONS: [(Subject, GrowthPeriod, f64); 6] = [
    (Subject::Reading, GrowthPeriod::FallToWinter, 0.86),
    (Subject::Reading, GrowthPeriod::FallToSpring, 0.84),
    (Subject::Reading, GrowthPeriod::WinterToSpring, 0.87),
    (Subject::LanguageUsage, GrowthPeriod::FallToWinter, 0.85),
    (Subject::LanguageUsage, GrowthPeriod::FallToSpring, 0.83),
    (Subject::LanguageUsage, GrowthPeriod::WinterToSpring, 0.86),
];

pub fn builtin_table(academic_year: &str) -> NormTable {
    let mut table = NormTable::new(academic_year, NormOrigin::Builtin);
    for (subject, rows) in [
        (Subject::Reading, &READING),
        (Subject::LanguageUsage, &LANGUAGE_USAGE),
    ] {
        for (grade, terms) in rows.iter() {
            let Some(grade) = Grade::new(*grade) else {
                continue;
            };
            for (term, (mean, sd)) in Term::ALL.iter().zip(terms.iter()) {
                table.insert(
                    grade,
                    *term,
                    subject,
                    NormEntry {
                        mean: *mean,
                        standard_deviation: *sd,
                    },
                );
            }
        }
    }
    for (subject, period, r) in CORRELATIONS {
        table.set_correlation(subject, period, None, r);
    }
    table
}
