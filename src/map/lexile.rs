//! Lexile measures: text codes, reading bands, cohort summaries.
//!
//! Negative values are Beginning Reader measures and are written `BR<n>L`.

use super::stats::{mean, median, population_std_dev, round_off_1_decimal};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LexileBand {
    pub key: &'static str,
    pub label: &'static str,
    pub description: &'static str,
    pub color: &'static str,
    /// Inclusive lower bound; `None` is open-ended.
    pub min: Option<i32>,
    /// Exclusive upper bound; `None` is open-ended.
    pub max: Option<i32>,
}

impl LexileBand {
    pub fn contains(&self, value: f64) -> bool {
        let above_min = self.min.map(|m| value >= f64::from(m)).unwrap_or(true);
        let below_max = self.max.map(|m| value < f64::from(m)).unwrap_or(true);
        above_min && below_max
    }
}

pub const LEXILE_BANDS: [LexileBand; 7] = [
    LexileBand {
        key: "br",
        label: "BR",
        description: "Beginning Reader",
        color: "#ef4444",
        min: None,
        max: Some(0),
    },
    LexileBand {
        key: "0-199",
        label: "0L-199L",
        description: "Early Reader",
        color: "#f97316",
        min: Some(0),
        max: Some(200),
    },
    LexileBand {
        key: "200-399",
        label: "200L-399L",
        description: "Developing Reader",
        color: "#f59e0b",
        min: Some(200),
        max: Some(400),
    },
    LexileBand {
        key: "400-599",
        label: "400L-599L",
        description: "Transitional Reader",
        color: "#eab308",
        min: Some(400),
        max: Some(600),
    },
    LexileBand {
        key: "600-799",
        label: "600L-799L",
        description: "Intermediate Reader",
        color: "#84cc16",
        min: Some(600),
        max: Some(800),
    },
    LexileBand {
        key: "800-999",
        label: "800L-999L",
        description: "Proficient Reader",
        color: "#22c55e",
        min: Some(800),
        max: Some(1000),
    },
    LexileBand {
        key: "1000+",
        label: "1000L+",
        description: "Advanced Reader",
        color: "#3b82f6",
        min: Some(1000),
        max: None,
    },
];

fn parse_digits(s: &str) -> Option<i32> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse::<i32>().ok()
}

/// Recognises `BR<n>L`, `BR<n>`, `<n>L`, `<n>` (case-insensitive).
pub fn parse_lexile(text: &str) -> Option<i32> {
    let upper = text.trim().to_ascii_uppercase();
    if let Some(rest) = upper.strip_prefix("BR") {
        let digits = rest.strip_suffix('L').unwrap_or(rest);
        return parse_digits(digits).map(|n| -n);
    }
    let digits = upper.strip_suffix('L').unwrap_or(&upper);
    parse_digits(digits)
}

pub fn format_lexile(value: i32) -> String {
    if value < 0 {
        format!("BR{}L", value.unsigned_abs())
    } else {
        format!("{}L", value)
    }
}

fn band_index(value: f64) -> usize {
    if value.is_nan() {
        return 0;
    }
    LEXILE_BANDS
        .iter()
        .position(|b| b.contains(value))
        .unwrap_or(LEXILE_BANDS.len() - 1)
}

/// NaN is treated as a Beginning Reader measure.
pub fn get_lexile_band(value: f64) -> &'static LexileBand {
    &LEXILE_BANDS[band_index(value)]
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LexileBandCount {
    pub band: &'static LexileBand,
    pub count: usize,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LexileDistribution {
    pub total: usize,
    pub bands: Vec<LexileBandCount>,
}

pub fn calculate_lexile_distribution(values: &[Option<i32>]) -> LexileDistribution {
    let mut counts = [0_usize; LEXILE_BANDS.len()];
    let mut total = 0_usize;
    for v in values.iter().flatten() {
        counts[band_index(f64::from(*v))] += 1;
        total += 1;
    }
    let bands = LEXILE_BANDS
        .iter()
        .zip(counts)
        .map(|(band, count)| LexileBandCount {
            band,
            count,
            percentage: if total > 0 {
                round_off_1_decimal(100.0 * count as f64 / total as f64)
            } else {
                0.0
            },
        })
        .collect();
    LexileDistribution { total, bands }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LexileStats {
    pub count: usize,
    pub mean: Option<f64>,
    pub median: Option<f64>,
    pub min: Option<i32>,
    pub max: Option<i32>,
    pub std_dev: Option<f64>,
}

pub fn calculate_lexile_stats(values: &[Option<i32>]) -> LexileStats {
    let valid: Vec<i32> = values.iter().flatten().copied().collect();
    let as_f64: Vec<f64> = valid.iter().map(|v| f64::from(*v)).collect();
    LexileStats {
        count: valid.len(),
        mean: mean(&as_f64),
        median: median(&as_f64),
        min: valid.iter().min().copied(),
        max: valid.iter().max().copied(),
        std_dev: population_std_dev(&as_f64),
    }
}
