//! Conditional growth percentiles.
//!
//! Start and end scores are modelled as bivariate normal. Growth `end - start`
//! is regressed on the start score, so a student is compared with peers who
//! started at the same place rather than with the population mean growth.

use super::error::GrowthError;
use super::normal::z_to_percentile;
use super::norms::NormTable;
use super::types::{Grade, GrowthPeriod, Subject};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrowthNormParams {
    pub start_mean: f64,
    pub end_mean: f64,
    #[serde(rename = "startSd")]
    pub start_standard_deviation: f64,
    #[serde(rename = "endSd")]
    pub end_standard_deviation: f64,
    pub correlation: f64,
}

impl GrowthNormParams {
    /// Start/end term norms of the period joined with its configured correlation.
    pub fn from_norms(
        table: &NormTable,
        grade: Grade,
        subject: Subject,
        period: GrowthPeriod,
    ) -> Option<Self> {
        let start = table.get(grade, period.start(), subject)?;
        let end = table.get(grade, period.end(), subject)?;
        let correlation = table.correlation(grade, subject, period)?;
        Some(Self {
            start_mean: start.mean,
            end_mean: end.mean,
            start_standard_deviation: start.standard_deviation,
            end_standard_deviation: end.standard_deviation,
            correlation,
        })
    }

    pub fn validate(&self) -> Result<(), GrowthError> {
        let all_finite = [
            self.start_mean,
            self.end_mean,
            self.start_standard_deviation,
            self.end_standard_deviation,
            self.correlation,
        ]
        .iter()
        .all(|v| v.is_finite());
        if !all_finite {
            return Err(GrowthError::degenerate("parameters must be finite"));
        }
        if self.start_standard_deviation <= 0.0 {
            return Err(GrowthError::degenerate("startSd must be positive"));
        }
        if self.end_standard_deviation <= 0.0 {
            return Err(GrowthError::degenerate("endSd must be positive"));
        }
        if self.correlation <= -1.0 || self.correlation >= 1.0 {
            return Err(GrowthError::degenerate(
                "correlation must be strictly between -1 and 1",
            ));
        }
        Ok(())
    }
}

/// Distribution of growth conditional on a start score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionalGrowth {
    pub marginal_mean: f64,
    pub marginal_variance: f64,
    pub regression_coefficient: f64,
    pub expected_growth: f64,
    pub conditional_sd: f64,
}

impl ConditionalGrowth {
    pub fn z_score(&self, observed_growth: f64) -> f64 {
        (observed_growth - self.expected_growth) / self.conditional_sd
    }

    pub fn percentile(&self, observed_growth: f64) -> u8 {
        z_to_percentile(self.z_score(observed_growth))
    }
}

pub fn conditional_growth_distribution(
    start_score: f64,
    params: &GrowthNormParams,
) -> Result<ConditionalGrowth, GrowthError> {
    params.validate()?;
    if !start_score.is_finite() {
        return Err(GrowthError::degenerate("startScore must be finite"));
    }
    let s_sd = params.start_standard_deviation;
    let e_sd = params.end_standard_deviation;
    let start_var = s_sd * s_sd;

    let marginal_mean = params.end_mean - params.start_mean;
    let marginal_variance = start_var + e_sd * e_sd - 2.0 * params.correlation * s_sd * e_sd;
    if !marginal_variance.is_finite() || marginal_variance <= 0.0 {
        return Err(GrowthError::degenerate("growth variance is not positive"));
    }

    let covariance = params.correlation * s_sd * e_sd - start_var;
    let beta = covariance / start_var;
    let expected_growth = marginal_mean + beta * (start_score - params.start_mean);
    if !expected_growth.is_finite() {
        return Err(GrowthError::degenerate("expected growth overflows"));
    }

    let r_squared = (covariance * covariance) / (start_var * marginal_variance);
    let conditional_variance = marginal_variance * (1.0 - r_squared);
    if !conditional_variance.is_finite() || conditional_variance <= 0.0 {
        return Err(GrowthError::degenerate(
            "conditional growth variance is not positive",
        ));
    }

    Ok(ConditionalGrowth {
        marginal_mean,
        marginal_variance,
        regression_coefficient: beta,
        expected_growth,
        conditional_sd: conditional_variance.sqrt(),
    })
}

#[allow(dead_code)]
pub fn calculate_conditional_expected_growth(
    start_score: f64,
    params: &GrowthNormParams,
) -> Result<f64, GrowthError> {
    Ok(conditional_growth_distribution(start_score, params)?.expected_growth)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GrowthResult {
    pub percentile: u8,
    pub observed_growth: f64,
    pub expected_growth: f64,
    pub conditional_sd: f64,
    pub z: f64,
}

pub fn conditional_growth(
    start_score: f64,
    end_score: f64,
    params: &GrowthNormParams,
) -> Result<GrowthResult, GrowthError> {
    if !end_score.is_finite() {
        return Err(GrowthError::degenerate("endScore must be finite"));
    }
    let dist = conditional_growth_distribution(start_score, params)?;
    let observed_growth = end_score - start_score;
    let z = dist.z_score(observed_growth);
    if !z.is_finite() {
        return Err(GrowthError::degenerate("growth z-score is not finite"));
    }
    Ok(GrowthResult {
        percentile: dist.percentile(observed_growth),
        observed_growth,
        expected_growth: dist.expected_growth,
        conditional_sd: dist.conditional_sd,
        z,
    })
}

#[allow(dead_code)]
pub fn calculate_conditional_growth_percentile(
    start_score: f64,
    end_score: f64,
    params: &GrowthNormParams,
) -> Result<u8, GrowthError> {
    conditional_growth(start_score, end_score, params).map(|r| r.percentile)
}
