//! Standard normal CDF shared by the percentile and growth calculators.

const A1: f64 = 0.254829592;
const A2: f64 = -0.284496736;
const A3: f64 = 1.421413741;
const A4: f64 = -1.453152027;
const A5: f64 = 1.061405429;
const P: f64 = 0.3275911;

/// Abramowitz & Stegun 7.1.26 approximation of Φ(z). Absolute error < 1.5e-7.
pub fn normal_cdf(z: f64) -> f64 {
    let sign = if z < 0.0 { -1.0 } else { 1.0 };
    let x = z.abs() / std::f64::consts::SQRT_2;
    let t = 1.0 / (1.0 + P * x);
    let poly = ((((A5 * t + A4) * t + A3) * t + A2) * t + A1) * t;
    let erf = 1.0 - poly * (-x * x).exp();
    0.5 * (1.0 + sign * erf)
}

/// `round(Φ(z) * 100)` clamped to 1..=99. NaN has no rank and maps to 50.
pub fn z_to_percentile(z: f64) -> u8 {
    if z.is_nan() {
        return 50;
    }
    let p = (normal_cdf(z) * 100.0).round();
    p.clamp(1.0, 99.0) as u8
}
