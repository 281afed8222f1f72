use crate::db;
use crate::map::calendar::DEFAULT_ACADEMIC_YEAR_START_MONTH;
use crate::map::norms::{is_valid_academic_year, DEFAULT_FALLBACK_YEAR};
use crate::map::percentile::DEFAULT_STD_ERROR;
use rusqlite::Connection;
use serde::Serialize;
use serde_json::{Map, Value};

pub const SETTINGS_KEY: &str = "analytics";
const MAX_STD_ERROR: f64 = 20.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSettings {
    pub fallback_academic_year: String,
    pub percentile_std_error: f64,
    pub academic_year_start_month: u32,
}

impl Default for AnalyticsSettings {
    fn default() -> Self {
        Self {
            fallback_academic_year: DEFAULT_FALLBACK_YEAR.to_string(),
            percentile_std_error: DEFAULT_STD_ERROR,
            academic_year_start_month: DEFAULT_ACADEMIC_YEAR_START_MONTH,
        }
    }
}

fn apply_field(settings: &mut AnalyticsSettings, key: &str, v: &Value) -> Result<(), String> {
    match key {
        "fallbackAcademicYear" => {
            let s = v
                .as_str()
                .map(str::trim)
                .ok_or_else(|| format!("{} must be string", key))?;
            if !is_valid_academic_year(s) {
                return Err(format!("{} must look like 2025-2026", key));
            }
            settings.fallback_academic_year = s.to_string();
        }
        "percentileStdError" => {
            let n = v
                .as_f64()
                .ok_or_else(|| format!("{} must be a number", key))?;
            if !(n > 0.0 && n <= MAX_STD_ERROR) {
                return Err(format!("{} must be in (0, {}]", key, MAX_STD_ERROR));
            }
            settings.percentile_std_error = n;
        }
        "academicYearStartMonth" => {
            let n = v
                .as_i64()
                .ok_or_else(|| format!("{} must be integer", key))?;
            if !(1..=12).contains(&n) {
                return Err(format!("{} must be in 1..=12", key));
            }
            settings.academic_year_start_month = n as u32;
        }
        _ => return Err(format!("unknown analytics setting: {}", key)),
    }
    Ok(())
}

impl AnalyticsSettings {
    /// All-or-nothing: on error `self` is left untouched.
    pub fn merge_patch(&mut self, patch: &Map<String, Value>) -> Result<(), String> {
        let mut next = self.clone();
        for (k, v) in patch {
            apply_field(&mut next, k, v)?;
        }
        *self = next;
        Ok(())
    }

    /// Stored values are applied field by field; a bad field keeps its default.
    pub fn load(conn: &Connection) -> anyhow::Result<Self> {
        let mut current = Self::default();
        if let Some(saved) = db::settings_get_json(conn, SETTINGS_KEY)? {
            if let Some(obj) = saved.as_object() {
                for (k, v) in obj {
                    if let Err(e) = apply_field(&mut current, k, v) {
                        log::warn!("ignoring stored analytics setting {}: {}", k, e);
                    }
                }
            }
        }
        Ok(current)
    }

    pub fn save(&self, conn: &Connection) -> anyhow::Result<()> {
        db::settings_set_json(conn, SETTINGS_KEY, &serde_json::to_value(self)?)
    }
}
