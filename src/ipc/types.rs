use std::path::PathBuf;

use crate::map::NormRegistry;
use crate::settings::AnalyticsSettings;
use rusqlite::Connection;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

pub struct AppState {
    pub workspace: Option<PathBuf>,
    pub db: Option<Connection>,
    pub norms: NormRegistry,
    pub settings: AnalyticsSettings,
}

impl AppState {
    pub fn new() -> Self {
        let settings = AnalyticsSettings::default();
        let mut norms = NormRegistry::builtin();
        norms.set_fallback_year(settings.fallback_academic_year.clone());
        Self {
            workspace: None,
            db: None,
            norms,
            settings,
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
