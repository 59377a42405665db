use serde::{Deserialize, Serialize};

use crate::currency::CurrencyCode;

pub const SETTINGS_ID: &str = "app_settings";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SortOrder {
    Ascending,
    #[default]
    Descending,
}

impl SortOrder {
    /// Mongo sort direction.
    pub fn direction(&self) -> i32 {
        match self {
            SortOrder::Ascending => 1,
            SortOrder::Descending => -1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportSettings {
    #[serde(default = "default_true")]
    pub include_notes: bool,
    #[serde(default = "default_true")]
    pub include_location: bool,
}

fn default_true() -> bool {
    true
}

impl Default for ExportSettings {
    fn default() -> Self {
        ExportSettings {
            include_notes: true,
            include_location: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub base_currency: CurrencyCode,
    #[serde(default)]
    pub export: ExportSettings,
}

impl Default for AppSettings {
    fn default() -> Self {
        AppSettings {
            id: SETTINGS_ID.to_owned(),
            base_currency: CurrencyCode::default(),
            export: ExportSettings::default(),
        }
    }
}
