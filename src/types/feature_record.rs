//! Model input row for the bike demand regressor

use crate::types::table::{Cell, Table};
use serde::{Deserialize, Serialize};

/// Number of features the regressor was trained on
pub const FEATURE_COUNT: usize = 16;

/// Canonical feature column names, in training order.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "holiday",
    "workingday",
    "weathersit_Clear",
    "weathersit_Mist",
    "weathersit_LightSnow",
    "weathersit_HeavyRain",
    "season",
    "hr",
    "weekday",
    "temp",
    "atemp",
    "hum",
    "windspeed",
    "day",
    "month",
    "year",
];

/// Weather situation as offered by the manual input form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WeatherCondition {
    Clear,
    Mist,
    #[serde(rename = "Light Snow")]
    LightSnow,
    #[serde(rename = "Heavy Rain")]
    HeavyRain,
}

impl WeatherCondition {
    /// All conditions in one-hot column order
    pub const ALL: [WeatherCondition; 4] = [
        WeatherCondition::Clear,
        WeatherCondition::Mist,
        WeatherCondition::LightSnow,
        WeatherCondition::HeavyRain,
    ];

    /// Exact, case-sensitive match against the form labels.
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|w| w.label() == label)
    }

    /// Label shown in the form
    pub fn label(&self) -> &'static str {
        match self {
            WeatherCondition::Clear => "Clear",
            WeatherCondition::Mist => "Mist",
            WeatherCondition::LightSnow => "Light Snow",
            WeatherCondition::HeavyRain => "Heavy Rain",
        }
    }

    /// One-hot indicators in `weathersit_*` column order
    pub fn one_hot(&self) -> [u8; 4] {
        let mut indicators = [0; 4];
        let position = Self::ALL
            .iter()
            .position(|w| w == self)
            .unwrap_or_default();
        indicators[position] = 1;
        indicators
    }
}

/// Expand a raw weather label into the four `weathersit_*` indicators.
///
/// Labels outside the closed set encode as all zeros. Callers that build
/// records for the model should reject such labels first, see
/// [`crate::feature_adapter::FeatureAdapter::from_manual`].
pub fn encode_weather(label: &str) -> [u8; 4] {
    WeatherCondition::from_label(label)
        .map(|w| w.one_hot())
        .unwrap_or([0; 4])
}

/// One row of model-ready input.
///
/// Field order matches [`FEATURE_NAMES`]. Serialized names are the model's
/// column names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
    pub holiday: u8,
    pub workingday: u8,
    #[serde(rename = "weathersit_Clear")]
    pub weathersit_clear: u8,
    #[serde(rename = "weathersit_Mist")]
    pub weathersit_mist: u8,
    #[serde(rename = "weathersit_LightSnow")]
    pub weathersit_light_snow: u8,
    #[serde(rename = "weathersit_HeavyRain")]
    pub weathersit_heavy_rain: u8,
    pub season: u8,
    pub hr: u8,
    pub weekday: u8,
    pub temp: f64,
    pub atemp: f64,
    pub hum: f64,
    pub windspeed: f64,
    pub day: u32,
    pub month: u32,
    pub year: i32,
}

impl FeatureRecord {
    /// Cell values in [`FEATURE_NAMES`] order
    pub fn cells(&self) -> Vec<Cell> {
        vec![
            Cell::Int(self.holiday.into()),
            Cell::Int(self.workingday.into()),
            Cell::Int(self.weathersit_clear.into()),
            Cell::Int(self.weathersit_mist.into()),
            Cell::Int(self.weathersit_light_snow.into()),
            Cell::Int(self.weathersit_heavy_rain.into()),
            Cell::Int(self.season.into()),
            Cell::Int(self.hr.into()),
            Cell::Int(self.weekday.into()),
            Cell::Float(self.temp),
            Cell::Float(self.atemp),
            Cell::Float(self.hum),
            Cell::Float(self.windspeed),
            Cell::Int(self.day.into()),
            Cell::Int(self.month.into()),
            Cell::Int(self.year.into()),
        ]
    }

    /// Single-row table with the canonical column names
    pub fn to_table(&self) -> Table {
        let mut table = Table::new(FEATURE_NAMES.iter().map(|n| n.to_string()).collect());
        table.push_row(self.cells());
        table
    }

    /// The four weather indicators in column order
    pub fn weather_indicators(&self) -> [u8; 4] {
        [
            self.weathersit_clear,
            self.weathersit_mist,
            self.weathersit_light_snow,
            self.weathersit_heavy_rain,
        ]
    }
}
