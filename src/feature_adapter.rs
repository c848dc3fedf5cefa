//! Feature adaptation for bike demand model inference.
//!
//! Turns form input into a [`FeatureRecord`] laid out the way the regressor
//! was trained, and hands uploaded tables through untouched.

use crate::types::feature_record::{FeatureRecord, WeatherCondition, FEATURE_COUNT, FEATURE_NAMES};
use crate::types::table::Table;
use chrono::{Datelike, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Rejections raised while building a record from manual input
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AdapterError {
    #[error("unknown weather condition {0:?}; expected one of Clear, Mist, Light Snow, Heavy Rain")]
    UnknownWeather(String),

    #[error("{field} = {value} is outside {range}")]
    OutOfRange {
        field: &'static str,
        value: String,
        range: &'static str,
    },

    #[error("{field} must be a finite number")]
    NotFinite { field: &'static str },
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Raw values from the manual input form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManualInput {
    #[serde(default = "today")]
    pub date: NaiveDate,
    pub holiday: i64,
    pub workingday: i64,
    pub weather: String,
    pub season: i64,
    #[serde(alias = "hour")]
    pub hr: i64,
    pub weekday: i64,
    pub temp: f64,
    /// Feels-like temperature
    pub atemp: f64,
    #[serde(alias = "humidity")]
    pub hum: f64,
    pub windspeed: f64,
}

impl ManualInput {
    /// Form defaults: today's date, clear weather, spring, everything else zero.
    pub fn defaults_for(date: NaiveDate) -> Self {
        Self {
            date,
            holiday: 0,
            workingday: 0,
            weather: WeatherCondition::Clear.label().to_string(),
            season: 1,
            hr: 0,
            weekday: 0,
            temp: 0.0,
            atemp: 0.0,
            hum: 0.0,
            windspeed: 0.0,
        }
    }
}

impl Default for ManualInput {
    fn default() -> Self {
        Self::defaults_for(today())
    }
}

fn check_range(
    field: &'static str,
    value: i64,
    min: i64,
    max: i64,
    range: &'static str,
) -> Result<u8, AdapterError> {
    if (min..=max).contains(&value) {
        // bounds are all within u8
        Ok(value as u8)
    } else {
        Err(AdapterError::OutOfRange {
            field,
            value: value.to_string(),
            range,
        })
    }
}

fn check_finite(field: &'static str, value: f64) -> Result<f64, AdapterError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(AdapterError::NotFinite { field })
    }
}

/// Maps form values or uploaded tables onto the model's input layout.
pub struct FeatureAdapter;

impl FeatureAdapter {
    pub fn new() -> Self {
        Self
    }

    /// Build the single record for a manual submission.
    ///
    /// Integer fields are checked against the form domains, the weather label
    /// must be one of the four form labels, and the date is split into
    /// day/month/year on the local calendar.
    pub fn from_manual(&self, input: &ManualInput) -> Result<FeatureRecord, AdapterError> {
        let weather = WeatherCondition::from_label(&input.weather)
            .ok_or_else(|| AdapterError::UnknownWeather(input.weather.clone()))?;
        let [clear, mist, light_snow, heavy_rain] = weather.one_hot();

        let hum = check_finite("hum", input.hum)?;
        if !(0.0..=1.0).contains(&hum) {
            return Err(AdapterError::OutOfRange {
                field: "hum",
                value: hum.to_string(),
                range: "[0.0, 1.0]",
            });
        }

        Ok(FeatureRecord {
            holiday: check_range("holiday", input.holiday, 0, 1, "{0, 1}")?,
            workingday: check_range("workingday", input.workingday, 0, 1, "{0, 1}")?,
            weathersit_clear: clear,
            weathersit_mist: mist,
            weathersit_light_snow: light_snow,
            weathersit_heavy_rain: heavy_rain,
            season: check_range("season", input.season, 1, 4, "{1, 2, 3, 4}")?,
            hr: check_range("hr", input.hr, 0, 23, "[0, 23]")?,
            weekday: check_range("weekday", input.weekday, 0, 6, "[0, 6]")?,
            temp: check_finite("temp", input.temp)?,
            atemp: check_finite("atemp", input.atemp)?,
            hum,
            windspeed: check_finite("windspeed", input.windspeed)?,
            day: input.date.day(),
            month: input.date.month(),
            year: input.date.year(),
        })
    }

    /// Uploaded tables go to inference as-is; the schema is checked there.
    pub fn from_table(&self, table: Table) -> Table {
        table
    }

    /// Get the number of features produced.
    pub fn feature_count(&self) -> usize {
        FEATURE_COUNT
    }

    /// Get feature names in training order.
    pub fn feature_names(&self) -> Vec<&'static str> {
        FEATURE_NAMES.to_vec()
    }
}

impl Default for FeatureAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::table::Cell;

    fn sample_input() -> ManualInput {
        ManualInput {
            date: NaiveDate::from_ymd_opt(2012, 7, 4).unwrap(),
            holiday: 1,
            workingday: 0,
            weather: "Mist".to_string(),
            season: 3,
            hr: 17,
            weekday: 3,
            temp: 0.74,
            atemp: 0.69,
            hum: 0.55,
            windspeed: 0.19,
        }
    }

    #[test]
    fn test_manual_record_fields() {
        let adapter = FeatureAdapter::new();
        let record = adapter.from_manual(&sample_input()).unwrap();

        assert_eq!(record.holiday, 1);
        assert_eq!(record.workingday, 0);
        assert_eq!(record.weather_indicators(), [0, 1, 0, 0]);
        assert_eq!(record.season, 3);
        assert_eq!(record.hr, 17);
        assert_eq!(record.weekday, 3);
        assert_eq!(record.temp, 0.74);
        assert_eq!(record.hum, 0.55);
        assert_eq!((record.day, record.month, record.year), (4, 7, 2012));
        assert_eq!(record.cells().len(), adapter.feature_count());
    }

    #[test]
    fn test_every_known_label_sets_exactly_one_indicator() {
        let adapter = FeatureAdapter::new();
        for weather in WeatherCondition::ALL {
            let mut input = sample_input();
            input.weather = weather.label().to_string();
            let record = adapter.from_manual(&input).unwrap();
            let indicators = record.weather_indicators();
            assert_eq!(indicators.iter().map(|&v| v as u32).sum::<u32>(), 1);
            assert_eq!(indicators, weather.one_hot());
        }
    }

    #[test]
    fn test_unknown_weather_rejected() {
        let mut input = sample_input();
        input.weather = "Sunny".to_string();
        let err = FeatureAdapter::new().from_manual(&input).unwrap_err();
        assert_eq!(err, AdapterError::UnknownWeather("Sunny".to_string()));
    }

    #[test]
    fn test_out_of_range_fields_rejected() {
        let adapter = FeatureAdapter::new();

        let mut input = sample_input();
        input.hr = 24;
        assert!(matches!(
            adapter.from_manual(&input),
            Err(AdapterError::OutOfRange { field: "hr", .. })
        ));

        let mut input = sample_input();
        input.season = 0;
        assert!(matches!(
            adapter.from_manual(&input),
            Err(AdapterError::OutOfRange { field: "season", .. })
        ));

        let mut input = sample_input();
        input.hum = 1.2;
        assert!(matches!(
            adapter.from_manual(&input),
            Err(AdapterError::OutOfRange { field: "hum", .. })
        ));

        let mut input = sample_input();
        input.temp = f64::NAN;
        assert_eq!(
            adapter.from_manual(&input),
            Err(AdapterError::NotFinite { field: "temp" })
        );
    }

    #[test]
    fn test_unconstrained_measurements_pass_through() {
        let mut input = sample_input();
        input.temp = -12.5;
        input.atemp = 41.0;
        input.windspeed = 67.0;
        let record = FeatureAdapter::new().from_manual(&input).unwrap();
        assert_eq!((record.temp, record.atemp, record.windspeed), (-12.5, 41.0, 67.0));
    }

    #[test]
    fn test_date_decomposition_is_stable() {
        let adapter = FeatureAdapter::new();
        let mut input = sample_input();
        input.date = NaiveDate::from_ymd_opt(2011, 12, 31).unwrap();
        let first = adapter.from_manual(&input).unwrap();
        let second = adapter.from_manual(&input).unwrap();
        assert_eq!((first.day, first.month, first.year), (31, 12, 2011));
        assert_eq!(first, second);
    }

    #[test]
    fn test_table_passthrough() {
        let mut table = Table::new(vec!["zeta".into(), "alpha".into()]);
        table.push_row(vec![Cell::Text("x".into()), Cell::Int(1)]);
        let passed = FeatureAdapter::new().from_table(table.clone());
        assert_eq!(passed, table);
    }

    #[test]
    fn test_manual_input_from_form_fields() {
        let input: ManualInput = serde_json::from_value(serde_json::json!({
            "date": "2012-01-15",
            "holiday": 0,
            "workingday": 1,
            "weather": "Light Snow",
            "season": 1,
            "hour": 6,
            "weekday": 0,
            "temp": 0.2,
            "atemp": 0.18,
            "humidity": 0.8,
            "windspeed": 0.3
        }))
        .unwrap();
        assert_eq!(input.hr, 6);
        assert_eq!(input.hum, 0.8);
        assert_eq!(input.date, NaiveDate::from_ymd_opt(2012, 1, 15).unwrap());
    }
}
