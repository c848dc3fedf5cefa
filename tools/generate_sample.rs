//! Sample Upload Generator
//!
//! Writes a CSV of random feature records in the model's column layout, for
//! trying out batch uploads.
//!
//! Usage: generate-sample [OUTPUT] [ROWS] [DROP_COLUMN]
//!
//! Passing DROP_COLUMN leaves that column out, which produces a file the
//! service rejects as not matching the model input.

use anyhow::{bail, Context, Result};
use bike_demand_predictor::types::{FeatureRecord, Table, WeatherCondition, FEATURE_NAMES};
use bike_demand_predictor::ResultExporter;
use chrono::{Datelike, Duration, NaiveDate};
use rand::Rng;
use tracing::info;

/// Random record generator with roughly seasonal weather
struct RecordGenerator {
    rng: rand::rngs::ThreadRng,
    start: NaiveDate,
}

impl RecordGenerator {
    fn new(start: NaiveDate) -> Self {
        Self {
            rng: rand::thread_rng(),
            start,
        }
    }

    fn generate(&mut self, index: usize) -> FeatureRecord {
        let date = self.start + Duration::days((index / 24) as i64);
        let hr = (index % 24) as u8;
        let season = ((date.month0() / 3) % 4 + 1) as u8;
        let weekday = date.weekday().num_days_from_sunday() as u8;
        let holiday = u8::from(self.rng.gen_bool(0.03));
        let workingday = u8::from(holiday == 0 && (1..=5).contains(&weekday));

        let weather = match self.rng.gen_range(0..100) {
            0..=64 => WeatherCondition::Clear,
            65..=89 => WeatherCondition::Mist,
            90..=98 => WeatherCondition::LightSnow,
            _ => WeatherCondition::HeavyRain,
        };
        let [clear, mist, light_snow, heavy_rain] = weather.one_hot();

        let base = match season {
            1 => 0.25,
            2 => 0.55,
            3 => 0.7,
            _ => 0.4,
        };
        let temp: f64 = (base + self.rng.gen_range(-0.15..0.15_f64)).clamp(0.02, 1.0);

        FeatureRecord {
            holiday,
            workingday,
            weathersit_clear: clear,
            weathersit_mist: mist,
            weathersit_light_snow: light_snow,
            weathersit_heavy_rain: heavy_rain,
            season,
            hr,
            weekday,
            temp: round2(temp),
            atemp: round2((temp + self.rng.gen_range(-0.05..0.05)).clamp(0.0, 1.0)),
            hum: round2(self.rng.gen_range(0.2..1.0)),
            windspeed: round2(self.rng.gen_range(0.0..0.5)),
            day: date.day(),
            month: date.month(),
            year: date.year(),
        }
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("generate_sample=info".parse()?),
        )
        .init();

    // Parse arguments
    let args: Vec<String> = std::env::args().collect();
    let output = args.get(1).map(|s| s.as_str()).unwrap_or("sample_upload.csv");
    let rows: usize = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(48);
    let drop_column = args.get(3).map(|s| s.as_str());

    if let Some(column) = drop_column {
        if !FEATURE_NAMES.contains(&column) {
            bail!("Unknown column {:?}; expected one of {:?}", column, FEATURE_NAMES);
        }
    }

    let start = NaiveDate::from_ymd_opt(2012, 1, 1).context("Invalid start date")?;
    let mut generator = RecordGenerator::new(start);

    let keep: Vec<usize> = (0..FEATURE_NAMES.len())
        .filter(|&i| Some(FEATURE_NAMES[i]) != drop_column)
        .collect();
    let mut table = Table::new(keep.iter().map(|&i| FEATURE_NAMES[i].to_string()).collect());
    for index in 0..rows {
        let cells = generator.generate(index).cells();
        table.push_row(keep.iter().map(|&i| cells[i].clone()).collect());
    }

    let bytes = ResultExporter::new(output).to_csv(&table)?;
    std::fs::write(output, bytes).with_context(|| format!("Failed to write {}", output))?;

    info!(
        output = %output,
        rows = rows,
        dropped = ?drop_column,
        "Sample upload written"
    );
    Ok(())
}
