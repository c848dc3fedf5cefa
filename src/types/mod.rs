//! Type definitions for the bike demand predictor

pub mod feature_record;
pub mod prediction;
pub mod table;

pub use feature_record::{FeatureRecord, WeatherCondition, FEATURE_COUNT, FEATURE_NAMES};
pub use prediction::ManualPrediction;
pub use table::{Cell, Table, TableError};
