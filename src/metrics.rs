//! Performance metrics and statistics tracking for the prediction service.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::{Duration, Instant};
use tracing::info;

/// Width of a prediction histogram bucket, in rentals
const BUCKET_WIDTH: i64 = 100;
const BUCKETS: usize = 10;

/// Metrics collector for request handling
pub struct PredictionMetrics {
    /// Manual predictions served
    pub manual_predictions: AtomicU64,
    /// Batch uploads that produced a result table
    pub batch_uploads: AtomicU64,
    /// Rows predicted across all batch uploads
    pub batch_rows: AtomicU64,
    /// Uploads refused for format or schema problems
    pub rejected_uploads: AtomicU64,
    /// Inference times (in microseconds)
    inference_times: RwLock<Vec<u64>>,
    /// Predicted rental counts, bucketed by hundreds; the last bucket is open-ended
    prediction_buckets: RwLock<[u64; BUCKETS]>,
    start_time: Instant,
}

impl PredictionMetrics {
    pub fn new() -> Self {
        Self {
            manual_predictions: AtomicU64::new(0),
            batch_uploads: AtomicU64::new(0),
            batch_rows: AtomicU64::new(0),
            rejected_uploads: AtomicU64::new(0),
            inference_times: RwLock::new(Vec::with_capacity(1000)),
            prediction_buckets: RwLock::new([0; BUCKETS]),
            start_time: Instant::now(),
        }
    }

    fn record_time(&self, duration: Duration) {
        if let Ok(mut times) = self.inference_times.write() {
            times.push(duration.as_micros() as u64);
            // Keep only last 10000 for memory efficiency
            if times.len() > 10000 {
                times.drain(0..5000);
            }
        }
    }

    fn record_predictions(&self, predictions: &[i64]) {
        if let Ok(mut buckets) = self.prediction_buckets.write() {
            for &p in predictions {
                let bucket = (p.max(0) / BUCKET_WIDTH).min(BUCKETS as i64 - 1) as usize;
                buckets[bucket] += 1;
            }
        }
    }

    /// Record a served manual prediction
    pub fn record_manual(&self, duration: Duration, prediction: i64) {
        self.manual_predictions.fetch_add(1, Ordering::Relaxed);
        self.record_time(duration);
        self.record_predictions(&[prediction]);
    }

    /// Record a completed batch upload
    pub fn record_batch(&self, duration: Duration, predictions: &[i64]) {
        self.batch_uploads.fetch_add(1, Ordering::Relaxed);
        self.batch_rows
            .fetch_add(predictions.len() as u64, Ordering::Relaxed);
        self.record_time(duration);
        self.record_predictions(predictions);
    }

    /// Record an upload refused for its format or schema
    pub fn record_rejection(&self) {
        self.rejected_uploads.fetch_add(1, Ordering::Relaxed);
    }

    /// Get inference time statistics
    pub fn get_inference_stats(&self) -> InferenceStats {
        let sorted = match self.inference_times.read() {
            Ok(times) if !times.is_empty() => {
                let mut sorted = times.clone();
                sorted.sort_unstable();
                sorted
            }
            _ => return InferenceStats::default(),
        };

        let sum: u64 = sorted.iter().sum();
        let count = sorted.len();

        InferenceStats {
            count: count as u64,
            mean_us: sum / count as u64,
            p50_us: sorted[count / 2],
            p95_us: sorted[(count as f64 * 0.95) as usize],
            p99_us: sorted[(count as f64 * 0.99) as usize],
            max_us: *sorted.last().unwrap_or(&0),
        }
    }

    /// Get the prediction histogram
    pub fn get_prediction_distribution(&self) -> [u64; BUCKETS] {
        self.prediction_buckets
            .read()
            .map(|buckets| *buckets)
            .unwrap_or([0; BUCKETS])
    }

    /// Point-in-time copy for status output
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            uptime_secs: self.start_time.elapsed().as_secs(),
            manual_predictions: self.manual_predictions.load(Ordering::Relaxed),
            batch_uploads: self.batch_uploads.load(Ordering::Relaxed),
            batch_rows: self.batch_rows.load(Ordering::Relaxed),
            rejected_uploads: self.rejected_uploads.load(Ordering::Relaxed),
            inference: self.get_inference_stats(),
            prediction_distribution: self.get_prediction_distribution(),
        }
    }

    /// Print summary statistics
    pub fn print_summary(&self) {
        let snapshot = self.snapshot();
        let inference = &snapshot.inference;

        info!("╔══════════════════════════════════════════════════════════════╗");
        info!("║            BIKE DEMAND PREDICTOR - METRICS SUMMARY           ║");
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!(
            "║ Manual Predictions: {:>8}  │  Uptime: {:>10}s           ║",
            snapshot.manual_predictions, snapshot.uptime_secs
        );
        info!(
            "║ Batch Uploads:      {:>8}  │  Rows: {:>10}             ║",
            snapshot.batch_uploads, snapshot.batch_rows
        );
        info!(
            "║ Rejected Uploads:   {:>8}                                 ║",
            snapshot.rejected_uploads
        );
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!(
            "║ Inference Time (μs): mean={:>5} p50={:>5} p95={:>5} p99={:>5} ║",
            inference.mean_us, inference.p50_us, inference.p95_us, inference.p99_us
        );
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!("║ Predicted Rentals Distribution:                              ║");
        let total: u64 = snapshot.prediction_distribution.iter().sum();
        for (i, &count) in snapshot.prediction_distribution.iter().enumerate() {
            let pct = if total > 0 { (count as f64 / total as f64) * 100.0 } else { 0.0 };
            let bar: String = "█".repeat(((pct / 2.0) as usize).min(20));
            let lo = i as i64 * BUCKET_WIDTH;
            let label = if i == BUCKETS - 1 {
                format!("{}+", lo)
            } else {
                format!("{}-{}", lo, lo + BUCKET_WIDTH - 1)
            };
            info!("║   {:>8}: {:>6} ({:>5.1}%) {}", label, count, pct, bar);
        }
        info!("╚══════════════════════════════════════════════════════════════╝");
    }
}

impl Default for PredictionMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Inference time statistics
#[derive(Debug, Default, Clone, Serialize)]
pub struct InferenceStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}

/// Serializable view of the counters
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub uptime_secs: u64,
    pub manual_predictions: u64,
    pub batch_uploads: u64,
    pub batch_rows: u64,
    pub rejected_uploads: u64,
    pub inference: InferenceStats,
    pub prediction_distribution: [u64; BUCKETS],
}

/// Periodic metrics reporter that logs summaries
pub struct MetricsReporter {
    metrics: std::sync::Arc<PredictionMetrics>,
    interval_secs: u64,
}

impl MetricsReporter {
    pub fn new(metrics: std::sync::Arc<PredictionMetrics>, interval_secs: u64) -> Self {
        Self {
            metrics,
            interval_secs,
        }
    }

    /// Start the periodic reporting task
    pub async fn start(self) {
        let mut interval = tokio::time::interval(Duration::from_secs(self.interval_secs));
        // the first tick completes immediately
        interval.tick().await;
        loop {
            interval.tick().await;
            self.metrics.print_summary();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_recording() {
        let metrics = PredictionMetrics::new();

        metrics.record_manual(Duration::from_micros(100), 42);
        metrics.record_batch(Duration::from_micros(300), &[10, 250, 1999]);
        metrics.record_rejection();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.manual_predictions, 1);
        assert_eq!(snapshot.batch_uploads, 1);
        assert_eq!(snapshot.batch_rows, 3);
        assert_eq!(snapshot.rejected_uploads, 1);
        assert_eq!(snapshot.inference.count, 2);
        assert_eq!(snapshot.inference.max_us, 300);
    }

    #[test]
    fn test_prediction_distribution() {
        let metrics = PredictionMetrics::new();
        metrics.record_batch(Duration::from_micros(1), &[-5, 0, 99, 100, 5000]);

        let dist = metrics.get_prediction_distribution();
        assert_eq!(dist[0], 3);
        assert_eq!(dist[1], 1);
        assert_eq!(dist[BUCKETS - 1], 1);
    }

    #[test]
    fn test_empty_stats() {
        let stats = PredictionMetrics::new().get_inference_stats();
        assert_eq!(stats.count, 0);
        assert_eq!(stats.mean_us, 0);
    }
}
