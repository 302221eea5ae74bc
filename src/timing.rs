//! Runtime statistics collection.
//!
//! An explicit collector owned by the caller (no process-global state):
//! `main` creates a [`TimingRegistry`], the hot paths record into it, and
//! one report is printed at exit. The report discards the slowest and
//! fastest tenth of the samples per label so cold caches and scheduler
//! noise do not skew the mean.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::time::{Duration, Instant};

/// Collects labelled runtime samples and summarizes them.
#[derive(Debug, Default)]
pub struct TimingRegistry {
    /// Samples per label, in microseconds.
    samples: HashMap<String, Vec<f64>>,
}

impl TimingRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one sample for `label`.
    pub fn record(&mut self, label: &str, duration: Duration) {
        self.samples
            .entry(label.to_string())
            .or_default()
            .push(duration.as_secs_f64() * 1e6);
    }

    /// Runs `f`, recording its wall-clock time under `label`.
    pub fn time<T>(&mut self, label: &str, f: impl FnOnce() -> T) -> T {
        let start = Instant::now();
        let result = f();
        self.record(label, start.elapsed());
        result
    }

    /// Renders the per-label statistics, labels sorted for stable output.
    pub fn report(&self) -> String {
        let mut out = String::from("Runtimes:\n");
        let mut labels: Vec<&String> = self.samples.keys().collect();
        labels.sort();
        for label in labels {
            let (mean, stddev) = trimmed_stats(&self.samples[label]);
            let _ = writeln!(
                out,
                "  {}: mean {:.1}us (stddev {:.1}us)",
                label, mean, stddev
            );
        }
        out
    }
}

/// Mean and standard deviation with the top and bottom tenth (at least one
/// sample each) dropped when there are more than three samples.
fn trimmed_stats(samples: &[f64]) -> (f64, f64) {
    let mut sorted = samples.to_vec();
    let mut start = 0;
    let mut end = sorted.len();
    if sorted.len() > 3 {
        sorted.sort_by(|a, b| a.partial_cmp(b).expect("durations are finite"));
        let discard = (sorted.len() / 10).max(1);
        start = discard;
        end -= discard;
    }
    let kept = &sorted[start..end];

    let mean = kept.iter().sum::<f64>() / kept.len() as f64;
    let variance = kept.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / kept.len() as f64;
    (mean, variance.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_report() {
        let mut registry = TimingRegistry::new();
        registry.record("step", Duration::from_micros(100));
        registry.record("step", Duration::from_micros(200));

        let report = registry.report();
        assert!(report.starts_with("Runtimes:\n"));
        assert!(report.contains("step: mean 150.0us"));
    }

    #[test]
    fn test_time_returns_closure_result() {
        let mut registry = TimingRegistry::new();
        let value = registry.time("work", || 21 * 2);
        assert_eq!(value, 42);
        assert!(registry.report().contains("work"));
    }

    #[test]
    fn test_few_samples_not_trimmed() {
        let (mean, stddev) = trimmed_stats(&[1.0, 2.0, 3.0]);
        assert!((mean - 2.0).abs() < 1e-12);
        assert!((stddev - (2.0f64 / 3.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_outliers_trimmed() {
        // Ten samples: the 0 and the 1000 are dropped, the rest average 5.
        let mut samples = vec![5.0; 8];
        samples.insert(0, 0.0);
        samples.push(1000.0);

        let (mean, stddev) = trimmed_stats(&samples);
        assert!((mean - 5.0).abs() < 1e-12);
        assert!(stddev.abs() < 1e-12);
    }

    #[test]
    fn test_report_sorted_by_label() {
        let mut registry = TimingRegistry::new();
        registry.record("zeta", Duration::from_micros(1));
        registry.record("alpha", Duration::from_micros(1));

        let report = registry.report();
        let alpha = report.find("alpha").unwrap();
        let zeta = report.find("zeta").unwrap();
        assert!(alpha < zeta);
    }
}
