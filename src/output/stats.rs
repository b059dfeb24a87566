//! Statistics over a finished batch

use crate::{ErrorKind, Outcome};
use std::collections::{BTreeMap, HashMap};

/// Batch statistics summary
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScrapeStatistics {
    /// Number of URLs in the result
    pub total: usize,

    /// URLs that produced an entity
    pub succeeded: usize,

    /// Failure counts by kind
    pub failures_by_kind: BTreeMap<ErrorKind, usize>,
}

impl ScrapeStatistics {
    pub fn failed(&self) -> usize {
        self.failures_by_kind.values().sum()
    }

    /// Percentage of URLs that succeeded; 0 for an empty batch
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.succeeded as f64 / self.total as f64) * 100.0
        }
    }
}

/// Computes statistics from a result mapping
pub fn compute_statistics<E>(results: &HashMap<String, Outcome<E>>) -> ScrapeStatistics {
    let mut stats = ScrapeStatistics {
        total: results.len(),
        ..ScrapeStatistics::default()
    };

    for outcome in results.values() {
        match outcome {
            Ok(_) => stats.succeeded += 1,
            Err(e) => *stats.failures_by_kind.entry(e.kind()).or_insert(0) += 1,
        }
    }

    stats
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &ScrapeStatistics) {
    println!("=== Scrape Statistics ===\n");

    println!("  Total URLs: {}", stats.total);
    println!("  Succeeded: {}", stats.succeeded);
    println!("  Failed: {}", stats.failed());

    if !stats.failures_by_kind.is_empty() {
        println!();
        println!("Failures by Kind:");
        for (kind, count) in &stats.failures_by_kind {
            println!("  {}: {}", kind.label(), count);
        }
    }

    println!();
    println!(
        "Success Rate: {:.1}% ({} / {} URLs)",
        stats.success_rate(),
        stats.succeeded,
        stats.total
    );
}
