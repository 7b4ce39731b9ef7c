//! Static benchmark table: target values per metric, keyed by funnel stage.

use adpulse_core::config::BenchmarkConfig;
use adpulse_core::types::{FunnelStage, MetricKind};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Whether a larger value is favorable for a metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// CTR, ROAS.
    HigherIsBetter,
    /// CPL, CPC.
    LowerIsBetter,
}

impl Direction {
    pub fn for_metric(kind: MetricKind) -> Direction {
        match kind {
            MetricKind::Ctr | MetricKind::Roas => Direction::HigherIsBetter,
            MetricKind::Cpl | MetricKind::Cpc => Direction::LowerIsBetter,
        }
    }
}

/// A single benchmark entry: the target value and its favorable direction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Benchmark {
    pub target: f64,
    pub direction: Direction,
}

/// Immutable lookup of benchmarks per (metric, funnel stage). Built once
/// from configuration; swapping targets is a config change, never a
/// runtime mutation.
#[derive(Debug, Clone)]
pub struct BenchmarkRegistry {
    table: HashMap<(MetricKind, FunnelStage), Benchmark>,
}

impl BenchmarkRegistry {
    pub fn from_config(config: &BenchmarkConfig) -> Self {
        let mut table = HashMap::new();
        for (stage, targets) in [
            (FunnelStage::Top, &config.top),
            (FunnelStage::Bottom, &config.bottom),
        ] {
            for (kind, target) in [
                (MetricKind::Ctr, targets.ctr),
                (MetricKind::Cpl, targets.cpl),
                (MetricKind::Cpc, targets.cpc),
                (MetricKind::Roas, targets.roas),
            ] {
                if let Some(target) = target {
                    table.insert(
                        (kind, stage),
                        Benchmark {
                            target,
                            direction: Direction::for_metric(kind),
                        },
                    );
                }
            }
        }
        Self { table }
    }

    /// Look up the benchmark for a metric at a funnel stage, if one is
    /// configured.
    pub fn get(&self, kind: MetricKind, stage: FunnelStage) -> Option<Benchmark> {
        self.table.get(&(kind, stage)).copied()
    }
}

impl Default for BenchmarkRegistry {
    fn default() -> Self {
        Self::from_config(&BenchmarkConfig::default())
    }
}
