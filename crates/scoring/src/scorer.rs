//! Campaign health scoring: per-metric status against benchmarks plus an
//! aggregate 0-100 score with a letter grade.

use crate::benchmark::{Benchmark, BenchmarkRegistry, Direction};
use adpulse_core::config::ScoringConfig;
use adpulse_core::types::{FunnelStage, MetricKind, NormalizedMetrics};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// How a single metric compares to its benchmark. Ordered worst to best so
/// that status comparisons read naturally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricStatus {
    Poor,
    Medium,
    Good,
}

impl MetricStatus {
    /// Sub-score contributed to the weighted aggregate.
    pub fn points(&self) -> f64 {
        match self {
            MetricStatus::Good => 100.0,
            MetricStatus::Medium => 50.0,
            MetricStatus::Poor => 0.0,
        }
    }
}

/// Letter grade, mapped from points by a fixed step function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    /// Step-function mapping: points at or above each cutoff take that
    /// grade, below the last cutoff is an F.
    pub fn from_points(points: u8, cutoffs: &[u8; 4]) -> Grade {
        let [a, b, c, d] = *cutoffs;
        if points >= a {
            Grade::A
        } else if points >= b {
            Grade::B
        } else if points >= c {
            Grade::C
        } else if points >= d {
            Grade::D
        } else {
            Grade::F
        }
    }
}

/// One line of the score breakdown. Only metrics that were defined for the
/// period appear; undefined metrics are excluded, never scored as poor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricAssessment {
    pub metric: MetricKind,
    pub value: f64,
    pub benchmark: f64,
    pub status: MetricStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub grade: Grade,
    pub points: u8,
    pub breakdown: Vec<MetricAssessment>,
}

/// Outcome of scoring a campaign. A campaign with no defined metric at all
/// (no activity in the period) yields `NoData`, not a numeric score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ScoreOutcome {
    Scored(ScoreResult),
    NoData,
}

/// Compares normalized campaign metrics to the benchmark set for the
/// campaign's funnel stage.
pub struct CampaignScorer {
    registry: BenchmarkRegistry,
    config: ScoringConfig,
}

impl CampaignScorer {
    pub fn new(registry: BenchmarkRegistry, config: ScoringConfig) -> Self {
        Self { registry, config }
    }

    /// Score one campaign's period metrics.
    pub fn score(&self, metrics: &NormalizedMetrics, stage: FunnelStage) -> ScoreOutcome {
        let mut breakdown = Vec::new();
        let mut weighted_sum = 0.0;
        let mut total_weight = 0.0;

        for &kind in stage.scored_metrics() {
            let benchmark = match self.registry.get(kind, stage) {
                Some(b) => b,
                None => continue,
            };
            // Undefined metrics drop out; their weight is redistributed by
            // normalizing over the weights that remain.
            let value = match metrics.get(kind) {
                Some(v) => v,
                None => continue,
            };

            let status = classify(value, benchmark, self.config.tolerance);
            let weight = self.config.weights.get(kind);
            weighted_sum += status.points() * weight;
            total_weight += weight;
            breakdown.push(MetricAssessment {
                metric: kind,
                value,
                benchmark: benchmark.target,
                status,
            });
        }

        if breakdown.is_empty() {
            debug!(stage = ?stage, "No defined metrics for period, returning no-data");
            return ScoreOutcome::NoData;
        }

        let points = round_points(weighted_sum / total_weight);
        let grade = Grade::from_points(points, &self.config.grade_cutoffs);
        ScoreOutcome::Scored(ScoreResult {
            grade,
            points,
            breakdown,
        })
    }
}

/// Direction-aware status classification with a tolerance band around the
/// target (expressed as a fraction of the target).
pub fn classify(value: f64, benchmark: Benchmark, tolerance: f64) -> MetricStatus {
    let target = benchmark.target;
    match benchmark.direction {
        Direction::HigherIsBetter => {
            if value >= target {
                MetricStatus::Good
            } else if value >= target * (1.0 - tolerance) {
                MetricStatus::Medium
            } else {
                MetricStatus::Poor
            }
        }
        Direction::LowerIsBetter => {
            if value <= target {
                MetricStatus::Good
            } else if value <= target * (1.0 + tolerance) {
                MetricStatus::Medium
            } else {
                MetricStatus::Poor
            }
        }
    }
}

/// Round to integer points; exact half-points round down so a borderline
/// campaign takes the stricter grade.
fn round_points(raw: f64) -> u8 {
    let clamped = raw.clamp(0.0, 100.0);
    let rounded = if (clamped.fract() - 0.5).abs() < 1e-9 {
        clamped.floor()
    } else {
        clamped.round()
    };
    rounded as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use adpulse_core::config::BenchmarkConfig;

    fn scorer() -> CampaignScorer {
        CampaignScorer::new(
            BenchmarkRegistry::from_config(&BenchmarkConfig::default()),
            ScoringConfig::default(),
        )
    }

    fn metrics(
        ctr: Option<f64>,
        cpl: Option<f64>,
        cpc: Option<f64>,
        roas: Option<f64>,
    ) -> NormalizedMetrics {
        NormalizedMetrics {
            ctr,
            cpl,
            cpc,
            roas,
        }
    }

    // 1. Per-metric classification ------------------------------------------

    #[test]
    fn test_higher_is_better_above_target_is_good() {
        // Top funnel, CTR 2.5% against a 1.5% target.
        let b = Benchmark {
            target: 1.5,
            direction: Direction::HigherIsBetter,
        };
        assert_eq!(classify(2.5, b, 0.2), MetricStatus::Good);
    }

    #[test]
    fn test_lower_is_better_above_ceiling_is_poor() {
        // Bottom funnel, CPL 40 against a 35 ceiling with 20% tolerance:
        // 40 < 42, so this lands in the medium band.
        let b = Benchmark {
            target: 35.0,
            direction: Direction::LowerIsBetter,
        };
        assert_eq!(classify(40.0, b, 0.2), MetricStatus::Medium);
        // Beyond the band it is poor.
        assert_eq!(classify(43.0, b, 0.2), MetricStatus::Poor);
        assert_eq!(classify(40.0, b, 0.1), MetricStatus::Poor);
    }

    #[test]
    fn test_status_monotone_in_value() {
        let b = Benchmark {
            target: 2.0,
            direction: Direction::HigherIsBetter,
        };
        let mut last = MetricStatus::Poor;
        for v in [0.5, 1.0, 1.7, 1.9, 2.0, 3.0, 10.0] {
            let status = classify(v, b, 0.2);
            assert!(status >= last, "status regressed at value {v}");
            last = status;
        }
    }

    // 2. Aggregate scoring --------------------------------------------------

    #[test]
    fn test_all_good_scores_100_grade_a() {
        let outcome = scorer().score(
            &metrics(None, Some(20.0), Some(1.0), Some(6.0)),
            FunnelStage::Bottom,
        );
        match outcome {
            ScoreOutcome::Scored(result) => {
                assert_eq!(result.points, 100);
                assert_eq!(result.grade, Grade::A);
                assert_eq!(result.breakdown.len(), 3);
                assert!(result
                    .breakdown
                    .iter()
                    .all(|a| a.status == MetricStatus::Good));
            }
            ScoreOutcome::NoData => panic!("expected a score"),
        }
    }

    #[test]
    fn test_undefined_metric_weight_redistributed() {
        // ROAS undefined (no spend recorded as sale_value): score is the
        // average of the two remaining metrics, not dragged down by the
        // missing one.
        let outcome = scorer().score(
            &metrics(None, Some(20.0), Some(5.0), None),
            FunnelStage::Bottom,
        );
        match outcome {
            ScoreOutcome::Scored(result) => {
                assert_eq!(result.breakdown.len(), 2);
                // good (100) + poor (0), equal weights -> 50 points.
                assert_eq!(result.points, 50);
                assert_eq!(result.grade, Grade::D);
            }
            ScoreOutcome::NoData => panic!("expected a score"),
        }
    }

    #[test]
    fn test_all_undefined_returns_no_data() {
        let outcome = scorer().score(&metrics(None, None, None, None), FunnelStage::Bottom);
        assert_eq!(outcome, ScoreOutcome::NoData);
    }

    #[test]
    fn test_points_within_bounds() {
        let cases = [
            metrics(Some(0.1), None, Some(9.0), None),
            metrics(Some(5.0), None, Some(0.5), None),
            metrics(None, Some(100.0), Some(3.0), Some(0.2)),
        ];
        for m in cases {
            for stage in [FunnelStage::Top, FunnelStage::Bottom] {
                if let ScoreOutcome::Scored(result) = scorer().score(&m, stage) {
                    assert!(result.points <= 100);
                }
            }
        }
    }

    // 3. Grade mapping ------------------------------------------------------

    #[test]
    fn test_grade_step_function() {
        let cutoffs = [90, 75, 60, 50];
        assert_eq!(Grade::from_points(100, &cutoffs), Grade::A);
        assert_eq!(Grade::from_points(90, &cutoffs), Grade::A);
        assert_eq!(Grade::from_points(89, &cutoffs), Grade::B);
        assert_eq!(Grade::from_points(60, &cutoffs), Grade::C);
        assert_eq!(Grade::from_points(50, &cutoffs), Grade::D);
        assert_eq!(Grade::from_points(49, &cutoffs), Grade::F);
        assert_eq!(Grade::from_points(0, &cutoffs), Grade::F);
    }

    #[test]
    fn test_grade_monotone_in_points() {
        let cutoffs = [90, 75, 60, 50];
        let mut last = Grade::F;
        for p in 0..=100u8 {
            let grade = Grade::from_points(p, &cutoffs);
            // Grade derives Ord with A < B < ... < F, so "never worse" is <=.
            assert!(grade <= last, "grade got worse at {p} points");
            last = grade;
        }
    }

    #[test]
    fn test_half_point_rounds_to_stricter_grade() {
        assert_eq!(round_points(89.5), 89);
        assert_eq!(round_points(89.6), 90);
        assert_eq!(round_points(100.0), 100);
    }
}
