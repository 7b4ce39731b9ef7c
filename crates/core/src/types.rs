use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Raw counters for one campaign/creative/keyword over one reporting period.
/// Rows are produced by the ingestion pipeline; this engine only reads them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricSet {
    pub impressions: u64,
    pub clicks: u64,
    pub leads: u64,
    pub sales: u64,
    pub spend: f64,
    pub sale_value: f64,
}

impl MetricSet {
    /// Derive the ratio metrics with undefined-safe division.
    pub fn normalized(&self) -> NormalizedMetrics {
        NormalizedMetrics {
            ctr: ratio(self.clicks as f64 * 100.0, self.impressions as f64),
            cpl: ratio(self.spend, self.leads as f64),
            cpc: ratio(self.spend, self.clicks as f64),
            roas: ratio(self.sale_value, self.spend),
        }
    }

    /// True when the row recorded no activity at all.
    pub fn is_empty(&self) -> bool {
        self.impressions == 0 && self.clicks == 0 && self.spend == 0.0
    }

    /// Sum two rows counter-by-counter (e.g. daily rows into a window total).
    pub fn merge(&self, other: &MetricSet) -> MetricSet {
        MetricSet {
            impressions: self.impressions + other.impressions,
            clicks: self.clicks + other.clicks,
            leads: self.leads + other.leads,
            sales: self.sales + other.sales,
            spend: self.spend + other.spend,
            sale_value: self.sale_value + other.sale_value,
        }
    }
}

/// Undefined-safe division: `None` exactly when the denominator is zero
/// (or either side is non-finite). Never returns NaN or infinity.
pub fn ratio(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator == 0.0 || !denominator.is_finite() || !numerator.is_finite() {
        None
    } else {
        Some(numerator / denominator)
    }
}

/// Derived ratio metrics. `None` means the denominator was zero for the
/// period; callers must not treat it as 0 when rendering or comparing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedMetrics {
    /// Click-through rate as a percentage (clicks / impressions * 100).
    pub ctr: Option<f64>,
    /// Cost per lead (spend / leads).
    pub cpl: Option<f64>,
    /// Cost per click (spend / clicks).
    pub cpc: Option<f64>,
    /// Return on ad spend (sale_value / spend).
    pub roas: Option<f64>,
}

impl NormalizedMetrics {
    pub fn get(&self, kind: MetricKind) -> Option<f64> {
        match kind {
            MetricKind::Ctr => self.ctr,
            MetricKind::Cpl => self.cpl,
            MetricKind::Cpc => self.cpc,
            MetricKind::Roas => self.roas,
        }
    }
}

/// The ratio metrics the scorer knows how to benchmark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    Ctr,
    Cpl,
    Cpc,
    Roas,
}

impl MetricKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Ctr => "ctr",
            MetricKind::Cpl => "cpl",
            MetricKind::Cpc => "cpc",
            MetricKind::Roas => "roas",
        }
    }
}

/// Funnel classification of a campaign. Controls which benchmark subset
/// applies and which metrics are primary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FunnelStage {
    /// Prospecting / awareness: impressions and CTR are primary.
    Top,
    /// Conversion-focused: leads and CPL are primary.
    Bottom,
}

impl FunnelStage {
    /// The metric subset scored for campaigns at this stage.
    pub fn scored_metrics(&self) -> &'static [MetricKind] {
        match self {
            FunnelStage::Top => &[MetricKind::Ctr, MetricKind::Cpc],
            FunnelStage::Bottom => &[MetricKind::Cpl, MetricKind::Roas, MetricKind::Cpc],
        }
    }
}

/// Company-configured ceilings and floors, read-only input to the alert
/// feed. Owned by the company entity; fetched once per request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompanyThresholds {
    pub cpl_max: f64,
    pub cac_max: f64,
    pub margin_min: f64,
    pub profit_min_per_sale: f64,
}

/// Bounded reporting window all engine inputs are aggregated over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportingPeriod {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    // 1. Undefined-safe ratios ----------------------------------------------

    #[test]
    fn test_ratio_undefined_only_on_zero_denominator() {
        assert_eq!(ratio(10.0, 0.0), None);
        assert_eq!(ratio(0.0, 5.0), Some(0.0));
        assert_eq!(ratio(10.0, 4.0), Some(2.5));
    }

    #[test]
    fn test_normalized_metrics_never_nan() {
        let empty = MetricSet::default();
        let n = empty.normalized();
        assert_eq!(n.ctr, None);
        assert_eq!(n.cpl, None);
        assert_eq!(n.cpc, None);
        assert_eq!(n.roas, None);

        let active = MetricSet {
            impressions: 1000,
            clicks: 25,
            leads: 5,
            sales: 1,
            spend: 200.0,
            sale_value: 600.0,
        };
        let n = active.normalized();
        assert!((n.ctr.unwrap() - 2.5).abs() < f64::EPSILON);
        assert!((n.cpl.unwrap() - 40.0).abs() < f64::EPSILON);
        assert!((n.cpc.unwrap() - 8.0).abs() < f64::EPSILON);
        assert!((n.roas.unwrap() - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_zero_leads_cpl_undefined_not_zero() {
        // Spend with no leads must surface as "undefined", never as a
        // better-than-benchmark 0.
        let m = MetricSet {
            impressions: 500,
            clicks: 40,
            leads: 0,
            sales: 0,
            spend: 150.0,
            sale_value: 0.0,
        };
        assert_eq!(m.normalized().cpl, None);
    }

    // 2. Merging ------------------------------------------------------------

    #[test]
    fn test_merge_sums_counters() {
        let a = MetricSet {
            impressions: 100,
            clicks: 10,
            leads: 2,
            sales: 1,
            spend: 50.0,
            sale_value: 80.0,
        };
        let b = MetricSet {
            impressions: 300,
            clicks: 5,
            leads: 0,
            sales: 0,
            spend: 25.0,
            sale_value: 0.0,
        };
        let m = a.merge(&b);
        assert_eq!(m.impressions, 400);
        assert_eq!(m.clicks, 15);
        assert_eq!(m.leads, 2);
        assert!((m.spend - 75.0).abs() < f64::EPSILON);
    }
}
