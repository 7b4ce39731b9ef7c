//! Unified alert feed: unresolved UTM alerts merged with live metric
//! threshold breaches. Breaches are recomputed on every read and never
//! persisted.

use crate::discrepancy::DiscrepancyKind;
use crate::store::{AlertStore, UtmAlert};
use adpulse_core::types::{CompanyThresholds, MetricSet};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
}

/// Which company ceiling was crossed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreachKind {
    /// Current-period cost per lead above `cpl_max`.
    CplAboveMax,
    /// Current-period cost per acquisition above `cac_max`.
    CacAboveMax,
}

/// A live threshold breach. Transient by design: it disappears from the
/// feed as soon as the underlying metrics recover.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdBreach {
    pub company_id: Uuid,
    pub kind: BreachKind,
    pub value: f64,
    pub limit: f64,
    pub computed_at: DateTime<Utc>,
}

/// Current-period aggregate counters for one company, as fetched by the
/// read model.
#[derive(Debug, Clone, Copy)]
pub struct CompanyPeriodMetrics {
    pub company_id: Uuid,
    pub totals: MetricSet,
}

/// One entry of the unified feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum FeedEntry {
    Utm {
        severity: Severity,
        alert: UtmAlert,
    },
    Threshold {
        severity: Severity,
        breach: ThresholdBreach,
    },
}

impl FeedEntry {
    pub fn severity(&self) -> Severity {
        match self {
            FeedEntry::Utm { severity, .. } | FeedEntry::Threshold { severity, .. } => *severity,
        }
    }

    fn timestamp(&self) -> DateTime<Utc> {
        match self {
            FeedEntry::Utm { alert, .. } => alert.detected_at,
            FeedEntry::Threshold { breach, .. } => breach.computed_at,
        }
    }
}

/// Assembles the feed from its two independent sources.
pub struct AlertFeed;

impl AlertFeed {
    /// Merge unresolved UTM alerts with freshly computed breaches for the
    /// given companies, newest first.
    pub fn assemble(
        store: &AlertStore,
        companies: &[(CompanyPeriodMetrics, CompanyThresholds)],
    ) -> Vec<FeedEntry> {
        let mut entries: Vec<FeedEntry> = store
            .unresolved()
            .into_iter()
            .map(|alert| FeedEntry::Utm {
                severity: utm_severity(alert.kind()),
                alert,
            })
            .collect();

        for (metrics, thresholds) in companies {
            for breach in Self::breaches(metrics, thresholds) {
                entries.push(FeedEntry::Threshold {
                    severity: Severity::Warning,
                    breach,
                });
            }
        }

        entries.sort_by(|a, b| b.timestamp().cmp(&a.timestamp()));
        entries
    }

    /// Compare one company's current-period cpl/cac against its ceilings.
    /// Undefined ratios (no leads / no sales yet) breach nothing.
    pub fn breaches(
        metrics: &CompanyPeriodMetrics,
        thresholds: &CompanyThresholds,
    ) -> Vec<ThresholdBreach> {
        let now = Utc::now();
        let normalized = metrics.totals.normalized();
        let cac = adpulse_core::types::ratio(metrics.totals.spend, metrics.totals.sales as f64);
        let mut breaches = Vec::new();

        if let Some(cpl) = normalized.cpl {
            if cpl > thresholds.cpl_max {
                breaches.push(ThresholdBreach {
                    company_id: metrics.company_id,
                    kind: BreachKind::CplAboveMax,
                    value: cpl,
                    limit: thresholds.cpl_max,
                    computed_at: now,
                });
            }
        }
        if let Some(cac) = cac {
            if cac > thresholds.cac_max {
                breaches.push(ThresholdBreach {
                    company_id: metrics.company_id,
                    kind: BreachKind::CacAboveMax,
                    value: cac,
                    limit: thresholds.cac_max,
                    computed_at: now,
                });
            }
        }
        breaches
    }
}

/// Capture gaps block measurement entirely; divergent parameters are
/// warnings about data quality.
fn utm_severity(kind: DiscrepancyKind) -> Severity {
    match kind {
        DiscrepancyKind::SemUrlCapturada
        | DiscrepancyKind::PlaceholdersNaoResolvidos
        | DiscrepancyKind::LandingPageDivergente
        | DiscrepancyKind::SemUtmsNaUrl => Severity::Warning,
        DiscrepancyKind::UtmSourceDivergente
        | DiscrepancyKind::UtmMediumDivergente
        | DiscrepancyKind::UtmCampaignDivergente
        | DiscrepancyKind::UtmContentDivergente => Severity::Info,
    }
}
