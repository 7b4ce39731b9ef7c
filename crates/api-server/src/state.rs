//! In-memory read model backed by DashMap.
//!
//! Stands in for the dashboard's persistence layer: metric rows arrive from
//! the ad-platform ingestion pipeline and campaign/creative configuration
//! from the admin CRUD, both out of scope here. Production: replace with
//! the real store; the engine crates only see the trait surface.

use adpulse_core::types::{CompanyThresholds, FunnelStage, MetricSet, ReportingPeriod};
use adpulse_scoring::CampaignScorer;
use adpulse_tracking::{AlertStore, CreativeUrlSource, CreativeUrls};
use chrono::{Duration, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Campaign configuration as the engine sees it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignRecord {
    pub id: Uuid,
    pub company_id: Uuid,
    pub name: String,
    pub stage: FunnelStage,
    /// Campaign-level expected destination URL, inherited by creatives
    /// without an override.
    pub expected_url: Option<String>,
}

/// Creative configuration and capture state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreativeRecord {
    pub id: Uuid,
    pub campaign_id: Uuid,
    /// Creative-level expected URL override.
    pub expected_url: Option<String>,
    /// URL captured from the most recent live click-through.
    pub captured_url: Option<String>,
}

/// One reporting period's aggregate row for a campaign.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PeriodRow {
    pub period: ReportingPeriod,
    pub totals: MetricSet,
}

/// Thread-safe in-memory read model for campaigns, creatives, period
/// metrics, and company thresholds.
pub struct OpsStore {
    campaigns: DashMap<Uuid, CampaignRecord>,
    creatives: DashMap<Uuid, CreativeRecord>,
    /// Per-period aggregates per campaign, one row per reporting window.
    campaign_metrics: DashMap<Uuid, Vec<PeriodRow>>,
    thresholds: DashMap<Uuid, CompanyThresholds>,
}

impl OpsStore {
    pub fn new() -> Self {
        info!("Ops store initialized (in-memory, development mode)");
        Self {
            campaigns: DashMap::new(),
            creatives: DashMap::new(),
            campaign_metrics: DashMap::new(),
            thresholds: DashMap::new(),
        }
    }

    pub fn upsert_campaign(&self, campaign: CampaignRecord) {
        self.campaigns.insert(campaign.id, campaign);
    }

    pub fn upsert_creative(&self, creative: CreativeRecord) {
        self.creatives.insert(creative.id, creative);
    }

    pub fn set_campaign_metrics(
        &self,
        campaign_id: Uuid,
        period: ReportingPeriod,
        metrics: MetricSet,
    ) {
        let mut rows = self.campaign_metrics.entry(campaign_id).or_default();
        match rows.iter_mut().find(|r| r.period == period) {
            Some(row) => row.totals = metrics,
            None => rows.push(PeriodRow {
                period,
                totals: metrics,
            }),
        }
    }

    pub fn set_thresholds(&self, company_id: Uuid, thresholds: CompanyThresholds) {
        self.thresholds.insert(company_id, thresholds);
    }

    pub fn get_campaign(&self, id: Uuid) -> Option<CampaignRecord> {
        self.campaigns.get(&id).map(|r| r.clone())
    }

    /// Aggregate row for the requested period; with no period, the most
    /// recent row the campaign has.
    pub fn get_campaign_metrics(
        &self,
        id: Uuid,
        period: Option<ReportingPeriod>,
    ) -> Option<MetricSet> {
        let rows = self.campaign_metrics.get(&id)?;
        match period {
            Some(period) => rows.iter().find(|r| r.period == period).map(|r| r.totals),
            None => rows.iter().max_by_key(|r| r.period.end).map(|r| r.totals),
        }
    }

    /// (current-period totals, thresholds) pairs for every company that has
    /// thresholds configured. Totals aggregate the company's campaigns.
    pub fn company_periods(
        &self,
    ) -> Vec<(adpulse_tracking::CompanyPeriodMetrics, CompanyThresholds)> {
        self.thresholds
            .iter()
            .map(|entry| {
                let company_id = *entry.key();
                let totals = self
                    .campaigns
                    .iter()
                    .filter(|c| c.company_id == company_id)
                    .filter_map(|c| self.get_campaign_metrics(c.id, None))
                    .fold(MetricSet::default(), |acc, m| acc.merge(&m));
                (
                    adpulse_tracking::CompanyPeriodMetrics { company_id, totals },
                    *entry.value(),
                )
            })
            .collect()
    }

    /// Seed a small demo dataset so the server is explorable out of the box.
    pub fn seed_demo_data(&self) {
        let company_id = Uuid::new_v4();
        self.set_thresholds(
            company_id,
            CompanyThresholds {
                cpl_max: 50.0,
                cac_max: 250.0,
                margin_min: 0.2,
                profit_min_per_sale: 30.0,
            },
        );

        let campaign = CampaignRecord {
            id: Uuid::new_v4(),
            company_id,
            name: "Summer Sale — Search".to_string(),
            stage: FunnelStage::Bottom,
            expected_url: Some(
                "https://loja.example.com/promo?utm_source=google&utm_medium=cpc&utm_campaign=summer_sale"
                    .to_string(),
            ),
        };
        let now = Utc::now();
        self.set_campaign_metrics(
            campaign.id,
            ReportingPeriod {
                start: now - Duration::days(7),
                end: now,
            },
            MetricSet {
                impressions: 120_000,
                clicks: 3_100,
                leads: 140,
                sales: 22,
                spend: 5_200.0,
                sale_value: 19_800.0,
            },
        );
        self.upsert_creative(CreativeRecord {
            id: Uuid::new_v4(),
            campaign_id: campaign.id,
            expected_url: None,
            captured_url: Some(
                "https://loja.example.com/promo?utm_source=google&utm_medium=cpc&utm_campaign=summer-sale"
                    .to_string(),
            ),
        });
        self.upsert_creative(CreativeRecord {
            id: Uuid::new_v4(),
            campaign_id: campaign.id,
            expected_url: None,
            captured_url: None,
        });
        self.upsert_campaign(campaign);
        info!("Seeded demo company, campaign, and creatives");
    }
}

impl Default for OpsStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CreativeUrlSource for OpsStore {
    fn creative_urls(&self, company_id: Option<Uuid>) -> Vec<CreativeUrls> {
        self.creatives
            .iter()
            .filter_map(|creative| {
                let campaign = self.campaigns.get(&creative.campaign_id)?;
                if let Some(scope) = company_id {
                    if campaign.company_id != scope {
                        return None;
                    }
                }
                Some(CreativeUrls {
                    creative_id: creative.id,
                    campaign_id: campaign.id,
                    expected_override: creative.expected_url.clone(),
                    campaign_expected: campaign.expected_url.clone(),
                    captured: creative.captured_url.clone(),
                })
            })
            .collect()
    }
}

/// Shared application state for REST handlers.
#[derive(Clone)]
pub struct AppState {
    pub ops: Arc<OpsStore>,
    pub alerts: Arc<AlertStore>,
    pub scorer: Arc<CampaignScorer>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_company_scope_filters_creatives() {
        let store = OpsStore::new();
        store.seed_demo_data();

        let all = store.creative_urls(None);
        assert_eq!(all.len(), 2);

        let none = store.creative_urls(Some(Uuid::new_v4()));
        assert!(none.is_empty());
    }

    #[test]
    fn test_metrics_lookup_selects_requested_period() {
        let store = OpsStore::new();
        let campaign_id = Uuid::new_v4();
        let now = Utc::now();
        let last_week = ReportingPeriod {
            start: now - Duration::days(14),
            end: now - Duration::days(7),
        };
        let this_week = ReportingPeriod {
            start: now - Duration::days(7),
            end: now,
        };

        let old = MetricSet {
            clicks: 10,
            ..Default::default()
        };
        let recent = MetricSet {
            clicks: 99,
            ..Default::default()
        };
        store.set_campaign_metrics(campaign_id, last_week, old);
        store.set_campaign_metrics(campaign_id, this_week, recent);

        // Explicit period hits its own row; no period means the latest.
        assert_eq!(
            store.get_campaign_metrics(campaign_id, Some(last_week)),
            Some(old)
        );
        assert_eq!(store.get_campaign_metrics(campaign_id, None), Some(recent));

        // A period with no row is a miss, not a fallback.
        let unseen = ReportingPeriod {
            start: now - Duration::days(30),
            end: now - Duration::days(21),
        };
        assert_eq!(store.get_campaign_metrics(campaign_id, Some(unseen)), None);
    }

    #[test]
    fn test_set_metrics_replaces_same_period_row() {
        let store = OpsStore::new();
        let campaign_id = Uuid::new_v4();
        let now = Utc::now();
        let period = ReportingPeriod {
            start: now - Duration::days(7),
            end: now,
        };

        store.set_campaign_metrics(campaign_id, period, MetricSet::default());
        let updated = MetricSet {
            clicks: 42,
            ..Default::default()
        };
        store.set_campaign_metrics(campaign_id, period, updated);

        assert_eq!(store.get_campaign_metrics(campaign_id, Some(period)), Some(updated));
    }

    #[test]
    fn test_creative_inherits_campaign_expected_url() {
        let store = OpsStore::new();
        store.seed_demo_data();

        for creative in store.creative_urls(None) {
            assert!(creative.expected_override.is_none());
            assert!(creative.campaign_expected.is_some());
            assert!(creative.expected().is_some());
        }
    }
}
