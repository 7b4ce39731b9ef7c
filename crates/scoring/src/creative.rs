//! Creative outlier classification within a campaign: top performers,
//! zero-conversion spenders, and fatiguing creatives.

use adpulse_core::config::CreativeConfig;
use adpulse_core::types::{FunnelStage, MetricSet};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;
use uuid::Uuid;

/// Ordered per-day (or per-bucket) metric rows for one creative over the
/// reporting window. The fatigue check compares the first half of the
/// window against the second.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreativeWindow {
    pub creative_id: Uuid,
    pub rows: Vec<MetricSet>,
}

impl CreativeWindow {
    pub fn totals(&self) -> MetricSet {
        self.rows
            .iter()
            .fold(MetricSet::default(), |acc, row| acc.merge(row))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreativeFlag {
    /// Composite rank places the creative in the top slice of the campaign.
    Star,
    /// Material spend with zero conversions for the funnel stage.
    NoConversion,
    /// CTR declined beyond the threshold between window halves.
    Fatigue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreativeFlags {
    pub creative_id: Uuid,
    pub flags: Vec<CreativeFlag>,
}

/// Flags outlier creatives within one campaign.
pub struct CreativeClassifier {
    config: CreativeConfig,
}

impl CreativeClassifier {
    pub fn new(config: CreativeConfig) -> Self {
        Self { config }
    }

    /// Classify every creative of a campaign. Creatives with no flags get
    /// an entry with an empty flag list, so callers can render all rows.
    pub fn classify(&self, stage: FunnelStage, creatives: &[CreativeWindow]) -> Vec<CreativeFlags> {
        let totals: Vec<(Uuid, MetricSet)> = creatives
            .iter()
            .map(|c| (c.creative_id, c.totals()))
            .collect();
        let campaign_spend: f64 = totals.iter().map(|(_, t)| t.spend).sum();

        let stars = self.rank_stars(stage, &totals);
        debug!(
            creatives = creatives.len(),
            stars = stars.len(),
            "Classified campaign creatives"
        );

        creatives
            .iter()
            .zip(totals.iter())
            .map(|(window, (id, total))| {
                let mut flags = Vec::new();
                if stars.contains(id) {
                    flags.push(CreativeFlag::Star);
                } else if self.is_no_conversion(stage, total, campaign_spend) {
                    // Stars are conversion-ranked, so a starred creative can
                    // never also be a zero-conversion spender.
                    flags.push(CreativeFlag::NoConversion);
                }
                if self.is_fatigued(&window.rows) {
                    flags.push(CreativeFlag::Fatigue);
                }
                CreativeFlags {
                    creative_id: *id,
                    flags,
                }
            })
            .collect()
    }

    /// Composite rank (conversions desc, then ROAS desc) over creatives
    /// meeting the activity floor; the top `star_fraction` slice wins.
    /// Creatives without a single conversion are never stars.
    fn rank_stars(&self, stage: FunnelStage, totals: &[(Uuid, MetricSet)]) -> HashSet<Uuid> {
        let mut ranked: Vec<&(Uuid, MetricSet)> = totals
            .iter()
            .filter(|(_, t)| {
                t.impressions >= self.config.min_impressions && conversions(t, stage) > 0
            })
            .collect();
        if ranked.is_empty() {
            return HashSet::new();
        }

        ranked.sort_by(|(_, a), (_, b)| {
            conversions(b, stage)
                .cmp(&conversions(a, stage))
                .then_with(|| {
                    let roas_a = a.normalized().roas.unwrap_or(0.0);
                    let roas_b = b.normalized().roas.unwrap_or(0.0);
                    roas_b.total_cmp(&roas_a)
                })
        });

        let take = ((ranked.len() as f64 * self.config.star_fraction).ceil() as usize).max(1);
        ranked.iter().take(take).map(|(id, _)| *id).collect()
    }

    fn is_no_conversion(&self, stage: FunnelStage, total: &MetricSet, campaign_spend: f64) -> bool {
        if total.spend <= 0.0 || conversions(total, stage) > 0 {
            return false;
        }
        match adpulse_core::types::ratio(total.spend, campaign_spend) {
            Some(share) => share >= self.config.no_conversion_spend_share,
            None => false,
        }
    }

    /// First-half vs second-half CTR comparison with an impression floor on
    /// both halves so low-volume creatives are not flagged on noise.
    fn is_fatigued(&self, rows: &[MetricSet]) -> bool {
        if rows.len() < 2 {
            return false;
        }
        let mid = rows.len() / 2;
        let first = rows[..mid]
            .iter()
            .fold(MetricSet::default(), |acc, r| acc.merge(r));
        let second = rows[mid..]
            .iter()
            .fold(MetricSet::default(), |acc, r| acc.merge(r));

        if first.impressions < self.config.fatigue_min_impressions
            || second.impressions < self.config.fatigue_min_impressions
        {
            return false;
        }
        match (first.normalized().ctr, second.normalized().ctr) {
            (Some(first_ctr), Some(second_ctr)) if first_ctr > 0.0 => {
                second_ctr < first_ctr * (1.0 - self.config.fatigue_decline)
            }
            _ => false,
        }
    }
}

/// Stage-relevant conversion counter: leads for prospecting campaigns,
/// sales for conversion-focused ones.
fn conversions(m: &MetricSet, stage: FunnelStage) -> u64 {
    match stage {
        FunnelStage::Top => m.leads,
        FunnelStage::Bottom => m.sales,
    }
}
