//! Keyword classification for search-style campaigns, relative to the
//! campaign's own means rather than global benchmarks.

use adpulse_core::config::KeywordConfig;
use adpulse_core::types::MetricSet;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

/// Per-keyword period row. `quality_score` is the platform-provided 1-10
/// relevance rating; absent when the platform did not report one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordMetrics {
    pub keyword_id: Uuid,
    pub metrics: MetricSet,
    pub quality_score: Option<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeywordFlag {
    /// Above-mean CTR at below-mean CPC.
    Star,
    /// Material spend share with zero conversions.
    Drain,
    /// Converting despite a low quality score; improving relevance is the
    /// cheapest lever.
    Opportunity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordFlags {
    pub keyword_id: Uuid,
    pub flags: Vec<KeywordFlag>,
}

/// Flags keywords against the campaign's own mean CTR and CPC. Means are
/// simple arithmetic means over keywords with at least one click.
pub struct KeywordClassifier {
    config: KeywordConfig,
}

impl KeywordClassifier {
    pub fn new(config: KeywordConfig) -> Self {
        Self { config }
    }

    /// Classify every keyword of a search campaign. The three predicates
    /// are independent; a keyword may match zero, one, or several.
    pub fn classify(&self, keywords: &[KeywordMetrics]) -> Vec<KeywordFlags> {
        let campaign_spend: f64 = keywords.iter().map(|k| k.metrics.spend).sum();
        let (mean_ctr, mean_cpc) = campaign_means(keywords);
        debug!(
            keywords = keywords.len(),
            mean_ctr, mean_cpc, "Classifying campaign keywords"
        );

        keywords
            .iter()
            .map(|keyword| {
                let normalized = keyword.metrics.normalized();
                let mut flags = Vec::new();

                if let (Some(ctr), Some(cpc), Some(mean_ctr), Some(mean_cpc)) =
                    (normalized.ctr, normalized.cpc, mean_ctr, mean_cpc)
                {
                    if ctr > mean_ctr && cpc > 0.0 && cpc < mean_cpc {
                        flags.push(KeywordFlag::Star);
                    }
                }

                if keyword.metrics.spend > 0.0 && keyword.metrics.leads == 0 {
                    if let Some(share) =
                        adpulse_core::types::ratio(keyword.metrics.spend, campaign_spend)
                    {
                        if share >= self.config.drain_spend_share {
                            flags.push(KeywordFlag::Drain);
                        }
                    }
                }

                if keyword.metrics.leads > 0 {
                    if let Some(quality) = keyword.quality_score {
                        if quality < self.config.low_quality_score {
                            flags.push(KeywordFlag::Opportunity);
                        }
                    }
                }

                KeywordFlags {
                    keyword_id: keyword.keyword_id,
                    flags,
                }
            })
            .collect()
    }
}

/// Simple arithmetic mean CTR and CPC over keywords with clicks > 0.
/// `None` when no keyword has clicks (no basis for comparison).
fn campaign_means(keywords: &[KeywordMetrics]) -> (Option<f64>, Option<f64>) {
    let mut ctr_sum = 0.0;
    let mut cpc_sum = 0.0;
    let mut count = 0.0;
    for keyword in keywords {
        let normalized = keyword.metrics.normalized();
        if let (Some(ctr), Some(cpc)) = (normalized.ctr, normalized.cpc) {
            ctr_sum += ctr;
            cpc_sum += cpc;
            count += 1.0;
        }
    }
    (
        adpulse_core::types::ratio(ctr_sum, count),
        adpulse_core::types::ratio(cpc_sum, count),
    )
}
