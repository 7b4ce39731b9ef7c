//! Detection run: inspects every eligible creative, opens deduplicated
//! alerts, and reports partial-success counts.

use crate::detector::{CreativeUrls, UtmDetector};
use crate::store::{AlertStore, InsertOutcome};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

/// Read-model contract: yields the URL configuration and capture state for
/// every creative in scope. Fetching is the collaborator's concern; the
/// run itself never blocks on I/O.
pub trait CreativeUrlSource {
    /// Creatives to analyze, optionally scoped to one company.
    fn creative_urls(&self, company_id: Option<Uuid>) -> Vec<CreativeUrls>;
}

/// Counts reported back to the caller. A run reports partial success; it
/// never fails silently and never aborts on a single bad record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionSummary {
    /// Creatives with an expected URL that were inspected.
    pub creatives_analyzed: u64,
    /// Newly opened alerts (dedup hits are not counted).
    pub discrepancies_found: u64,
    /// Creatives without any expected URL configured.
    pub skipped: u64,
    /// Creatives whose expected URL configuration was unusable.
    pub failed: u64,
}

/// Runs the UTM detector over a creative source and persists the findings.
pub struct DetectionRun<'a> {
    detector: UtmDetector,
    store: &'a AlertStore,
}

impl<'a> DetectionRun<'a> {
    pub fn new(store: &'a AlertStore) -> Self {
        Self {
            detector: UtmDetector::new(),
            store,
        }
    }

    /// Analyze every creative from the source. Creatives are independent;
    /// one creative's bad configuration is counted and logged, never fatal.
    /// Re-running with unchanged inputs is idempotent thanks to the store's
    /// open-alert dedup.
    pub fn execute(
        &self,
        source: &dyn CreativeUrlSource,
        company_id: Option<Uuid>,
    ) -> DetectionSummary {
        let mut summary = DetectionSummary::default();

        for creative in source.creative_urls(company_id) {
            let Some(expected) = creative.expected() else {
                summary.skipped += 1;
                continue;
            };

            let discrepancies = match self.detector.inspect(expected, creative.captured.as_deref())
            {
                Ok(found) => found,
                Err(e) => {
                    warn!(
                        creative_id = %creative.creative_id,
                        error = %e,
                        "Skipping creative with unusable expected URL"
                    );
                    summary.failed += 1;
                    continue;
                }
            };

            summary.creatives_analyzed += 1;
            for discrepancy in discrepancies {
                let outcome = self.store.open_alert(
                    creative.creative_id,
                    creative.campaign_id,
                    discrepancy,
                    expected,
                    creative.captured.as_deref(),
                );
                if let InsertOutcome::Inserted(_) = outcome {
                    summary.discrepancies_found += 1;
                }
            }
        }

        metrics::counter!("tracking.detection_runs").increment(1);
        info!(
            analyzed = summary.creatives_analyzed,
            found = summary.discrepancies_found,
            skipped = summary.skipped,
            failed = summary.failed,
            "Detection run finished"
        );
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedSource(Vec<CreativeUrls>);

    impl CreativeUrlSource for FixedSource {
        fn creative_urls(&self, _company_id: Option<Uuid>) -> Vec<CreativeUrls> {
            self.0.clone()
        }
    }

    fn creative(
        expected_override: Option<&str>,
        campaign_expected: Option<&str>,
        captured: Option<&str>,
    ) -> CreativeUrls {
        CreativeUrls {
            creative_id: Uuid::new_v4(),
            campaign_id: Uuid::new_v4(),
            expected_override: expected_override.map(str::to_string),
            campaign_expected: campaign_expected.map(str::to_string),
            captured: captured.map(str::to_string),
        }
    }

    // 1. Counting -----------------------------------------------------------

    #[test]
    fn test_counts_cover_every_creative() {
        let source = FixedSource(vec![
            // Clean: no discrepancy.
            creative(
                None,
                Some("https://a.com/lp?utm_source=google"),
                Some("https://a.com/lp?utm_source=google"),
            ),
            // Missing capture: one discrepancy.
            creative(None, Some("https://a.com/lp?utm_source=google"), None),
            // No expected URL anywhere: skipped, no alert.
            creative(None, None, Some("https://a.com/lp")),
            // Broken expected URL: failed, not fatal.
            creative(Some("::broken::"), None, Some("https://a.com/lp")),
        ]);

        let store = AlertStore::new();
        let summary = DetectionRun::new(&store).execute(&source, None);

        assert_eq!(summary.creatives_analyzed, 2);
        assert_eq!(summary.discrepancies_found, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(store.unresolved().len(), 1);
    }

    // 2. Idempotence --------------------------------------------------------

    #[test]
    fn test_rerun_with_unchanged_inputs_adds_nothing() {
        let source = FixedSource(vec![creative(
            None,
            Some("https://a.com/lp?utm_source=google&utm_campaign=sale"),
            Some("https://a.com/lp?utm_source=bing&utm_campaign=sale"),
        )]);

        let store = AlertStore::new();
        let run = DetectionRun::new(&store);

        let first = run.execute(&source, None);
        assert_eq!(first.discrepancies_found, 1);
        let open_after_first = store.unresolved();

        let second = run.execute(&source, None);
        assert_eq!(second.creatives_analyzed, 1);
        assert_eq!(second.discrepancies_found, 0);
        assert_eq!(store.unresolved(), open_after_first);
    }
}
