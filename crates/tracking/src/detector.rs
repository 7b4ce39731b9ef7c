//! UTM discrepancy detector: compares a configured expected destination URL
//! against the URL captured from a live ad click-through.

use crate::discrepancy::{Discrepancy, UtmParam};
use adpulse_core::{AdPulseError, AdPulseResult};
use std::collections::HashMap;
use url::Url;
use uuid::Uuid;

/// URL configuration and capture state for one creative, as read from the
/// expected-URL configuration and the click capture pipeline.
#[derive(Debug, Clone)]
pub struct CreativeUrls {
    pub creative_id: Uuid,
    pub campaign_id: Uuid,
    /// Creative-level expected URL; overrides the campaign default.
    pub expected_override: Option<String>,
    /// Campaign-level expected URL, inherited when no override is set.
    pub campaign_expected: Option<String>,
    /// URL actually captured from a live click-through, if any.
    pub captured: Option<String>,
}

impl CreativeUrls {
    /// Two-level lookup with defined precedence: the creative's own
    /// expected URL wins over the campaign default. Absence of both means
    /// detection is skipped for this creative (not an error).
    pub fn expected(&self) -> Option<&str> {
        self.expected_override
            .as_deref()
            .or(self.campaign_expected.as_deref())
    }
}

/// Stateless inspector; all results are pure functions of the URL pair.
#[derive(Debug, Clone, Default)]
pub struct UtmDetector;

impl UtmDetector {
    pub fn new() -> Self {
        Self
    }

    /// Run the ordered checks for one creative.
    ///
    /// A missing or unparsable captured URL, and unresolved placeholder
    /// tokens, short-circuit the remaining checks. The landing-page and
    /// UTM comparisons are independent and may all emit in one pass.
    ///
    /// Errors only when the *expected* URL itself cannot be parsed; that is
    /// a configuration problem, not a capture discrepancy.
    pub fn inspect(
        &self,
        expected: &str,
        captured: Option<&str>,
    ) -> AdPulseResult<Vec<Discrepancy>> {
        let expected_url = Url::parse(expected).map_err(|e| {
            AdPulseError::Detection(format!("expected URL {expected:?} is not parsable: {e}"))
        })?;

        // Check 1: nothing captured at all.
        let captured_raw = match captured {
            Some(raw) if !raw.trim().is_empty() => raw,
            _ => return Ok(vec![Discrepancy::MissingCapturedUrl { raw: None }]),
        };

        // Check 2: unresolved template tokens ({lpurl}, {campaignid}, ...).
        let tokens = placeholder_tokens(captured_raw);
        if !tokens.is_empty() {
            return Ok(vec![Discrepancy::UnresolvedPlaceholders { tokens }]);
        }

        // Unparsable capture is treated like a missing capture so one bad
        // record never aborts a batch run.
        let captured_url = match Url::parse(captured_raw) {
            Ok(url) => url,
            Err(_) => {
                return Ok(vec![Discrepancy::MissingCapturedUrl {
                    raw: Some(captured_raw.to_string()),
                }])
            }
        };

        let mut found = Vec::new();

        // Check 3: landing page (host + path, query ignored).
        let expected_page = landing_page(&expected_url);
        let captured_page = landing_page(&captured_url);
        if expected_page != captured_page {
            found.push(Discrepancy::LandingPageMismatch {
                expected: expected_page,
                captured: captured_page,
            });
        }

        // Checks 4/5: UTM presence, then per-parameter comparison.
        let expected_utms = utm_params(&expected_url);
        let captured_utms = utm_params(&captured_url);
        if captured_utms.is_empty() {
            found.push(Discrepancy::MissingUtms);
        } else {
            for param in UtmParam::ALL {
                let Some(expected_value) = expected_utms.get(&param) else {
                    continue;
                };
                let captured_value = captured_utms.get(&param);
                if captured_value != Some(expected_value) {
                    found.push(Discrepancy::UtmMismatch {
                        param,
                        expected: expected_value.clone(),
                        captured: captured_value.cloned(),
                    });
                }
            }
        }

        Ok(found)
    }
}

/// Collect unresolved `{token}` template variables left in a raw URL string.
fn placeholder_tokens(raw: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut rest = raw;
    while let Some(open) = rest.find('{') {
        let Some(close) = rest[open + 1..].find('}') else {
            break;
        };
        let token = &rest[open + 1..open + 1 + close];
        if !token.is_empty() {
            tokens.push(token.to_string());
        }
        rest = &rest[open + 1 + close + 1..];
    }
    tokens
}

/// Host + path with case-insensitive host and no trailing slash, so
/// `https://Site.com/lp/` and `https://site.com/lp` compare equal.
fn landing_page(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default().to_ascii_lowercase();
    let path = url.path().trim_end_matches('/');
    format!("{host}{path}")
}

fn utm_params(url: &Url) -> HashMap<UtmParam, String> {
    let mut params = HashMap::new();
    for (key, value) in url.query_pairs() {
        if let Some(param) = UtmParam::ALL.iter().find(|p| key == p.query_key()) {
            params.insert(*param, value.into_owned());
        }
    }
    params
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discrepancy::DiscrepancyKind;

    fn kinds(expected: &str, captured: Option<&str>) -> Vec<DiscrepancyKind> {
        UtmDetector::new()
            .inspect(expected, captured)
            .unwrap()
            .iter()
            .map(|d| d.kind())
            .collect()
    }

    const EXPECTED: &str =
        "https://loja.example.com/promo?utm_source=google&utm_medium=cpc&utm_campaign=summer_sale&utm_content=banner_a";

    // 1. Short-circuit checks -----------------------------------------------

    #[test]
    fn test_missing_capture_emits_single_alert() {
        assert_eq!(
            kinds(EXPECTED, None),
            vec![DiscrepancyKind::SemUrlCapturada]
        );
        assert_eq!(
            kinds(EXPECTED, Some("   ")),
            vec![DiscrepancyKind::SemUrlCapturada]
        );
    }

    #[test]
    fn test_unparsable_capture_treated_as_missing() {
        assert_eq!(
            kinds(EXPECTED, Some("not a url at all")),
            vec![DiscrepancyKind::SemUrlCapturada]
        );
    }

    #[test]
    fn test_unresolved_placeholders_short_circuit() {
        let captured = "https://loja.example.com/promo?utm_source={network}&utm_campaign=summer_sale";
        assert_eq!(
            kinds(EXPECTED, Some(captured)),
            vec![DiscrepancyKind::PlaceholdersNaoResolvidos]
        );

        let result = UtmDetector::new().inspect(EXPECTED, Some(captured)).unwrap();
        match &result[0] {
            Discrepancy::UnresolvedPlaceholders { tokens } => {
                assert_eq!(tokens, &vec!["network".to_string()]);
            }
            other => panic!("unexpected discrepancy {other:?}"),
        }
    }

    #[test]
    fn test_malformed_expected_url_is_an_error() {
        let result = UtmDetector::new().inspect("nope", Some("https://a.com/"));
        assert!(result.is_err());
    }

    // 2. Landing page -------------------------------------------------------

    #[test]
    fn test_landing_page_mismatch() {
        let captured = "https://outra.example.com/promo?utm_source=google&utm_medium=cpc&utm_campaign=summer_sale&utm_content=banner_a";
        assert_eq!(
            kinds(EXPECTED, Some(captured)),
            vec![DiscrepancyKind::LandingPageDivergente]
        );
    }

    #[test]
    fn test_landing_page_ignores_query_and_trailing_slash() {
        let captured = "https://LOJA.example.com/promo/?utm_source=google&utm_medium=cpc&utm_campaign=summer_sale&utm_content=banner_a&gclid=abc123";
        assert!(kinds(EXPECTED, Some(captured)).is_empty());
    }

    // 3. UTM comparison -----------------------------------------------------

    #[test]
    fn test_single_param_divergence() {
        // summer-sale vs summer_sale: only the campaign param diverges.
        let captured = "https://loja.example.com/promo?utm_source=google&utm_medium=cpc&utm_campaign=summer-sale&utm_content=banner_a";
        assert_eq!(
            kinds(EXPECTED, Some(captured)),
            vec![DiscrepancyKind::UtmCampaignDivergente]
        );
    }

    #[test]
    fn test_missing_param_counts_as_divergent() {
        let captured =
            "https://loja.example.com/promo?utm_source=google&utm_medium=cpc&utm_campaign=summer_sale";
        assert_eq!(
            kinds(EXPECTED, Some(captured)),
            vec![DiscrepancyKind::UtmContentDivergente]
        );
    }

    #[test]
    fn test_extra_query_params_do_not_disturb_utm_collection() {
        // Click-id parameters interleaved with the UTM set must neither
        // trip the comparison nor drop any UTM value.
        let captured = "https://loja.example.com/promo?gclid=abc123&utm_source=google&fbclid=xyz&utm_medium=cpc&utm_campaign=summer_sale&utm_content=banner_a";
        assert!(kinds(EXPECTED, Some(captured)).is_empty());
    }

    #[test]
    fn test_no_utms_at_all() {
        let captured = "https://loja.example.com/promo?gclid=abc123";
        assert_eq!(
            kinds(EXPECTED, Some(captured)),
            vec![DiscrepancyKind::SemUtmsNaUrl]
        );
    }

    #[test]
    fn test_independent_checks_can_stack() {
        // Wrong landing page and two wrong UTM params in one pass.
        let captured = "https://outra.example.com/outro?utm_source=facebook&utm_medium=cpc&utm_campaign=summer_sale&utm_content=banner_b";
        let found = kinds(EXPECTED, Some(captured));
        assert_eq!(found.len(), 3);
        assert!(found.contains(&DiscrepancyKind::LandingPageDivergente));
        assert!(found.contains(&DiscrepancyKind::UtmSourceDivergente));
        assert!(found.contains(&DiscrepancyKind::UtmContentDivergente));
    }

    #[test]
    fn test_param_not_in_expected_is_not_compared() {
        // Expected sets no utm_content; captured carrying one is fine.
        let expected = "https://loja.example.com/promo?utm_source=google";
        let captured = "https://loja.example.com/promo?utm_source=google&utm_content=banner_z";
        assert!(kinds(expected, Some(captured)).is_empty());
    }

    // 4. Override precedence ------------------------------------------------

    #[test]
    fn test_expected_url_precedence() {
        let mut urls = CreativeUrls {
            creative_id: Uuid::new_v4(),
            campaign_id: Uuid::new_v4(),
            expected_override: Some("https://a.com/creative".to_string()),
            campaign_expected: Some("https://a.com/campaign".to_string()),
            captured: None,
        };
        assert_eq!(urls.expected(), Some("https://a.com/creative"));

        urls.expected_override = None;
        assert_eq!(urls.expected(), Some("https://a.com/campaign"));

        urls.campaign_expected = None;
        assert_eq!(urls.expected(), None);
    }
}
