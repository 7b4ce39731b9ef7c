//! Typed UTM-tracking discrepancies. The kind identifiers are stable and
//! shared with the UI labels; each discrepancy carries only the fields
//! relevant to its type.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed set of discrepancy types, with stable wire identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiscrepancyKind {
    #[serde(rename = "SEM_URL_CAPTURADA")]
    SemUrlCapturada,
    #[serde(rename = "PLACEHOLDERS_NAO_RESOLVIDOS")]
    PlaceholdersNaoResolvidos,
    #[serde(rename = "LANDING_PAGE_DIVERGENTE")]
    LandingPageDivergente,
    #[serde(rename = "UTM_SOURCE_DIVERGENTE")]
    UtmSourceDivergente,
    #[serde(rename = "UTM_MEDIUM_DIVERGENTE")]
    UtmMediumDivergente,
    #[serde(rename = "UTM_CAMPAIGN_DIVERGENTE")]
    UtmCampaignDivergente,
    #[serde(rename = "UTM_CONTENT_DIVERGENTE")]
    UtmContentDivergente,
    #[serde(rename = "SEM_UTMS_NA_URL")]
    SemUtmsNaUrl,
}

impl fmt::Display for DiscrepancyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DiscrepancyKind::SemUrlCapturada => "SEM_URL_CAPTURADA",
            DiscrepancyKind::PlaceholdersNaoResolvidos => "PLACEHOLDERS_NAO_RESOLVIDOS",
            DiscrepancyKind::LandingPageDivergente => "LANDING_PAGE_DIVERGENTE",
            DiscrepancyKind::UtmSourceDivergente => "UTM_SOURCE_DIVERGENTE",
            DiscrepancyKind::UtmMediumDivergente => "UTM_MEDIUM_DIVERGENTE",
            DiscrepancyKind::UtmCampaignDivergente => "UTM_CAMPAIGN_DIVERGENTE",
            DiscrepancyKind::UtmContentDivergente => "UTM_CONTENT_DIVERGENTE",
            DiscrepancyKind::SemUtmsNaUrl => "SEM_UTMS_NA_URL",
        };
        f.write_str(s)
    }
}

/// The UTM query parameters the detector compares individually.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UtmParam {
    Source,
    Medium,
    Campaign,
    Content,
}

impl UtmParam {
    pub const ALL: [UtmParam; 4] = [
        UtmParam::Source,
        UtmParam::Medium,
        UtmParam::Campaign,
        UtmParam::Content,
    ];

    pub fn query_key(&self) -> &'static str {
        match self {
            UtmParam::Source => "utm_source",
            UtmParam::Medium => "utm_medium",
            UtmParam::Campaign => "utm_campaign",
            UtmParam::Content => "utm_content",
        }
    }

    pub fn mismatch_kind(&self) -> DiscrepancyKind {
        match self {
            UtmParam::Source => DiscrepancyKind::UtmSourceDivergente,
            UtmParam::Medium => DiscrepancyKind::UtmMediumDivergente,
            UtmParam::Campaign => DiscrepancyKind::UtmCampaignDivergente,
            UtmParam::Content => DiscrepancyKind::UtmContentDivergente,
        }
    }
}

/// A detected mismatch between the configured expected URL and the URL
/// captured from a live click-through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Discrepancy {
    /// No captured URL exists, or the captured string is not a parsable URL.
    MissingCapturedUrl { raw: Option<String> },
    /// Unresolved template tokens remain in the captured string.
    UnresolvedPlaceholders { tokens: Vec<String> },
    /// Captured host/path differ from the expected landing page.
    LandingPageMismatch { expected: String, captured: String },
    /// Captured URL carries no UTM parameters at all.
    MissingUtms,
    /// One UTM parameter differs between expected and captured.
    UtmMismatch {
        param: UtmParam,
        expected: String,
        captured: Option<String>,
    },
}

impl Discrepancy {
    pub fn kind(&self) -> DiscrepancyKind {
        match self {
            Discrepancy::MissingCapturedUrl { .. } => DiscrepancyKind::SemUrlCapturada,
            Discrepancy::UnresolvedPlaceholders { .. } => {
                DiscrepancyKind::PlaceholdersNaoResolvidos
            }
            Discrepancy::LandingPageMismatch { .. } => DiscrepancyKind::LandingPageDivergente,
            Discrepancy::MissingUtms => DiscrepancyKind::SemUtmsNaUrl,
            Discrepancy::UtmMismatch { param, .. } => param.mismatch_kind(),
        }
    }

    /// Short human-readable detail for the alert feed.
    pub fn detail(&self) -> String {
        match self {
            Discrepancy::MissingCapturedUrl { raw: None } => {
                "No click-through URL was captured".to_string()
            }
            Discrepancy::MissingCapturedUrl { raw: Some(raw) } => {
                format!("Captured string is not a valid URL: {raw}")
            }
            Discrepancy::UnresolvedPlaceholders { tokens } => {
                format!("Unresolved template tokens: {}", tokens.join(", "))
            }
            Discrepancy::LandingPageMismatch { expected, captured } => {
                format!("Landing page {captured} differs from expected {expected}")
            }
            Discrepancy::MissingUtms => "Captured URL carries no UTM parameters".to_string(),
            Discrepancy::UtmMismatch {
                param,
                expected,
                captured,
            } => match captured {
                Some(captured) => format!(
                    "{} is \"{captured}\", expected \"{expected}\"",
                    param.query_key()
                ),
                None => format!("{} is missing, expected \"{expected}\"", param.query_key()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stable_wire_identifiers() {
        let json = serde_json::to_string(&DiscrepancyKind::SemUrlCapturada).unwrap();
        assert_eq!(json, "\"SEM_URL_CAPTURADA\"");
        let json = serde_json::to_string(&DiscrepancyKind::UtmCampaignDivergente).unwrap();
        assert_eq!(json, "\"UTM_CAMPAIGN_DIVERGENTE\"");

        let back: DiscrepancyKind = serde_json::from_str("\"SEM_UTMS_NA_URL\"").unwrap();
        assert_eq!(back, DiscrepancyKind::SemUtmsNaUrl);
    }

    #[test]
    fn test_param_kind_mapping() {
        assert_eq!(
            UtmParam::Source.mismatch_kind(),
            DiscrepancyKind::UtmSourceDivergente
        );
        assert_eq!(
            UtmParam::Content.mismatch_kind(),
            DiscrepancyKind::UtmContentDivergente
        );
    }
}
