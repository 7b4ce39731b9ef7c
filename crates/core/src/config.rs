use crate::types::MetricKind;
use serde::Deserialize;

/// Root application configuration. Loaded from environment variables with
/// the prefix `ADPULSE__`. Every tunable the engines consume lives here so
/// callers construct it once per request and pass it down; there is no
/// process-wide mutable state.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub creative: CreativeConfig,
    #[serde(default)]
    pub keyword: KeywordConfig,
    #[serde(default)]
    pub benchmarks: BenchmarkConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_http_port")]
    pub http_port: u16,
}

/// Campaign scorer tunables.
#[derive(Debug, Clone, Deserialize)]
pub struct ScoringConfig {
    /// Tolerance band around a benchmark within which a metric is "medium",
    /// as a fraction of the target (0.1 = within 10%).
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    /// Per-metric weights for the aggregate score. Equal by default.
    #[serde(default)]
    pub weights: MetricWeights,
    /// Minimum points (inclusive) for grades A through D; below the last
    /// cutoff is an F. Must be strictly decreasing.
    #[serde(default = "default_grade_cutoffs")]
    pub grade_cutoffs: [u8; 4],
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricWeights {
    #[serde(default = "default_weight")]
    pub ctr: f64,
    #[serde(default = "default_weight")]
    pub cpl: f64,
    #[serde(default = "default_weight")]
    pub cpc: f64,
    #[serde(default = "default_weight")]
    pub roas: f64,
}

impl MetricWeights {
    pub fn get(&self, kind: MetricKind) -> f64 {
        match kind {
            MetricKind::Ctr => self.ctr,
            MetricKind::Cpl => self.cpl,
            MetricKind::Cpc => self.cpc,
            MetricKind::Roas => self.roas,
        }
    }
}

/// Creative classifier tunables.
#[derive(Debug, Clone, Deserialize)]
pub struct CreativeConfig {
    /// Fraction of ranked creatives flagged as stars (0.2 = top 20%).
    #[serde(default = "default_star_fraction")]
    pub star_fraction: f64,
    /// Minimum impressions over the window for a creative to be rankable.
    #[serde(default = "default_activity_floor")]
    pub min_impressions: u64,
    /// Minimum share of campaign spend before zero-conversion spend is
    /// flagged (0.1 = 10%).
    #[serde(default = "default_spend_share")]
    pub no_conversion_spend_share: f64,
    /// CTR decline (second half vs first half) beyond which a creative is
    /// fatigued, as a fraction (0.3 = 30% drop).
    #[serde(default = "default_fatigue_decline")]
    pub fatigue_decline: f64,
    /// Minimum impressions per half-window for the fatigue check.
    #[serde(default = "default_fatigue_floor")]
    pub fatigue_min_impressions: u64,
}

/// Keyword classifier tunables.
#[derive(Debug, Clone, Deserialize)]
pub struct KeywordConfig {
    /// Share of campaign spend above which a zero-conversion keyword is a
    /// drain (0.15 = 15%).
    #[serde(default = "default_drain_share")]
    pub drain_spend_share: f64,
    /// Quality scores strictly below this (1-10 scale) mark an opportunity.
    #[serde(default = "default_low_quality")]
    pub low_quality_score: u8,
}

/// Benchmark targets per funnel stage. Swapping these is a configuration
/// change, not a code path.
#[derive(Debug, Clone, Deserialize)]
pub struct BenchmarkConfig {
    #[serde(default = "default_top_benchmarks")]
    pub top: StageBenchmarks,
    #[serde(default = "default_bottom_benchmarks")]
    pub bottom: StageBenchmarks,
}

/// Target values for one funnel stage. `None` means the metric is not
/// benchmarked at that stage.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StageBenchmarks {
    pub ctr: Option<f64>,
    pub cpl: Option<f64>,
    pub cpc: Option<f64>,
    pub roas: Option<f64>,
}

// Default functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_http_port() -> u16 {
    8080
}
fn default_tolerance() -> f64 {
    0.1
}
fn default_weight() -> f64 {
    1.0
}
fn default_grade_cutoffs() -> [u8; 4] {
    [90, 75, 60, 50]
}
fn default_star_fraction() -> f64 {
    0.2
}
fn default_activity_floor() -> u64 {
    500
}
fn default_spend_share() -> f64 {
    0.1
}
fn default_fatigue_decline() -> f64 {
    0.3
}
fn default_fatigue_floor() -> u64 {
    1000
}
fn default_drain_share() -> f64 {
    0.15
}
fn default_low_quality() -> u8 {
    5
}
fn default_top_benchmarks() -> StageBenchmarks {
    StageBenchmarks {
        ctr: Some(1.5),
        cpl: None,
        cpc: Some(2.0),
        roas: None,
    }
}
fn default_bottom_benchmarks() -> StageBenchmarks {
    StageBenchmarks {
        ctr: None,
        cpl: Some(35.0),
        cpc: Some(2.5),
        roas: Some(4.0),
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            http_port: default_http_port(),
        }
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            tolerance: default_tolerance(),
            weights: MetricWeights::default(),
            grade_cutoffs: default_grade_cutoffs(),
        }
    }
}

impl Default for MetricWeights {
    fn default() -> Self {
        Self {
            ctr: default_weight(),
            cpl: default_weight(),
            cpc: default_weight(),
            roas: default_weight(),
        }
    }
}

impl Default for CreativeConfig {
    fn default() -> Self {
        Self {
            star_fraction: default_star_fraction(),
            min_impressions: default_activity_floor(),
            no_conversion_spend_share: default_spend_share(),
            fatigue_decline: default_fatigue_decline(),
            fatigue_min_impressions: default_fatigue_floor(),
        }
    }
}

impl Default for KeywordConfig {
    fn default() -> Self {
        Self {
            drain_spend_share: default_drain_share(),
            low_quality_score: default_low_quality(),
        }
    }
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            top: default_top_benchmarks(),
            bottom: default_bottom_benchmarks(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder().add_source(
            config::Environment::with_prefix("ADPULSE")
                .separator("__")
                .try_parsing(true)
                .list_separator(","),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }
}
