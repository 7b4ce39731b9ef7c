pub mod benchmark;
pub mod creative;
pub mod keyword;
pub mod scorer;

pub use benchmark::{Benchmark, BenchmarkRegistry, Direction};
pub use creative::{CreativeClassifier, CreativeFlag, CreativeFlags, CreativeWindow};
pub use keyword::{KeywordClassifier, KeywordFlag, KeywordFlags, KeywordMetrics};
pub use scorer::{CampaignScorer, Grade, MetricAssessment, MetricStatus, ScoreOutcome, ScoreResult};
