pub mod detector;
pub mod discrepancy;
pub mod feed;
pub mod run;
pub mod store;

pub use detector::{CreativeUrls, UtmDetector};
pub use discrepancy::{Discrepancy, DiscrepancyKind, UtmParam};
pub use feed::{AlertFeed, BreachKind, CompanyPeriodMetrics, FeedEntry, Severity, ThresholdBreach};
pub use run::{CreativeUrlSource, DetectionRun, DetectionSummary};
pub use store::{AlertStore, InsertOutcome, ResolveOutcome, UtmAlert};
