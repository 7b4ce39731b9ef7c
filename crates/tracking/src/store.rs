//! Alert persistence. In-memory DashMap store with the open-alert
//! uniqueness key (creative_id, discrepancy kind) enforced atomically, so a
//! concurrent duplicate insert is a dedup hit rather than an error.
//!
//! Production: replace with PostgreSQL (sqlx) and a partial unique index on
//! (creative_id, discrepancy_type) WHERE NOT resolved. The conflict-as-
//! success contract stays the same.

use crate::discrepancy::{Discrepancy, DiscrepancyKind};
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

/// A persisted UTM alert. The only engine output that survives across
/// detection runs, so resolution state is durable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UtmAlert {
    pub id: Uuid,
    pub creative_id: Uuid,
    pub campaign_id: Uuid,
    /// Stable wire identifier for the discrepancy category
    /// (e.g. `SEM_URL_CAPTURADA`); dashboards key on this, not on the
    /// structured payload below.
    pub discrepancy_type: DiscrepancyKind,
    pub discrepancy: Discrepancy,
    pub expected_url: String,
    pub captured_url: Option<String>,
    pub detail: String,
    pub detected_at: DateTime<Utc>,
    pub resolved: bool,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl UtmAlert {
    pub fn kind(&self) -> DiscrepancyKind {
        self.discrepancy_type
    }
}

/// Result of an insert attempt against the open-alert uniqueness key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// A new unresolved alert was created.
    Inserted(Uuid),
    /// An unresolved alert with the same (creative, kind) already exists.
    AlreadyOpen(Uuid),
}

/// Result of a resolve call. Resolving an already-resolved alert is a
/// no-op, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolveOutcome {
    Resolved,
    AlreadyResolved,
    NotFound,
}

/// Thread-safe alert store.
pub struct AlertStore {
    alerts: DashMap<Uuid, UtmAlert>,
    /// (creative_id, kind) -> open alert id. Entry occupancy is the
    /// uniqueness constraint; resolution removes the entry so the same
    /// discrepancy can be flagged again later as a new alert.
    open_index: DashMap<(Uuid, DiscrepancyKind), Uuid>,
}

impl AlertStore {
    pub fn new() -> Self {
        Self {
            alerts: DashMap::new(),
            open_index: DashMap::new(),
        }
    }

    /// Insert a new unresolved alert unless one with the same
    /// (creative, kind) is already open. The index entry lock makes the
    /// check-and-insert atomic under concurrent detection runs.
    pub fn open_alert(
        &self,
        creative_id: Uuid,
        campaign_id: Uuid,
        discrepancy: Discrepancy,
        expected_url: &str,
        captured_url: Option<&str>,
    ) -> InsertOutcome {
        let kind = discrepancy.kind();
        match self.open_index.entry((creative_id, kind)) {
            Entry::Occupied(existing) => {
                metrics::counter!("tracking.alerts_deduped").increment(1);
                InsertOutcome::AlreadyOpen(*existing.get())
            }
            Entry::Vacant(slot) => {
                let alert = UtmAlert {
                    id: Uuid::new_v4(),
                    creative_id,
                    campaign_id,
                    discrepancy_type: kind,
                    detail: discrepancy.detail(),
                    discrepancy,
                    expected_url: expected_url.to_string(),
                    captured_url: captured_url.map(str::to_string),
                    detected_at: Utc::now(),
                    resolved: false,
                    resolved_at: None,
                };
                let id = alert.id;
                slot.insert(id);
                self.alerts.insert(id, alert);
                metrics::counter!("tracking.alerts_opened").increment(1);
                info!(alert_id = %id, creative_id = %creative_id, kind = %kind, "UTM alert opened");
                InsertOutcome::Inserted(id)
            }
        }
    }

    /// Mark an alert resolved. Idempotent; resolved alerts never reopen.
    pub fn resolve(&self, alert_id: Uuid) -> ResolveOutcome {
        let Some(mut alert) = self.alerts.get_mut(&alert_id) else {
            return ResolveOutcome::NotFound;
        };
        if alert.resolved {
            return ResolveOutcome::AlreadyResolved;
        }
        alert.resolved = true;
        alert.resolved_at = Some(Utc::now());
        let key = (alert.creative_id, alert.kind());
        drop(alert);
        self.open_index.remove(&key);
        metrics::counter!("tracking.alerts_resolved").increment(1);
        ResolveOutcome::Resolved
    }

    pub fn get(&self, alert_id: Uuid) -> Option<UtmAlert> {
        self.alerts.get(&alert_id).map(|a| a.clone())
    }

    /// All unresolved alerts, newest first.
    pub fn unresolved(&self) -> Vec<UtmAlert> {
        let mut open: Vec<UtmAlert> = self
            .alerts
            .iter()
            .filter(|a| !a.resolved)
            .map(|a| a.clone())
            .collect();
        open.sort_by(|a, b| b.detected_at.cmp(&a.detected_at));
        open
    }
}

impl Default for AlertStore {
    fn default() -> Self {
        Self::new()
    }
}
