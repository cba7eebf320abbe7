//! crates/cinnarios_core/src/dashboard.rs
//!
//! Dashboard feature toggles and the summary shown at the top of the dashboard.

use crate::calendar::CalendarProjector;
use crate::domain::{Session, UserStats};
use crate::ledger::RegistrationLedger;
use crate::ports::{storage_keys, KeyValueStore};
use chrono::TimeZone;
use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashboardFeature {
    Notifications,
    DarkMode,
    AutoPlay,
    Downloads,
}

impl DashboardFeature {
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_lowercase().replace(['-', '_'], "").as_str() {
            "notifications" => Some(Self::Notifications),
            "darkmode" => Some(Self::DarkMode),
            "autoplay" => Some(Self::AutoPlay),
            "downloads" => Some(Self::Downloads),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Notifications => "Notifications",
            Self::DarkMode => "Dark mode",
            Self::AutoPlay => "Auto-play",
            Self::Downloads => "Offline downloads",
        }
    }
}

/// Feature switches persisted under their own storage key. Fields missing
/// from the stored blob keep their defaults (all off).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DashboardPreferences {
    pub notifications: bool,
    pub dark_mode: bool,
    pub auto_play: bool,
    pub downloads: bool,
}

impl DashboardPreferences {
    pub async fn load(store: &dyn KeyValueStore) -> Self {
        match store.get(storage_keys::DASHBOARD_FEATURES).await {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!("Ignoring malformed dashboard preferences: {}", e);
                Self::default()
            }),
            Ok(None) => Self::default(),
            Err(e) => {
                warn!("Failed to read dashboard preferences: {}", e);
                Self::default()
            }
        }
    }

    pub fn is_enabled(&self, feature: DashboardFeature) -> bool {
        match feature {
            DashboardFeature::Notifications => self.notifications,
            DashboardFeature::DarkMode => self.dark_mode,
            DashboardFeature::AutoPlay => self.auto_play,
            DashboardFeature::Downloads => self.downloads,
        }
    }

    /// Flips `feature`, persists, and returns the new value.
    pub async fn toggle(&mut self, feature: DashboardFeature, store: &dyn KeyValueStore) -> bool {
        let flag = match feature {
            DashboardFeature::Notifications => &mut self.notifications,
            DashboardFeature::DarkMode => &mut self.dark_mode,
            DashboardFeature::AutoPlay => &mut self.auto_play,
            DashboardFeature::Downloads => &mut self.downloads,
        };
        *flag = !*flag;
        let enabled = *flag;

        match serde_json::to_string(self) {
            Ok(json) => {
                if let Err(e) = store.set(storage_keys::DASHBOARD_FEATURES, &json).await {
                    warn!("Failed to persist dashboard preferences: {}", e);
                }
            }
            Err(e) => warn!("Failed to serialize dashboard preferences: {}", e),
        }
        enabled
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardSummary {
    pub display_name: String,
    pub stats: UserStats,
    pub registered_events: usize,
    pub conflicts: usize,
}

impl DashboardSummary {
    pub fn compute<Tz: TimeZone>(
        session: &Session,
        ledger: &RegistrationLedger,
        projector: &CalendarProjector<Tz>,
    ) -> Self {
        let records = ledger.records_for(&session.user_id);
        Self {
            display_name: session.display_name.clone(),
            stats: session.profile.stats,
            registered_events: records.len(),
            conflicts: projector.detect_conflicts(&records).len(),
        }
    }
}
