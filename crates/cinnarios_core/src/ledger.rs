//! crates/cinnarios_core/src/ledger.rs
//!
//! The event registration ledger: who registered for what, and when.
//!
//! The ledger is the only writer of `Event::registered_users`. After every
//! operation the size of that set equals the number of ledger entries for
//! the event, across all users.

use crate::catalog::Catalog;
use crate::domain::{RegistrationRecord, Session};
use crate::error::{CoreError, CoreResult};
use crate::ports::{storage_keys, Clock, KeyValueStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// A registration record tagged with the user that owns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LedgerEntry {
    user_id: String,
    #[serde(flatten)]
    record: RegistrationRecord,
}

pub struct RegistrationLedger {
    entries: Vec<LedgerEntry>,
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
}

impl RegistrationLedger {
    pub fn new(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Vec::new(),
            store,
            clock,
        }
    }

    /// Reloads the persisted registrations and re-applies them to the catalog.
    ///
    /// A missing or malformed blob yields an empty ledger. Entries pointing at
    /// events the catalog does not know, and repeated (user, event) pairs, are
    /// dropped. Returns the number of entries kept.
    pub async fn restore(&mut self, catalog: &mut Catalog) -> usize {
        let raw = match self.store.get(storage_keys::REGISTERED_EVENTS).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return 0,
            Err(e) => {
                warn!("Failed to read registered events: {}", e);
                return 0;
            }
        };

        let stored: Vec<LedgerEntry> = match serde_json::from_str(&raw) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Ignoring malformed registered events: {}", e);
                return 0;
            }
        };

        self.entries.clear();
        for entry in stored {
            let duplicate = self.find(&entry.user_id, &entry.record.event_id).is_some();
            match catalog.event_mut(&entry.record.event_id) {
                Some(event) if !duplicate => {
                    event.registered_users.insert(entry.user_id.clone());
                    self.entries.push(entry);
                }
                _ => warn!(
                    event_id = %entry.record.event_id,
                    "Dropping registration for unknown or repeated event"
                ),
            }
        }

        info!("Restored {} event registrations.", self.entries.len());
        self.entries.len()
    }

    /// Registers the session's user for `event_id`.
    pub async fn register(
        &mut self,
        session: &Session,
        catalog: &mut Catalog,
        event_id: &str,
    ) -> CoreResult<RegistrationRecord> {
        if self.is_registered(session, event_id) {
            return Err(CoreError::AlreadyRegistered(event_id.to_string()));
        }

        let event = catalog
            .event_mut(event_id)
            .ok_or_else(|| CoreError::NotFound(format!("event {event_id}")))?;

        let record = RegistrationRecord {
            event_id: event_id.to_string(),
            title: event.title.clone(),
            registered_at: self.clock.now(),
        };
        event.registered_users.insert(session.user_id.clone());
        self.entries.push(LedgerEntry {
            user_id: session.user_id.clone(),
            record: record.clone(),
        });

        info!(user_id = %session.user_id, event_id, "Registered for event");
        self.persist().await;
        Ok(record)
    }

    pub async fn unregister(
        &mut self,
        session: &Session,
        catalog: &mut Catalog,
        event_id: &str,
    ) -> CoreResult<()> {
        let index = self
            .find(&session.user_id, event_id)
            .ok_or_else(|| CoreError::NotRegistered(event_id.to_string()))?;

        self.entries.remove(index);
        if let Some(event) = catalog.event_mut(event_id) {
            event.registered_users.remove(&session.user_id);
        }

        info!(user_id = %session.user_id, event_id, "Unregistered from event");
        self.persist().await;
        Ok(())
    }

    pub fn is_registered(&self, session: &Session, event_id: &str) -> bool {
        self.find(&session.user_id, event_id).is_some()
    }

    /// The records of one user, in registration order.
    pub fn records_for(&self, user_id: &str) -> Vec<RegistrationRecord> {
        self.entries
            .iter()
            .filter(|entry| entry.user_id == user_id)
            .map(|entry| entry.record.clone())
            .collect()
    }

    /// Number of registrations for `event_id` across all users.
    pub fn count_for_event(&self, event_id: &str) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.record.event_id == event_id)
            .count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn find(&self, user_id: &str, event_id: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|entry| entry.user_id == user_id && entry.record.event_id == event_id)
    }

    async fn persist(&self) {
        let json = match serde_json::to_string(&self.entries) {
            Ok(json) => json,
            Err(e) => {
                warn!("Failed to serialize registered events: {}", e);
                return;
            }
        };
        if let Err(e) = self.store.set(storage_keys::REGISTERED_EVENTS, &json).await {
            warn!("Failed to persist registered events: {}", e);
        }
    }
}
