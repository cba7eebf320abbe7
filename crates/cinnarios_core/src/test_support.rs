//! Shared fakes for the unit tests of this crate.

use crate::notify::{Notification, NotificationId};
use crate::ports::{Clock, KeyValueStore, NotificationSink, PortError, PortResult};
use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::collections::HashMap;
use std::sync::Mutex;

pub(crate) struct FixedClock(Mutex<DateTime<Utc>>);

impl FixedClock {
    pub(crate) fn at(year: i32, month: u32, day: u32, hour: u32, min: u32, sec: u32) -> Self {
        Self(Mutex::new(
            Utc.with_ymd_and_hms(year, month, day, hour, min, sec).unwrap(),
        ))
    }

    pub(crate) fn advance(&self, by: Duration) {
        let mut now = self.0.lock().unwrap();
        *now += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap()
    }
}

#[derive(Default)]
pub(crate) struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub(crate) fn raw(&self, key: &str) -> Option<String> {
        self.values.lock().unwrap().get(key).cloned()
    }

    pub(crate) fn put_raw(&self, key: &str, value: &str) {
        self.values
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> PortResult<Option<String>> {
        Ok(self.raw(key))
    }

    async fn set(&self, key: &str, value: &str) -> PortResult<()> {
        self.put_raw(key, value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> PortResult<()> {
        self.values.lock().unwrap().remove(key);
        Ok(())
    }
}

/// A store whose disk is permanently broken.
pub(crate) struct FailingStore;

#[async_trait]
impl KeyValueStore for FailingStore {
    async fn get(&self, _key: &str) -> PortResult<Option<String>> {
        Err(PortError::Unexpected("disk unavailable".to_string()))
    }

    async fn set(&self, _key: &str, _value: &str) -> PortResult<()> {
        Err(PortError::Unexpected("disk unavailable".to_string()))
    }

    async fn remove(&self, _key: &str) -> PortResult<()> {
        Err(PortError::Unexpected("disk unavailable".to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SinkCall {
    Show(NotificationId, String),
    Dismiss(NotificationId),
}

#[derive(Default)]
pub(crate) struct RecordingSink {
    calls: Mutex<Vec<SinkCall>>,
}

impl RecordingSink {
    pub(crate) fn calls(&self) -> Vec<SinkCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl NotificationSink for RecordingSink {
    fn show(&self, notification: &Notification) {
        self.calls
            .lock()
            .unwrap()
            .push(SinkCall::Show(notification.id, notification.message.clone()));
    }

    fn dismiss(&self, id: NotificationId) {
        self.calls.lock().unwrap().push(SinkCall::Dismiss(id));
    }
}
