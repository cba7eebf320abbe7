//! crates/cinnarios_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to stay independent of the concrete storage, identity provider and UI sink.

use crate::domain::{AuthStateChange, IdentityUser, OAuthProvider, UserMetadata};
use crate::notify::{Notification, NotificationId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::Stream;
use std::pin::Pin;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., disk, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Not supported: {0}")]
    Unsupported(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

/// The stream of auth-state notifications handed out by [`IdentityService::subscribe`].
pub type AuthStateStream = Pin<Box<dyn Stream<Item = AuthStateChange> + Send>>;

/// Fixed keys under which the client keeps its state in local storage.
pub mod storage_keys {
    pub const USER: &str = "user";
    pub const REGISTERED_EVENTS: &str = "registeredEvents";
    pub const DASHBOARD_FEATURES: &str = "dashboardFeatures";
}

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// Client-local durable key-value storage holding UTF-8 JSON text.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Returns `Ok(None)` when nothing is stored under `key`.
    async fn get(&self, key: &str) -> PortResult<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> PortResult<()>;

    /// Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> PortResult<()>;
}

/// The external identity service. The core treats it as an opaque capability.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityService: Send + Sync {
    async fn get_current_user(&self) -> PortResult<Option<IdentityUser>>;

    async fn sign_in_with_password(&self, email: &str, password: &str) -> PortResult<IdentityUser>;

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: UserMetadata,
    ) -> PortResult<IdentityUser>;

    async fn sign_out(&self) -> PortResult<()>;

    async fn sign_in_with_oauth(&self, provider: OAuthProvider) -> PortResult<IdentityUser>;

    /// Opens a new stream of auth-state changes. Each call gets its own receiver.
    fn subscribe(&self) -> AuthStateStream;
}

/// Source of "now". Swapped for a fixed clock in tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Where notifications end up being displayed.
pub trait NotificationSink: Send + Sync {
    fn show(&self, notification: &Notification);
    fn dismiss(&self, id: NotificationId);
}
