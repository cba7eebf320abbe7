//! services/app/src/adapters/identity.rs
//!
//! A simulated identity provider implementing the `IdentityService` port.
//!
//! Every password call waits for the configured latency and then fails with a
//! network error at the configured rate. The demo account is always present;
//! accounts created with `sign_up` live for the lifetime of the process and
//! their passwords are stored as Argon2 hashes.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use cinnarios_core::domain::{AuthStateChange, IdentityUser, OAuthProvider, UserMetadata};
use cinnarios_core::ports::{AuthStateStream, IdentityService, PortError, PortResult};
use futures::stream;
use rand::Rng;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::{broadcast, Mutex};
use tracing::{error, info, warn};
use uuid::Uuid;

pub const DEMO_EMAIL: &str = "demo@cinnarios.com";
pub const DEMO_PASSWORD: &str = "password123";

const NETWORK_ERROR: &str = "Network error. Please try again.";

struct Account {
    user: IdentityUser,
    password_hash: String,
}

pub struct MockIdentityService {
    latency: Duration,
    failure_rate: f64,
    accounts: Mutex<HashMap<String, Account>>,
    current: Mutex<Option<IdentityUser>>,
    events: broadcast::Sender<AuthStateChange>,
}

impl MockIdentityService {
    /// `failure_rate` must lie in `[0, 1]`.
    pub fn new(latency: Duration, failure_rate: f64) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            latency,
            failure_rate: failure_rate.clamp(0.0, 1.0),
            accounts: Mutex::new(HashMap::new()),
            current: Mutex::new(None),
            events,
        }
    }

    pub fn demo_user() -> IdentityUser {
        IdentityUser {
            id: "1".to_string(),
            email: DEMO_EMAIL.to_string(),
            metadata: UserMetadata {
                username: Some("demo".to_string()),
                first_name: Some("Demo".to_string()),
                last_name: Some("User".to_string()),
                avatar_url: None,
            },
        }
    }

    /// Waits out the simulated round trip and rolls for a network failure.
    async fn round_trip(&self) -> PortResult<()> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        if self.roll_failure() {
            warn!("Simulated identity service failure");
            return Err(PortError::Unexpected(NETWORK_ERROR.to_string()));
        }
        Ok(())
    }

    fn roll_failure(&self) -> bool {
        rand::thread_rng().gen_bool(self.failure_rate)
    }

    async fn set_current(&self, user: IdentityUser) {
        *self.current.lock().await = Some(user.clone());
        // No subscribers is fine.
        let _ = self.events.send(AuthStateChange::SignedIn(user));
    }
}

fn hash_password(password: &str) -> PortResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            error!("Failed to hash password: {:?}", e);
            PortError::Unexpected("Failed to create account".to_string())
        })
}

fn verify_password(password: &str, password_hash: &str) -> bool {
    match PasswordHash::new(password_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            error!("Failed to parse password hash: {:?}", e);
            false
        }
    }
}

#[async_trait]
impl IdentityService for MockIdentityService {
    async fn get_current_user(&self) -> PortResult<Option<IdentityUser>> {
        Ok(self.current.lock().await.clone())
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> PortResult<IdentityUser> {
        self.round_trip().await?;

        // Emails are matched case-insensitively, as in `sign_up`.
        let key = email.to_lowercase();
        let user = if key == DEMO_EMAIL && password == DEMO_PASSWORD {
            Self::demo_user()
        } else {
            let accounts = self.accounts.lock().await;
            let found = accounts
                .get(&key)
                .filter(|account| verify_password(password, &account.password_hash))
                .map(|account| account.user.clone());
            found.ok_or(PortError::Unauthorized)?
        };

        info!(user_id = %user.id, "Identity sign-in");
        self.set_current(user.clone()).await;
        Ok(user)
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: UserMetadata,
    ) -> PortResult<IdentityUser> {
        self.round_trip().await?;

        let key = email.to_lowercase();
        let user = {
            let mut accounts = self.accounts.lock().await;
            if key == DEMO_EMAIL || accounts.contains_key(&key) {
                return Err(PortError::Unexpected(
                    "An account with this email already exists".to_string(),
                ));
            }
            let user = IdentityUser {
                id: Uuid::new_v4().to_string(),
                email: email.to_string(),
                metadata,
            };
            let password_hash = hash_password(password)?;
            accounts.insert(
                key,
                Account {
                    user: user.clone(),
                    password_hash,
                },
            );
            user
        };

        info!(user_id = %user.id, "Identity account created");
        self.set_current(user.clone()).await;
        Ok(user)
    }

    async fn sign_out(&self) -> PortResult<()> {
        if self.current.lock().await.take().is_some() {
            let _ = self.events.send(AuthStateChange::SignedOut);
        }
        Ok(())
    }

    async fn sign_in_with_oauth(&self, provider: OAuthProvider) -> PortResult<IdentityUser> {
        match provider {
            OAuthProvider::Google => Err(PortError::Unsupported(
                "Google authentication coming soon!".to_string(),
            )),
        }
    }

    fn subscribe(&self) -> AuthStateStream {
        let rx = self.events.subscribe();
        Box::pin(stream::unfold(rx, |mut rx| async move {
            loop {
                match rx.recv().await {
                    Ok(change) => return Some((change, rx)),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Auth state subscriber lagged behind");
                    }
                    Err(broadcast::error::RecvError::Closed) => return None,
                }
            }
        }))
    }
}
