//! crates/cinnarios_core/src/session.rs
//!
//! The session store: owns the authenticated identity and its profile for the
//! current client run, and keeps a copy of it in local storage.
//!
//! Every mutating operation re-persists the full session blob before it
//! returns. Storage failures are logged and otherwise ignored; the in-memory
//! session stays authoritative for the rest of the run.

use crate::domain::{
    AuthStateChange, IdentityUser, OAuthProvider, ProfileUpdate, Session, StatsUpdate,
    UserMetadata,
};
use crate::error::{CoreError, CoreResult};
use crate::ports::{storage_keys, Clock, IdentityService, KeyValueStore, PortError};
use crate::validation::is_well_formed_email;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Bumped whenever the persisted session layout changes incompatibly.
pub const SESSION_SCHEMA_VERSION: u32 = 1;

//=========================================================================================
// Request Types
//=========================================================================================

#[derive(Debug, Clone)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    /// `None` when the login form has no "remember me" box.
    pub remember: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct RegistrationRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    /// `None` when the sign-up form has no terms checkbox.
    pub accept_terms: Option<bool>,
}

//=========================================================================================
// Persisted Blob
//=========================================================================================

#[derive(Serialize)]
struct PersistedSessionRef<'a> {
    schema_version: u32,
    session: &'a Session,
}

#[derive(Deserialize)]
struct PersistedHeader {
    schema_version: u32,
}

#[derive(Deserialize)]
struct PersistedSession {
    session: Session,
}

//=========================================================================================
// The Session Store
//=========================================================================================

pub struct SessionStore {
    identity: Arc<dyn IdentityService>,
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    current: Option<Session>,
}

impl SessionStore {
    pub fn new(
        identity: Arc<dyn IdentityService>,
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            identity,
            store,
            clock,
            current: None,
        }
    }

    pub fn current(&self) -> Option<&Session> {
        self.current.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.current.as_ref().is_some_and(|s| s.is_authenticated)
    }

    /// Signs in with email and password.
    ///
    /// Validation failures are reported before the identity service is
    /// contacted. On any failure the previous session (or its absence) is
    /// left untouched.
    pub async fn login(&mut self, request: LoginRequest) -> CoreResult<Session> {
        let email = request.email.trim();
        if email.is_empty() || request.password.is_empty() {
            return Err(CoreError::Validation(
                "Please enter your email and password".to_string(),
            ));
        }
        if !is_well_formed_email(email) {
            return Err(CoreError::Validation(
                "Please enter a valid email address".to_string(),
            ));
        }

        let user = self
            .identity
            .sign_in_with_password(email, &request.password)
            .await
            .map_err(auth_error)?;

        let session =
            Session::from_identity(&user, self.clock.now(), request.remember.unwrap_or(false));
        info!(user_id = %session.user_id, "Login successful");
        Ok(self.establish(session).await)
    }

    /// Creates an account and signs straight into it.
    pub async fn register(&mut self, request: RegistrationRequest) -> CoreResult<Session> {
        let username = request.username.trim();
        let email = request.email.trim();
        if username.is_empty() || email.is_empty() || request.password.is_empty() {
            return Err(CoreError::Validation(
                "Please fill in all required fields".to_string(),
            ));
        }
        if request.password != request.confirm_password {
            return Err(CoreError::Validation("Passwords do not match".to_string()));
        }
        if request.accept_terms == Some(false) {
            return Err(CoreError::Validation(
                "Please accept the terms and conditions".to_string(),
            ));
        }
        if !is_well_formed_email(email) {
            return Err(CoreError::Validation(
                "Please enter a valid email address".to_string(),
            ));
        }

        let metadata = UserMetadata {
            username: Some(username.to_string()),
            ..UserMetadata::default()
        };
        let user = self
            .identity
            .sign_up(email, &request.password, metadata)
            .await
            .map_err(auth_error)?;

        let session = Session::from_identity(&user, self.clock.now(), false);
        info!(user_id = %session.user_id, "Account created");
        Ok(self.establish(session).await)
    }

    pub async fn login_with_oauth(&mut self, provider: OAuthProvider) -> CoreResult<Session> {
        let user = self
            .identity
            .sign_in_with_oauth(provider)
            .await
            .map_err(auth_error)?;

        let session = Session::from_identity(&user, self.clock.now(), false);
        info!(user_id = %session.user_id, ?provider, "OAuth login successful");
        Ok(self.establish(session).await)
    }

    /// Ends the session. Calling it without an active session has no effect
    /// beyond making sure nothing is left in storage.
    pub async fn logout(&mut self) {
        if let Some(session) = self.current.take() {
            if let Err(e) = self.identity.sign_out().await {
                warn!("Identity service sign-out failed: {}", e);
            }
            info!(user_id = %session.user_id, "Logged out");
        }
        self.remove_persisted().await;
    }

    /// Reloads the persisted session at startup. Never fails: a missing,
    /// unreadable, unparsable or foreign-version blob means "no session".
    pub async fn restore_session(&mut self) -> Option<Session> {
        let raw = match self.store.get(storage_keys::USER).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!("No persisted session found.");
                return None;
            }
            Err(e) => {
                warn!("Failed to read persisted session: {}", e);
                return None;
            }
        };

        let header: PersistedHeader = match serde_json::from_str(&raw) {
            Ok(header) => header,
            Err(e) => {
                warn!("Ignoring unparsable persisted session: {}", e);
                return None;
            }
        };
        if header.schema_version != SESSION_SCHEMA_VERSION {
            warn!(
                found = header.schema_version,
                expected = SESSION_SCHEMA_VERSION,
                "Ignoring persisted session from another schema version"
            );
            return None;
        }

        match serde_json::from_str::<PersistedSession>(&raw) {
            Ok(persisted) => {
                info!(user_id = %persisted.session.user_id, "Restored persisted session");
                self.current = Some(persisted.session.clone());
                Some(persisted.session)
            }
            Err(e) => {
                warn!("Ignoring malformed persisted session: {}", e);
                None
            }
        }
    }

    /// Adopts the identity service's current user when no session is active.
    pub async fn sync_with_identity(&mut self) -> Option<&Session> {
        if self.current.is_none() {
            match self.identity.get_current_user().await {
                Ok(Some(user)) => {
                    let session = Session::from_identity(&user, self.clock.now(), false);
                    self.establish(session).await;
                }
                Ok(None) => {}
                Err(e) => warn!("Failed to query the identity service: {}", e),
            }
        }
        self.current.as_ref()
    }

    /// Applies a change pushed by the identity service. Returns true when the
    /// local session changed as a result.
    pub async fn apply_auth_change(&mut self, change: AuthStateChange) -> bool {
        match change {
            AuthStateChange::SignedIn(user) => {
                if self.is_current_user(&user) {
                    return false;
                }
                let session = Session::from_identity(&user, self.clock.now(), false);
                info!(user_id = %session.user_id, "Signed in by identity service");
                self.establish(session).await;
                true
            }
            AuthStateChange::SignedOut => {
                if self.current.take().is_none() {
                    return false;
                }
                info!("Signed out by identity service");
                self.remove_persisted().await;
                true
            }
        }
    }

    /// Merges `update` into the current profile. A no-op without a session.
    pub async fn update_profile(&mut self, update: ProfileUpdate) -> bool {
        let Some(session) = self.current.as_mut() else {
            return false;
        };

        if let Some(display_name) = update.display_name {
            session.display_name = display_name;
        }
        let profile = &mut session.profile;
        if let Some(username) = update.username {
            profile.username = username;
        }
        if let Some(bio) = update.bio {
            profile.bio = Some(bio);
        }
        if let Some(picture) = update.profile_picture {
            profile.profile_picture = Some(picture);
        }
        if let Some(notifications) = update.notifications {
            profile.preferences.notifications = notifications;
        }
        if let Some(dark_mode) = update.dark_mode {
            profile.preferences.dark_mode = dark_mode;
        }
        if let Some(language) = update.language {
            profile.preferences.language = language;
        }

        self.persist().await;
        true
    }

    /// Merges `update` into the current stats. A no-op without a session.
    pub async fn update_stats(&mut self, update: StatsUpdate) -> bool {
        let Some(session) = self.current.as_mut() else {
            return false;
        };

        let stats = &mut session.profile.stats;
        if let Some(n) = update.documentaries_watched {
            stats.documentaries_watched = n;
        }
        if let Some(n) = update.documentaries_starred {
            stats.documentaries_starred = n;
        }
        if let Some(n) = update.events_attended {
            stats.events_attended = n;
        }
        if let Some(n) = update.events_missed {
            stats.events_missed = n;
        }
        if let Some(n) = update.events_canceled {
            stats.events_canceled = n;
        }

        self.persist().await;
        true
    }

    fn is_current_user(&self, user: &IdentityUser) -> bool {
        self.current.as_ref().is_some_and(|s| s.user_id == user.id)
    }

    async fn establish(&mut self, session: Session) -> Session {
        self.current = Some(session.clone());
        self.persist().await;
        session
    }

    async fn persist(&self) {
        let Some(session) = self.current.as_ref() else {
            return;
        };
        let blob = PersistedSessionRef {
            schema_version: SESSION_SCHEMA_VERSION,
            session,
        };
        let json = match serde_json::to_string(&blob) {
            Ok(json) => json,
            Err(e) => {
                warn!("Failed to serialize session: {}", e);
                return;
            }
        };
        if let Err(e) = self.store.set(storage_keys::USER, &json).await {
            warn!("Failed to persist session: {}", e);
        }
    }

    async fn remove_persisted(&self) {
        if let Err(e) = self.store.remove(storage_keys::USER).await {
            warn!("Failed to remove persisted session: {}", e);
        }
    }
}

fn auth_error(error: PortError) -> CoreError {
    match error {
        PortError::Unauthorized | PortError::NotFound(_) => {
            CoreError::Auth("Invalid credentials".to_string())
        }
        PortError::Unexpected(message) | PortError::Unsupported(message) => {
            CoreError::Auth(message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::UserStats;
    use crate::ports::MockIdentityService;
    use crate::test_support::{FailingStore, FixedClock, MemoryStore};

    const DEMO_EMAIL: &str = "demo@cinnarios.com";
    const DEMO_PASSWORD: &str = "password123";

    fn demo_user() -> IdentityUser {
        IdentityUser {
            id: "1".to_string(),
            email: DEMO_EMAIL.to_string(),
            metadata: UserMetadata {
                first_name: Some("Demo".to_string()),
                last_name: Some("User".to_string()),
                ..UserMetadata::default()
            },
        }
    }

    /// An identity service that knows only the demo credential.
    fn demo_identity() -> MockIdentityService {
        let mut identity = MockIdentityService::new();
        identity
            .expect_sign_in_with_password()
            .returning(|email, password| {
                if email == DEMO_EMAIL && password == DEMO_PASSWORD {
                    Ok(demo_user())
                } else {
                    Err(PortError::Unauthorized)
                }
            });
        identity
    }

    fn store_with(identity: MockIdentityService) -> (SessionStore, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::default());
        let clock = Arc::new(FixedClock::at(2024, 3, 1, 12, 0, 0));
        (
            SessionStore::new(Arc::new(identity), store.clone(), clock),
            store,
        )
    }

    fn login(email: &str, password: &str) -> LoginRequest {
        LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
            remember: None,
        }
    }

    fn registration(password: &str, confirm: &str) -> RegistrationRequest {
        RegistrationRequest {
            username: "amara".to_string(),
            email: "amara@cinnarios.com".to_string(),
            password: password.to_string(),
            confirm_password: confirm.to_string(),
            accept_terms: None,
        }
    }

    #[tokio::test]
    async fn test_demo_login_succeeds_and_persists() {
        let (mut sessions, store) = store_with(demo_identity());

        let session = sessions.login(login(DEMO_EMAIL, DEMO_PASSWORD)).await.unwrap();
        assert_eq!(session.email, DEMO_EMAIL);
        assert_eq!(session.display_name, "Demo");
        assert!(session.is_authenticated);
        assert!(sessions.is_authenticated());
        assert!(store.raw(storage_keys::USER).unwrap().contains(DEMO_EMAIL));
    }

    #[tokio::test]
    async fn test_wrong_password_leaves_state_unchanged() {
        let (mut sessions, store) = store_with(demo_identity());

        let result = sessions.login(login(DEMO_EMAIL, "wrong")).await;
        assert_eq!(result, Err(CoreError::Auth("Invalid credentials".to_string())));
        assert!(sessions.current().is_none());
        assert!(store.raw(storage_keys::USER).is_none());

        let before = sessions.login(login(DEMO_EMAIL, DEMO_PASSWORD)).await.unwrap();
        let persisted = store.raw(storage_keys::USER);
        assert!(sessions.login(login(DEMO_EMAIL, "wrong")).await.is_err());
        assert_eq!(sessions.current(), Some(&before));
        assert_eq!(store.raw(storage_keys::USER), persisted);
    }

    #[tokio::test]
    async fn test_login_validation_skips_identity_service() {
        let mut identity = MockIdentityService::new();
        identity.expect_sign_in_with_password().never();
        let (mut sessions, _store) = store_with(identity);

        assert!(matches!(
            sessions.login(login("", DEMO_PASSWORD)).await,
            Err(CoreError::Validation(_))
        ));
        assert!(matches!(
            sessions.login(login(DEMO_EMAIL, "")).await,
            Err(CoreError::Validation(_))
        ));
        assert!(matches!(
            sessions.login(login("not-an-email", DEMO_PASSWORD)).await,
            Err(CoreError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_remember_flag_is_kept() {
        let (mut sessions, _store) = store_with(demo_identity());
        let mut request = login(DEMO_EMAIL, DEMO_PASSWORD);
        request.remember = Some(true);

        assert!(sessions.login(request).await.unwrap().remember);
    }

    #[tokio::test]
    async fn test_register_validation() {
        let mut identity = MockIdentityService::new();
        identity.expect_sign_up().never();
        let (mut sessions, _store) = store_with(identity);

        assert_eq!(
            sessions.register(registration("secret1", "secret2")).await,
            Err(CoreError::Validation("Passwords do not match".to_string()))
        );

        let mut missing = registration("secret1", "secret1");
        missing.username = "  ".to_string();
        assert!(matches!(
            sessions.register(missing).await,
            Err(CoreError::Validation(_))
        ));

        let mut terms = registration("secret1", "secret1");
        terms.accept_terms = Some(false);
        assert_eq!(
            sessions.register(terms).await,
            Err(CoreError::Validation(
                "Please accept the terms and conditions".to_string()
            ))
        );
        assert!(sessions.current().is_none());
    }

    #[tokio::test]
    async fn test_register_creates_fresh_profile() {
        let mut identity = MockIdentityService::new();
        identity
            .expect_sign_up()
            .withf(|email: &str, password: &str, metadata: &UserMetadata| {
                email == "amara@cinnarios.com"
                    && password == "secret1"
                    && metadata.username.as_deref() == Some("amara")
            })
            .times(1)
            .returning(|email, _, metadata| {
                Ok(IdentityUser {
                    id: "u-42".to_string(),
                    email: email.to_string(),
                    metadata,
                })
            });
        let (mut sessions, _store) = store_with(identity);

        let session = sessions
            .register(registration("secret1", "secret1"))
            .await
            .unwrap();
        assert_eq!(session.user_id, "u-42");
        assert_eq!(session.profile.username, "amara");
        assert_eq!(session.profile.stats, UserStats::default());
        assert!(session.profile.preferences.notifications);
        assert_eq!(session.profile.preferences.language, "en");
    }

    #[tokio::test]
    async fn test_logout_is_idempotent() {
        let mut identity = demo_identity();
        identity.expect_sign_out().times(1).returning(|| Ok(()));
        let (mut sessions, store) = store_with(identity);

        sessions.login(login(DEMO_EMAIL, DEMO_PASSWORD)).await.unwrap();
        sessions.logout().await;
        assert!(sessions.current().is_none());
        assert!(store.raw(storage_keys::USER).is_none());

        sessions.logout().await;
        assert!(sessions.current().is_none());
    }

    #[tokio::test]
    async fn test_restore_round_trip() {
        let (mut sessions, store) = store_with(demo_identity());
        let original = sessions.login(login(DEMO_EMAIL, DEMO_PASSWORD)).await.unwrap();

        let clock = Arc::new(FixedClock::at(2024, 3, 2, 8, 0, 0));
        let mut restarted = SessionStore::new(Arc::new(MockIdentityService::new()), store, clock);
        assert_eq!(restarted.restore_session().await, Some(original.clone()));
        assert_eq!(restarted.current(), Some(&original));
    }

    #[tokio::test]
    async fn test_restore_ignores_missing_and_corrupt_blobs() {
        let (mut sessions, store) = store_with(MockIdentityService::new());
        assert_eq!(sessions.restore_session().await, None);

        for blob in [
            "",
            "{not json",
            r#"{"schema_version":1}"#,
            r#"{"schema_version":99,"session":{}}"#,
            r#"[1,2,3]"#,
        ] {
            store.put_raw(storage_keys::USER, blob);
            assert_eq!(sessions.restore_session().await, None, "blob: {blob}");
            assert!(sessions.current().is_none());
        }

        let mut broken = SessionStore::new(
            Arc::new(MockIdentityService::new()),
            Arc::new(FailingStore),
            Arc::new(FixedClock::at(2024, 3, 1, 12, 0, 0)),
        );
        assert_eq!(broken.restore_session().await, None);
    }

    #[tokio::test]
    async fn test_updates_merge_and_persist() {
        let (mut sessions, store) = store_with(demo_identity());
        assert!(!sessions.update_stats(StatsUpdate::default()).await);

        sessions.login(login(DEMO_EMAIL, DEMO_PASSWORD)).await.unwrap();
        assert!(
            sessions
                .update_profile(ProfileUpdate {
                    bio: Some("Storyteller".to_string()),
                    dark_mode: Some(true),
                    ..ProfileUpdate::default()
                })
                .await
        );
        assert!(
            sessions
                .update_stats(StatsUpdate {
                    events_attended: Some(3),
                    ..StatsUpdate::default()
                })
                .await
        );

        let profile = &sessions.current().unwrap().profile;
        assert_eq!(profile.bio.as_deref(), Some("Storyteller"));
        assert!(profile.preferences.dark_mode);
        assert!(profile.preferences.notifications);
        assert_eq!(profile.stats.events_attended, 3);
        assert_eq!(profile.stats.events_missed, 0);
        assert!(store.raw(storage_keys::USER).unwrap().contains("Storyteller"));
    }

    #[tokio::test]
    async fn test_auth_state_changes() {
        let (mut sessions, store) = store_with(MockIdentityService::new());

        assert!(sessions.apply_auth_change(AuthStateChange::SignedIn(demo_user())).await);
        assert!(!sessions.apply_auth_change(AuthStateChange::SignedIn(demo_user())).await);
        assert!(store.raw(storage_keys::USER).is_some());

        assert!(sessions.apply_auth_change(AuthStateChange::SignedOut).await);
        assert!(!sessions.apply_auth_change(AuthStateChange::SignedOut).await);
        assert!(store.raw(storage_keys::USER).is_none());
    }

    #[tokio::test]
    async fn test_sync_adopts_identity_user() {
        let mut identity = MockIdentityService::new();
        identity
            .expect_get_current_user()
            .times(1)
            .returning(|| Ok(Some(demo_user())));
        let (mut sessions, _store) = store_with(identity);

        assert_eq!(sessions.sync_with_identity().await.map(|s| s.user_id.as_str()), Some("1"));
        // Already signed in: the identity service is not asked again.
        assert!(sessions.sync_with_identity().await.is_some());
    }

    #[tokio::test]
    async fn test_oauth_failure_is_auth_error() {
        let mut identity = MockIdentityService::new();
        identity
            .expect_sign_in_with_oauth()
            .returning(|_| Err(PortError::Unsupported("Google authentication coming soon!".to_string())));
        let (mut sessions, _store) = store_with(identity);

        assert_eq!(
            sessions.login_with_oauth(OAuthProvider::Google).await,
            Err(CoreError::Auth("Google authentication coming soon!".to_string()))
        );
    }
}
