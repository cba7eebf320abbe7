//! services/app/src/state.rs
//!
//! The composition root of the client. `App` owns every core service and is
//! driven one command at a time by the shell, so it needs no locking. Each
//! user-facing operation reports its outcome through the notifier.

use chrono::TimeZone;
use cinnarios_core::calendar::{CalendarProjector, Conflict, MonthCursor, MonthGrid};
use cinnarios_core::catalog::{Catalog, StarToggle};
use cinnarios_core::dashboard::{DashboardFeature, DashboardPreferences, DashboardSummary};
use cinnarios_core::domain::{
    AuthStateChange, OAuthProvider, ProfileUpdate, RegistrationRecord, Session, StatsUpdate,
};
use cinnarios_core::error::{CoreError, CoreResult};
use cinnarios_core::ledger::RegistrationLedger;
use cinnarios_core::navigation::{Navigator, Screen};
use cinnarios_core::notify::{Notification, NotificationId, Notifier};
use cinnarios_core::ports::{AuthStateStream, Clock, IdentityService, KeyValueStore, NotificationSink};
use cinnarios_core::session::{LoginRequest, RegistrationRequest, SessionStore};
use std::sync::Arc;
use tracing::{info, warn};

//=========================================================================================
// AppServices (the adapters handed to the composition root)
//=========================================================================================

#[derive(Clone)]
pub struct AppServices {
    pub store: Arc<dyn KeyValueStore>,
    pub identity: Arc<dyn IdentityService>,
    pub clock: Arc<dyn Clock>,
    pub sink: Arc<dyn NotificationSink>,
}

//=========================================================================================
// App
//=========================================================================================

pub struct App<Tz: TimeZone> {
    sessions: SessionStore,
    catalog: Catalog,
    ledger: RegistrationLedger,
    projector: CalendarProjector<Tz>,
    month: MonthCursor,
    notifier: Notifier,
    navigator: Navigator,
    dashboard: DashboardPreferences,
    store: Arc<dyn KeyValueStore>,
    identity: Arc<dyn IdentityService>,
    clock: Arc<dyn Clock>,
}

impl<Tz: TimeZone> App<Tz> {
    /// Builds every service and reloads persisted state: the session first,
    /// then the registrations, then the dashboard toggles.
    pub async fn boot(services: AppServices, tz: Tz) -> Self {
        let AppServices {
            store,
            identity,
            clock,
            sink,
        } = services;

        let mut sessions = SessionStore::new(identity.clone(), store.clone(), clock.clone());
        sessions.restore_session().await;
        sessions.sync_with_identity().await;

        let mut catalog = Catalog::seeded(clock.clone());
        let mut ledger = RegistrationLedger::new(store.clone(), clock.clone());
        let restored = ledger.restore(&mut catalog).await;

        let dashboard = DashboardPreferences::load(store.as_ref()).await;
        let projector = CalendarProjector::new(tz);
        let month = projector.current_month(&clock.now());

        let initial = if sessions.is_authenticated() {
            Screen::Home
        } else {
            Screen::Onboarding
        };
        info!(
            authenticated = sessions.is_authenticated(),
            registrations = restored,
            "Client booted"
        );

        Self {
            sessions,
            catalog,
            ledger,
            projector,
            month,
            notifier: Notifier::new(sink, clock.clone()),
            navigator: Navigator::new(initial),
            dashboard,
            store,
            identity,
            clock,
        }
    }

    /// A fresh stream of identity-service auth changes, for the shell loop.
    pub fn auth_changes(&self) -> AuthStateStream {
        self.identity.subscribe()
    }

    //=====================================================================================
    // Read-only views
    //=====================================================================================

    pub fn session(&self) -> Option<&Session> {
        self.sessions.current()
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn screen(&self) -> &Screen {
        self.navigator.current()
    }

    pub fn month(&self) -> MonthCursor {
        self.month
    }

    pub fn dashboard_preferences(&self) -> &DashboardPreferences {
        &self.dashboard
    }

    pub fn notification(&self) -> Option<&Notification> {
        self.notifier.visible(self.clock.now())
    }

    pub fn is_registered(&self, event_id: &str) -> bool {
        self.sessions
            .current()
            .is_some_and(|session| self.ledger.is_registered(session, event_id))
    }

    /// The current user's registrations, oldest first. Empty when signed out.
    pub fn registrations(&self) -> Vec<RegistrationRecord> {
        self.sessions
            .current()
            .map(|session| self.ledger.records_for(&session.user_id))
            .unwrap_or_default()
    }

    pub fn calendar(&self) -> MonthGrid {
        self.projector.render(self.month, &self.registrations())
    }

    pub fn conflicts(&self) -> Vec<Conflict> {
        self.projector.detect_conflicts(&self.registrations())
    }

    pub fn dashboard_summary(&self) -> CoreResult<DashboardSummary> {
        let session = self.sessions.current().ok_or(CoreError::NotAuthenticated)?;
        Ok(DashboardSummary::compute(
            session,
            &self.ledger,
            &self.projector,
        ))
    }

    //=====================================================================================
    // Authentication
    //=====================================================================================

    pub async fn login(&mut self, request: LoginRequest) -> CoreResult<Session> {
        let result = self.sessions.login(request).await;
        self.after_sign_in(result, "Login successful!")
    }

    pub async fn sign_up(&mut self, request: RegistrationRequest) -> CoreResult<Session> {
        let result = self.sessions.register(request).await;
        self.after_sign_in(result, "Account created successfully!")
    }

    pub async fn login_with_google(&mut self) -> CoreResult<Session> {
        let result = self.sessions.login_with_oauth(OAuthProvider::Google).await;
        self.after_sign_in(result, "Login successful!")
    }

    pub async fn logout(&mut self) {
        let was_signed_in = self.sessions.is_authenticated();
        self.sessions.logout().await;
        self.navigator.reset(Screen::Login);
        if was_signed_in {
            self.notifier.success("Logged out successfully");
        }
    }

    /// Applies a change pushed by the identity service between commands.
    pub async fn handle_auth_change(&mut self, change: AuthStateChange) {
        if !self.sessions.apply_auth_change(change).await {
            return;
        }
        match self.sessions.current() {
            Some(session) => {
                let message = format!("Signed in as {}", session.display_name);
                self.notifier.info(message);
            }
            None => {
                if self.navigator.current().is_protected() {
                    self.navigator.reset(Screen::Login);
                }
                self.notifier.info("You have been signed out");
            }
        }
    }

    fn after_sign_in(&mut self, result: CoreResult<Session>, message: &str) -> CoreResult<Session> {
        match &result {
            Ok(_) => {
                self.notifier.success(message);
                self.navigator.resume_after_login();
            }
            Err(e) => {
                self.notifier.error(e);
            }
        }
        result
    }

    //=====================================================================================
    // Navigation
    //=====================================================================================

    pub fn navigate(&mut self, target: Screen) -> &Screen {
        let authenticated = self.sessions.is_authenticated();
        let requested_login = target == Screen::Login;
        let screen = self.navigator.navigate(target, authenticated).clone();

        if screen == Screen::Login && !requested_login {
            self.notifier.info("Please log in to continue");
        } else if screen == Screen::Calendar {
            self.month = self.projector.current_month(&self.clock.now());
            if !self.conflicts().is_empty() {
                self.notifier
                    .warning("Schedule conflict detected! Check your calendar.");
            }
        }
        self.navigator.current()
    }

    pub fn back(&mut self) -> Option<&Screen> {
        let authenticated = self.sessions.is_authenticated();
        self.navigator.back(authenticated)
    }

    //=====================================================================================
    // Content
    //=====================================================================================

    pub async fn toggle_star(&mut self, documentary_id: &str) -> CoreResult<StarToggle> {
        let result = self.catalog.toggle_star(documentary_id);
        let toggle = match result {
            Ok(toggle) => toggle,
            Err(e) => {
                self.notifier.error(&e);
                return Err(e);
            }
        };

        if let Some(session) = self.sessions.current() {
            let starred = session.profile.stats.documentaries_starred;
            let starred = if toggle.starred {
                starred + 1
            } else {
                starred.saturating_sub(1)
            };
            self.sessions
                .update_stats(StatsUpdate {
                    documentaries_starred: Some(starred),
                    ..StatsUpdate::default()
                })
                .await;
        }

        if toggle.starred {
            self.notifier.success("Added to your starred documentaries");
        } else {
            self.notifier.info("Removed from your starred documentaries");
        }
        Ok(toggle)
    }

    pub fn comment(&mut self, documentary_id: &str, text: &str) -> CoreResult<String> {
        let result = match self.sessions.current() {
            Some(session) => self
                .catalog
                .add_comment(documentary_id, session.into(), text),
            None => Err(CoreError::NotAuthenticated),
        };
        match &result {
            Ok(_) => {
                self.notifier.success("Comment added");
            }
            Err(e) => {
                self.notifier.error(e);
            }
        }
        result
    }

    //=====================================================================================
    // Events
    //=====================================================================================

    pub async fn register_for_event(&mut self, event_id: &str) -> CoreResult<RegistrationRecord> {
        let result = match self.sessions.current() {
            Some(session) => {
                self.ledger
                    .register(session, &mut self.catalog, event_id)
                    .await
            }
            None => Err(CoreError::NotAuthenticated),
        };
        match &result {
            Ok(record) => {
                let message = format!("Successfully registered for \"{}\"", record.title);
                self.notifier.success(message);
            }
            Err(e) => {
                self.notifier.error(e);
            }
        }
        result
    }

    pub async fn unregister_from_event(&mut self, event_id: &str) -> CoreResult<()> {
        let title = self
            .catalog
            .event(event_id)
            .map(|event| event.title.clone())
            .unwrap_or_else(|| event_id.to_string());
        let result = match self.sessions.current() {
            Some(session) => {
                self.ledger
                    .unregister(session, &mut self.catalog, event_id)
                    .await
            }
            None => Err(CoreError::NotAuthenticated),
        };
        match &result {
            Ok(()) => {
                self.notifier.info(format!("Unregistered from \"{}\"", title));
            }
            Err(e) => {
                self.notifier.error(e);
            }
        }
        result
    }

    //=====================================================================================
    // Calendar
    //=====================================================================================

    /// Stays on the displayed month at the end of the representable range.
    pub fn next_month(&mut self) -> MonthGrid {
        match self.month.next() {
            Some(month) => self.month = month,
            None => warn!(month = %self.month.label(), "No later month to show"),
        }
        self.calendar()
    }

    pub fn previous_month(&mut self) -> MonthGrid {
        match self.month.previous() {
            Some(month) => self.month = month,
            None => warn!(month = %self.month.label(), "No earlier month to show"),
        }
        self.calendar()
    }

    /// Lists the registrations on `day` of the displayed month.
    pub fn select_day(&mut self, day: u32) -> CoreResult<Vec<RegistrationRecord>> {
        let result = self
            .month
            .date(day)
            .ok_or_else(|| CoreError::Validation(format!("Invalid day: {day}")))
            .map(|date| {
                let events = self.projector.events_for_day(date, &self.registrations());
                (date, events)
            });

        match result {
            Ok((date, events)) => {
                let label = date.format("%B %-d, %Y");
                if events.is_empty() {
                    self.notifier.info(format!("No events scheduled for {label}"));
                } else {
                    let list: Vec<String> = events
                        .iter()
                        .map(|record| format!("- {}", record.title))
                        .collect();
                    self.notifier
                        .info(format!("Events on {label}:\n{}", list.join("\n")));
                }
                Ok(events)
            }
            Err(e) => {
                self.notifier.error(&e);
                Err(e)
            }
        }
    }

    //=====================================================================================
    // Dashboard & Profile
    //=====================================================================================

    pub async fn toggle_feature(&mut self, feature: DashboardFeature) -> CoreResult<bool> {
        if !self.sessions.is_authenticated() {
            let e = CoreError::NotAuthenticated;
            self.notifier.error(&e);
            return Err(e);
        }
        let enabled = self.dashboard.toggle(feature, self.store.as_ref()).await;
        if enabled {
            self.notifier.success(format!("{} enabled", feature.label()));
        } else {
            self.notifier.info(format!("{} disabled", feature.label()));
        }
        Ok(enabled)
    }

    pub async fn update_profile(&mut self, update: ProfileUpdate) -> CoreResult<()> {
        if self.sessions.update_profile(update).await {
            self.notifier.success("Profile updated");
            Ok(())
        } else {
            let e = CoreError::NotAuthenticated;
            self.notifier.error(&e);
            Err(e)
        }
    }

    //=====================================================================================
    // Notifications
    //=====================================================================================

    /// Dismisses the visible notification. Returns false if none was showing.
    pub fn dismiss_notification(&mut self) -> bool {
        match self.notifier.visible(self.clock.now()).map(|n| n.id) {
            Some(id) => self.notifier.dismiss(id),
            None => false,
        }
    }

    /// Takes notification `id` off screen when its auto-dismiss timer fires.
    /// Returns false if another notification has replaced it since.
    pub fn notification_timed_out(&mut self, id: NotificationId) -> bool {
        self.notifier.dismiss(id)
    }

    /// Drops the visible notification once its timeout has passed.
    pub fn expire_notifications(&mut self) -> bool {
        self.notifier.expire(self.clock.now())
    }
}
