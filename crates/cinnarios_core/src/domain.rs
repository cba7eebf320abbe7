//! crates/cinnarios_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! Everything that is persisted derives `Serialize`/`Deserialize`; the wire
//! shape of those types is the shape of the local storage blobs.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

//=========================================================================================
// Session & Profile
//=========================================================================================

/// The authenticated identity and its live profile data for the current client run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: String,
    pub email: String,
    pub display_name: String,
    pub is_authenticated: bool,
    /// Set from the login form's "remember me" box.
    #[serde(default)]
    pub remember: bool,
    pub profile: UserProfile,
}

impl Session {
    /// Builds a fresh session for a user handed back by the identity service.
    /// Preferences start at their defaults and every stat starts at zero.
    pub fn from_identity(user: &IdentityUser, created_at: DateTime<Utc>, remember: bool) -> Self {
        let username = user
            .metadata
            .username
            .clone()
            .unwrap_or_else(|| email_local_part(&user.email).to_string());

        Self {
            user_id: user.id.clone(),
            email: user.email.clone(),
            display_name: user.display_name(),
            is_authenticated: true,
            remember,
            profile: UserProfile {
                username,
                bio: None,
                profile_picture: user.metadata.avatar_url.clone(),
                created_at,
                preferences: Preferences::default(),
                stats: UserStats::default(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub username: String,
    pub bio: Option<String>,
    pub profile_picture: Option<String>,
    pub created_at: DateTime<Utc>,
    pub preferences: Preferences,
    pub stats: UserStats,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    pub notifications: bool,
    pub dark_mode: bool,
    pub language: String,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            notifications: true,
            dark_mode: false,
            language: "en".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStats {
    pub documentaries_watched: u32,
    pub documentaries_starred: u32,
    pub events_attended: u32,
    pub events_missed: u32,
    pub events_canceled: u32,
}

/// A partial update of the profile. `None` leaves the field as it is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub display_name: Option<String>,
    pub username: Option<String>,
    pub bio: Option<String>,
    pub profile_picture: Option<String>,
    pub notifications: Option<bool>,
    pub dark_mode: Option<bool>,
    pub language: Option<String>,
}

/// A partial update of the profile statistics.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatsUpdate {
    pub documentaries_watched: Option<u32>,
    pub documentaries_starred: Option<u32>,
    pub events_attended: Option<u32>,
    pub events_missed: Option<u32>,
    pub events_canceled: Option<u32>,
}

//=========================================================================================
// Identity (as seen through the identity port)
//=========================================================================================

/// A user as reported by the external identity service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityUser {
    pub id: String,
    pub email: String,
    pub metadata: UserMetadata,
}

impl IdentityUser {
    /// First name when the provider knows it, then the username, then the
    /// part of the email before the `@`.
    pub fn display_name(&self) -> String {
        self.metadata
            .first_name
            .clone()
            .or_else(|| self.metadata.username.clone())
            .unwrap_or_else(|| email_local_part(&self.email).to_string())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserMetadata {
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub avatar_url: Option<String>,
}

/// Notifications pushed by the identity service when its session changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthStateChange {
    SignedIn(IdentityUser),
    SignedOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OAuthProvider {
    Google,
}

fn email_local_part(email: &str) -> &str {
    email.split('@').next().unwrap_or(email)
}

//=========================================================================================
// Catalog Content
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentaryType {
    Video,
    Article,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artist {
    pub name: String,
    pub profession: String,
    pub country: String,
    pub bio: String,
}

/// A documentary. Only `stars` and `comments` ever change after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Documentary {
    pub id: String,
    pub title: String,
    pub description: String,
    pub artist: Artist,
    pub kind: DocumentaryType,
    pub duration: Option<String>,
    pub tags: BTreeSet<String>,
    pub views: u64,
    pub stars: u64,
    pub comments: Vec<Comment>,
    pub created_at: DateTime<Utc>,
    pub featured: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub user_id: String,
    pub username: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Who is writing a comment.
#[derive(Debug, Clone)]
pub struct CommentAuthor {
    pub user_id: String,
    pub username: String,
}

impl From<&Session> for CommentAuthor {
    fn from(session: &Session) -> Self {
        Self {
            user_id: session.user_id.clone(),
            username: session.profile.username.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Upcoming,
    Attended,
    Missed,
    Canceled,
}

/// An event. `registered_users` is only ever touched by the registration ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub title: String,
    pub description: String,
    pub location: String,
    pub date: NaiveDate,
    pub time: String,
    pub organizer: String,
    pub category: String,
    pub price: u32,
    pub capacity: u32,
    pub registered_users: BTreeSet<String>,
    pub status: EventStatus,
    pub tags: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Magazine {
    pub id: String,
    pub title: String,
    pub issue: String,
    pub publish_date: NaiveDate,
    pub articles: Vec<MagazineArticle>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MagazineArticle {
    pub id: String,
    pub title: String,
    pub excerpt: String,
    pub author: String,
    pub read_time: String,
}

//=========================================================================================
// Registrations
//=========================================================================================

/// One registration of the current session for an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationRecord {
    pub event_id: String,
    pub title: String,
    pub registered_at: DateTime<Utc>,
}
