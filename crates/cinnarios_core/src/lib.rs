pub mod calendar;
pub mod catalog;
pub mod dashboard;
pub mod domain;
pub mod error;
pub mod ledger;
pub mod navigation;
pub mod notify;
pub mod ports;
pub mod session;
pub mod validation;

#[cfg(test)]
mod test_support;

pub use calendar::{CalendarProjector, Conflict, DayCell, MonthCursor, MonthGrid};
pub use catalog::{Catalog, StarToggle};
pub use dashboard::{DashboardFeature, DashboardPreferences, DashboardSummary};
pub use domain::{
    AuthStateChange, Comment, CommentAuthor, Documentary, DocumentaryType, Event, IdentityUser,
    Magazine, OAuthProvider, ProfileUpdate, RegistrationRecord, Session, StatsUpdate, UserMetadata,
    UserStats,
};
pub use error::{CoreError, CoreResult};
pub use ledger::RegistrationLedger;
pub use navigation::{Navigator, Screen};
pub use notify::{Notification, NotificationId, Notifier, Severity};
pub use ports::{
    AuthStateStream, Clock, IdentityService, KeyValueStore, NotificationSink, PortError,
    PortResult,
};
pub use session::{LoginRequest, RegistrationRequest, SessionStore};
