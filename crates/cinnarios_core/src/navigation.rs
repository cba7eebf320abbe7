//! crates/cinnarios_core/src/navigation.rs
//!
//! Client-side navigation with a route guard in front of the screens that
//! need a signed-in user.

use std::fmt;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    Onboarding,
    Login,
    Home,
    Documentaries,
    Events,
    Calendar,
    Dashboard,
    Profile,
    Magazine,
    DocumentaryDetail(String),
    EventDetail(String),
}

impl Screen {
    /// Screens that redirect to the login screen when nobody is signed in.
    pub fn is_protected(&self) -> bool {
        matches!(
            self,
            Screen::Events | Screen::Calendar | Screen::Dashboard | Screen::Profile
        )
    }

    /// Looks a screen up by its lowercase name. Detail screens need `param`.
    pub fn parse(name: &str, param: Option<&str>) -> Option<Self> {
        let screen = match (name.to_lowercase().as_str(), param) {
            ("onboarding", _) => Screen::Onboarding,
            ("login", _) => Screen::Login,
            ("home", _) => Screen::Home,
            ("documentaries", None) => Screen::Documentaries,
            ("documentaries" | "documentary", Some(id)) => Screen::DocumentaryDetail(id.to_string()),
            ("events", None) => Screen::Events,
            ("events" | "event", Some(id)) => Screen::EventDetail(id.to_string()),
            ("calendar", _) => Screen::Calendar,
            ("dashboard", _) => Screen::Dashboard,
            ("profile", _) => Screen::Profile,
            ("magazine", _) => Screen::Magazine,
            _ => return None,
        };
        Some(screen)
    }
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Screen::Onboarding => write!(f, "Onboarding"),
            Screen::Login => write!(f, "Login"),
            Screen::Home => write!(f, "Home"),
            Screen::Documentaries => write!(f, "Documentaries"),
            Screen::Events => write!(f, "Events"),
            Screen::Calendar => write!(f, "Calendar"),
            Screen::Dashboard => write!(f, "Dashboard"),
            Screen::Profile => write!(f, "Profile"),
            Screen::Magazine => write!(f, "Magazine"),
            Screen::DocumentaryDetail(id) => write!(f, "Documentary {id}"),
            Screen::EventDetail(id) => write!(f, "Event {id}"),
        }
    }
}

/// Tracks the visible screen. A read of [`Navigator::current`] always reflects
/// the last navigation request.
pub struct Navigator {
    current: Screen,
    history: Vec<Screen>,
    /// Where to go once the user has logged in after a guard redirect.
    return_to: Option<Screen>,
}

impl Navigator {
    pub fn new(initial: Screen) -> Self {
        Self {
            current: initial,
            history: Vec::new(),
            return_to: None,
        }
    }

    pub fn current(&self) -> &Screen {
        &self.current
    }

    pub fn pending_return(&self) -> Option<&Screen> {
        self.return_to.as_ref()
    }

    pub fn navigate(&mut self, target: Screen, authenticated: bool) -> &Screen {
        let destination = self.guard(target, authenticated);
        if destination != self.current {
            let previous = std::mem::replace(&mut self.current, destination);
            self.history.push(previous);
            debug!(screen = %self.current, "Navigated");
        }
        &self.current
    }

    /// Continues to the screen the guard interrupted, or Home.
    pub fn resume_after_login(&mut self) -> &Screen {
        let target = self.return_to.take().unwrap_or(Screen::Home);
        self.navigate(target, true)
    }

    /// Goes back one screen. Returns `None` when there is no history.
    pub fn back(&mut self, authenticated: bool) -> Option<&Screen> {
        let previous = self.history.pop()?;
        self.current = self.guard(previous, authenticated);
        Some(&self.current)
    }

    /// Drops all history and shows `screen`, e.g. after logging out.
    pub fn reset(&mut self, screen: Screen) {
        self.history.clear();
        self.return_to = None;
        self.current = screen;
    }

    fn guard(&mut self, target: Screen, authenticated: bool) -> Screen {
        if target.is_protected() && !authenticated {
            info!(screen = %target, "Redirecting to login");
            self.return_to = Some(target);
            Screen::Login
        } else {
            target
        }
    }
}
